// This file is part of sdrgw, an application to compose and model the gateware of an FPGA SDR carrier board.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// sdrgw is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// sdrgw is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitStr, parse_macro_input};

/// Give a backend type a `register_backend()` associated function.
///
/// ```ignore
/// #[backend(name = "pcie")]
/// pub struct PcieBackend { .. }
/// ```
///
/// The type must provide `fn from_config(&SocConfig) -> Result<Self, SdrgwError>` and
/// implement `Backend`.
#[proc_macro_attribute]
pub fn backend(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut name: Option<LitStr> = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported backend property, expected `name`"))
        }
    });
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemStruct);
    let Some(name) = name else {
        return syn::Error::new_spanned(&item.ident, "#[backend] requires name = \"...\"")
            .to_compile_error()
            .into();
    };
    let ident = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();

    quote! {
        #item

        impl #impl_generics #ident #ty_generics #where_clause {
            pub const BACKEND_NAME: &'static str = #name;

            fn construct_backend(
                config: &crate::config::SocConfig,
            ) -> ::std::result::Result<
                ::std::boxed::Box<dyn crate::gateware::backends::Backend>,
                crate::error::SdrgwError,
            > {
                let backend = Self::from_config(config)?;
                Ok(::std::boxed::Box::new(backend))
            }

            pub fn register_backend() {
                crate::gateware::backends::register_backend(#name, Self::construct_backend);
            }
        }
    }
    .into()
}
