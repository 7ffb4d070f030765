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

use crate::proxies::control_proxy::ControlProxy;
use crate::proxies::status_proxy::StatusProxy;
use zbus::Connection;

/// Parse a decimal or `0x` prefixed hexadecimal number.
pub fn parse_number(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("{text:?} is not a number: {e}"))
}

/// A register given by address or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrTarget {
    Address(u32),
    Name(String),
}

impl CsrTarget {
    pub fn parse(text: &str) -> Self {
        match parse_number(text).ok().and_then(|n| u32::try_from(n).ok()) {
            Some(address) => CsrTarget::Address(address),
            None => CsrTarget::Name(text.to_string()),
        }
    }
}

pub async fn csr_list_handler() -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = StatusProxy::new(&connection).await?;
    let map = proxy.get_register_map().await?;
    let mut ret_string = String::from("| register | address | words | mode |\n");
    for line in map.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        match fields.as_slice() {
            ["csr_base", bank, base, ..] => {
                ret_string += format!("---- {bank} @ {base} ----\n").as_str()
            }
            ["csr_register", name, address, words, mode] => {
                ret_string += format!("| {name} | {address} | {words} | {mode} |\n").as_str()
            }
            _ => {}
        }
    }
    Ok(ret_string)
}

pub async fn csr_read_handler(target: &CsrTarget) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = StatusProxy::new(&connection).await?;
    let value = match target {
        CsrTarget::Address(address) => proxy.read_register(*address).await?,
        CsrTarget::Name(name) => proxy.read_register_by_name(name).await?,
    };
    Ok(format!("0x{value:x} ({value})"))
}

pub async fn csr_write_handler(target: &CsrTarget, value: &str) -> Result<String, zbus::Error> {
    let value = parse_number(value).map_err(zbus::Error::Failure)?;
    let connection = Connection::system().await?;
    let proxy = ControlProxy::new(&connection).await?;
    match target {
        CsrTarget::Address(address) => proxy.write_register(*address, value).await,
        CsrTarget::Name(name) => proxy.write_register_by_name(name, value).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::decimal("305419896", 0x1234_5678)]
    #[case::hex("0x12345678", 0x1234_5678)]
    #[case::hex_upper("0X00FF", 0xff)]
    #[case::underscores("0x1234_5678", 0x1234_5678)]
    fn numbers_parse(#[case] text: &str, #[case] expected: u64) {
        assert_that!(parse_number(text), ok(eq(&expected)));
    }

    #[gtest]
    fn garbage_is_not_a_number() {
        assert_that!(
            parse_number("0xzz"),
            err(displays_as(contains_substring("is not a number")))
        );
    }

    #[gtest]
    fn targets_are_addresses_or_names() {
        assert_eq!(CsrTarget::parse("0x800"), CsrTarget::Address(0x800));
        assert_eq!(
            CsrTarget::parse("ctrl_scratch"),
            CsrTarget::Name("ctrl_scratch".to_string())
        );
    }
}
