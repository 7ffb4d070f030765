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

use crate::comm::dbus::{
    SharedModel, SocSummary, format_constraints, format_domains, format_period_constraints,
    format_register_map, validate_domain_name,
};
use crate::gateware::constraints::ConstraintSet;
use log::info;
use std::fmt::Write;
use zbus::{fdo, interface};

pub struct StatusInterface {
    pub model: SharedModel,
    pub summary: SocSummary,
}

#[interface(name = "io.sdrgw.status")]
impl StatusInterface {
    async fn get_ident(&self) -> Result<String, fdo::Error> {
        info!("get_ident called");
        Ok(self.summary.ident.clone())
    }

    async fn get_backend(&self) -> Result<String, fdo::Error> {
        info!("get_backend called");
        let mut text = format!("{}\n", self.summary.backend);
        for (key, value) in &self.summary.backend_properties {
            let _ = writeln!(text, "{key}={value}");
        }
        Ok(text)
    }

    async fn get_domains(&self) -> Result<String, fdo::Error> {
        info!("get_domains called");
        let model = self.model.lock().await;
        Ok(format_domains(model.graph()))
    }

    async fn get_constraints(&self) -> Result<String, fdo::Error> {
        info!("get_constraints called");
        let model = self.model.lock().await;
        Ok(format_constraints(&ConstraintSet::emit(model.graph())))
    }

    async fn get_period_constraints(&self) -> Result<String, fdo::Error> {
        info!("get_period_constraints called");
        let model = self.model.lock().await;
        Ok(format_period_constraints(&ConstraintSet::emit(
            model.graph(),
        )))
    }

    async fn get_register_map(&self) -> Result<String, fdo::Error> {
        info!("get_register_map called");
        let model = self.model.lock().await;
        Ok(format_register_map(model.csr()))
    }

    async fn read_register(&self, address: u32) -> Result<u64, fdo::Error> {
        info!("read_register called with address: 0x{address:08x}");
        let model = self.model.lock().await;
        Ok(model.read(address)?)
    }

    async fn read_register_by_name(&self, name: &str) -> Result<u64, fdo::Error> {
        info!("read_register_by_name called with name: {name}");
        let model = self.model.lock().await;
        Ok(model.read_by_name(name)?)
    }

    async fn get_measurements(&self) -> Result<String, fdo::Error> {
        info!("get_measurements called");
        Ok(self.summary.measurements.join("\n"))
    }

    async fn get_sys_clk_freq(&self) -> Result<u64, fdo::Error> {
        info!("get_sys_clk_freq called");
        Ok(self.summary.sys_clk_freq)
    }

    async fn get_cycles(&self, domain: &str) -> Result<u64, fdo::Error> {
        info!("get_cycles called with domain: {domain}");
        validate_domain_name(domain)?;
        let model = self.model.lock().await;
        Ok(model.cycles_by_name(domain)?)
    }

    async fn get_time_fs(&self) -> Result<String, fdo::Error> {
        info!("get_time_fs called");
        let model = self.model.lock().await;
        Ok(model.now_fs().to_string())
    }
}
