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

use zbus::{Result, proxy};

#[proxy(
    default_service = "io.sdrgw",
    interface = "io.sdrgw.status",
    default_path = "/io/sdrgw/status"
)]
pub trait Status {
    async fn get_ident(&self) -> Result<String>;
    async fn get_backend(&self) -> Result<String>;
    async fn get_domains(&self) -> Result<String>;
    async fn get_constraints(&self) -> Result<String>;
    async fn get_period_constraints(&self) -> Result<String>;
    async fn get_register_map(&self) -> Result<String>;
    async fn read_register(&self, address: u32) -> Result<u64>;
    async fn read_register_by_name(&self, name: &str) -> Result<u64>;
    async fn get_measurements(&self) -> Result<String>;
    async fn get_sys_clk_freq(&self) -> Result<u64>;
    async fn get_cycles(&self, domain: &str) -> Result<u64>;
    async fn get_time_fs(&self) -> Result<String>;
}
