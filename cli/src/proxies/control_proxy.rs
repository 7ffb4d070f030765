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
    interface = "io.sdrgw.control",
    default_path = "/io/sdrgw/control"
)]
pub trait Control {
    async fn write_register(&self, address: u32, value: u64) -> Result<String>;
    async fn write_register_by_name(&self, name: &str, value: u64) -> Result<String>;
    async fn latch_measurement(&self, name: &str) -> Result<(u64, u64)>;
    async fn advance(&self, cycles: u64) -> Result<String>;
    async fn set_clock_running(&self, domain: &str, running: bool) -> Result<String>;
    async fn set_free_run(&self, enabled: bool) -> Result<String>;
    async fn soft_reset(&self) -> Result<String>;
    async fn export_artifacts(&self, directory: &str) -> Result<String>;
}
