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
use zbus::Connection;

async fn control_proxy() -> Result<ControlProxy<'static>, zbus::Error> {
    let connection = Connection::system().await?;
    ControlProxy::new(&connection).await
}

pub async fn advance_handler(cycles: u64) -> Result<String, zbus::Error> {
    control_proxy().await?.advance(cycles).await
}

pub async fn clock_handler(domain: &str, running: bool) -> Result<String, zbus::Error> {
    control_proxy().await?.set_clock_running(domain, running).await
}

pub async fn free_run_handler(enabled: bool) -> Result<String, zbus::Error> {
    control_proxy().await?.set_free_run(enabled).await
}

pub async fn reset_handler() -> Result<String, zbus::Error> {
    control_proxy().await?.soft_reset().await
}

pub async fn export_handler(directory: &str) -> Result<String, zbus::Error> {
    let absolute = std::path::absolute(directory)
        .map_err(|e| zbus::Error::Failure(format!("Cannot resolve {directory}: {e}")))?;
    control_proxy()
        .await?
        .export_artifacts(&absolute.to_string_lossy())
        .await
}
