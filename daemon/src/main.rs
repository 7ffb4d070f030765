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

//! SDR gateware daemon (sdrgwd) - serves a running model of the carrier board SoC.
//!
//! At startup the daemon:
//! 1. Registers the communication backends compiled in
//! 2. Loads the layered configuration and composes the SoC from it
//! 3. Instantiates the cycle-level model and shares it behind a mutex
//! 4. Connects to the system DBus and advertises the service
//! 5. Advances the model periodically while free running is enabled
//!
//! # DBus Service
//!
//! - **Service Name**: `io.sdrgw`
//! - **Status Interface**: `/io/sdrgw/status` - Read-only operations
//! - **Control Interface**: `/io/sdrgw/control` - Register writes and model control
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). Defaults to `info`

use log::info;
use sdrgw::comm::dbus::{
    SharedModel, SocSummary, control_interface::ControlInterface, free_run,
    status_interface::StatusInterface,
};
use sdrgw::config::system_config::soc_config;
use sdrgw::gateware::backends::register_backends;
use sdrgw::gateware::soc::compose;
use std::error::Error;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::Mutex;
use zbus::connection;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    register_backends();

    let config = soc_config()?;
    let soc = compose(&config)?;
    let model: SharedModel = Arc::new(Mutex::new(soc.instantiate()?));
    let summary = SocSummary::from_soc(&soc);

    let status_interface = StatusInterface {
        model: model.clone(),
        summary,
    };
    let control_interface = ControlInterface {
        model: model.clone(),
    };

    let _conn = connection::Builder::system()?
        .name("io.sdrgw")?
        .serve_at("/io/sdrgw/status", status_interface)?
        .serve_at("/io/sdrgw/control", control_interface)?
        .build()
        .await?;

    info!("Started io.sdrgw dbus service");
    tokio::spawn(free_run(
        model,
        config.simulation.cycles_per_tick,
        config.simulation.tick_interval_ms,
    ));
    pending::<()>().await;

    Ok(())
}
