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

use crate::config::config_files::{TomlConfig, toml_config_from_file};
use crate::config::{SocConfig, USER_CONFIG_PATH, VENDOR_CONFIG_PATH};
use crate::error::SdrgwError;
use log::{trace, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

static CONFIG: OnceLock<Mutex<SocConfig>> = OnceLock::new();

/// User config overrides vendor config and vendor config overrides hardcoded defaults
fn init_system_config() -> Mutex<SocConfig> {
    let vendor_config = toml_config_from_file(&PathBuf::from(VENDOR_CONFIG_PATH))
        .unwrap_or_else(|e| {
            warn!("Using hardcoded values for vendor config because loading config failed: {e}");
            TomlConfig::default()
        });
    let user_config =
        toml_config_from_file(&PathBuf::from(USER_CONFIG_PATH)).unwrap_or_else(|e| {
            warn!("Using hardcoded values for user config because loading config failed: {e}");
            TomlConfig::default()
        });
    trace!("Merging user_config: {user_config:?} with vendor_config {vendor_config:?}");
    let merged: SocConfig = user_config.merge(vendor_config).into();
    trace!("Resulting config: {merged:?}");
    Mutex::new(merged)
}

pub fn system_config() -> &'static Mutex<SocConfig> {
    CONFIG.get_or_init(init_system_config)
}

pub fn system_config_guard() -> Result<MutexGuard<'static, SocConfig>, SdrgwError> {
    let guard = match system_config().try_lock() {
        Ok(guard) => guard,
        Err(e) => {
            return Err(SdrgwError::Internal(format!(
                "Failed when locking config for read access: {e}"
            )));
        }
    };
    Ok(guard)
}

/// A snapshot of the process-wide configuration.
pub fn soc_config() -> Result<SocConfig, SdrgwError> {
    let guard = system_config_guard()?;
    Ok(guard.clone())
}

pub fn set_free_run(free_run: bool) -> Result<(), SdrgwError> {
    let mut guard = system_config_guard()?;
    guard.simulation.free_run = free_run;
    Ok(())
}
