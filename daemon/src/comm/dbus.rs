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

pub mod control_interface;
pub mod status_interface;

use crate::config::system_config::soc_config;
use crate::error::SdrgwError;
use crate::gateware::constraints::ConstraintSet;
use crate::gateware::csr::CsrMap;
use crate::gateware::graph::FrozenGraph;
use crate::gateware::soc::Soc;
use crate::model::SocModel;
use log::{trace, warn};
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub type SharedModel = Arc<Mutex<SocModel>>;

/// Build-time facts about the composed SoC served alongside the model.
#[derive(Debug, Clone, PartialEq)]
pub struct SocSummary {
    pub ident: String,
    pub backend: String,
    pub backend_properties: Vec<(String, String)>,
    pub measurements: Vec<String>,
    pub sys_clk_freq: u64,
}

impl SocSummary {
    pub fn from_soc(soc: &Soc) -> Self {
        SocSummary {
            ident: soc.ident.clone(),
            backend: soc.backend_mode().to_string(),
            backend_properties: soc
                .backend
                .as_ref()
                .map(|b| b.properties())
                .unwrap_or_default(),
            measurements: soc.measurements.iter().map(|m| m.name.clone()).collect(),
            sys_clk_freq: soc.config.sys_clk_freq,
        }
    }
}

/// Advance the shared model by `cycles_per_tick` system cycles every tick.
///
/// The free running flag is reread from the system config on every tick so it can be
/// toggled over DBus. A failed tick is skipped, the next one tries again.
pub async fn free_run(model: SharedModel, cycles_per_tick: u64, tick_interval_ms: u64) {
    let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms.max(1)));
    loop {
        interval.tick().await;
        match soc_config() {
            Ok(config) if !config.simulation.free_run => continue,
            Ok(_) => {}
            Err(e) => {
                trace!("Skipping tick: {e}");
                continue;
            }
        }
        free_run_tick(&model, cycles_per_tick).await;
    }
}

/// One free running step. Returns whether the model advanced.
pub async fn free_run_tick(model: &SharedModel, cycles: u64) -> bool {
    let mut model = model.lock().await;
    match model.run_sys_cycles(cycles) {
        Ok(()) => true,
        Err(e) => {
            warn!("Free running tick skipped: {e}");
            false
        }
    }
}

/// `name,frequency_hz,clock,reset` per line.
pub(crate) fn format_domains(graph: &FrozenGraph) -> String {
    let mut text = String::new();
    for domain in graph.domains() {
        let _ = writeln!(
            text,
            "{},{},{},{}",
            domain.name, domain.nominal_frequency_hz, domain.clock_signal, domain.reset_signal
        );
    }
    text
}

pub(crate) fn format_constraints(constraints: &ConstraintSet) -> String {
    let mut text = String::new();
    for (a, b, relationship) in constraints.to_triples() {
        let _ = writeln!(text, "{a} {b} {relationship}");
    }
    text
}

pub(crate) fn format_period_constraints(constraints: &ConstraintSet) -> String {
    let mut text = String::new();
    for period in constraints.periods() {
        let _ = writeln!(text, "{} {:.3}", period.clock, period.period_ns);
    }
    text
}

pub(crate) fn format_register_map(csr: &CsrMap) -> String {
    csr.to_csv()
}

/// Export targets must be absolute and may not climb out of their root with `..`.
pub(crate) fn validate_export_directory(directory: &str) -> Result<PathBuf, SdrgwError> {
    if directory.is_empty() {
        return Err(SdrgwError::Argument(
            "An export directory is required. Provided directory is empty.".into(),
        ));
    }
    let path = Path::new(directory);
    if !path.is_absolute() {
        return Err(SdrgwError::Argument(format!(
            "Export directory {directory} must be an absolute path"
        )));
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(SdrgwError::Argument(format!(
            "Export directory {directory} may not contain '..'"
        )));
    }
    Ok(path.to_path_buf())
}

pub(crate) fn validate_domain_name(domain: &str) -> Result<(), SdrgwError> {
    if domain.is_empty()
        || !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SdrgwError::Argument(format!(
            "{domain:?} is not a valid clock domain name"
        )));
    }
    Ok(())
}



/// A composed default SoC with a single ungated measured clock and a short PLL lock.
#[cfg(test)]
pub(crate) fn quick_shared_model() -> (SocSummary, SharedModel) {
    use crate::config::{MeasuredClock, SocConfig};
    use crate::gateware::backends::register_backends;
    use crate::gateware::soc::compose;

    register_backends();
    let mut config = SocConfig {
        measured_clocks: vec![MeasuredClock {
            name: "si5351_clk0".into(),
            frequency_hz: 38_400_000,
            running: true,
            gated_by_si5351: false,
        }],
        ..SocConfig::default()
    };
    config.simulation.pll_lock_cycles = 10;
    let soc = compose(&config).unwrap();
    let model = Arc::new(Mutex::new(soc.instantiate().unwrap()));
    (SocSummary::from_soc(&soc), model)
}
