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

//! TOML configuration file format.
//!
//! ```toml
//! [soc]
//! sys_clk_freq = 125000000
//! with_pcie = true
//! pcie_lanes = 4
//!
//! [[measured_clock]]
//! name = "si5351_clk0"
//! frequency_hz = 38400000
//!
//! [simulation]
//! free_run = false
//! ```
//!
//! Every field is optional. A section present in the user file overrides the vendor file
//! field by field, except `[[measured_clock]]` which is replaced as a whole list.

use crate::config::{
    DEFAULT_COUNTER_STEP, DEFAULT_DMA_BUFFERING_DEPTH, DEFAULT_ETHERBONE_IP, DEFAULT_PCIE_LANES,
    DEFAULT_PLL_SPEEDGRADE, DEFAULT_SI5351_CLK_FREQ, DEFAULT_SYS_CLK_FREQ, MeasuredClock,
    SensorConfig, SimulationConfig, SocConfig, default_measured_clocks,
};
use crate::error::SdrgwError;
use crate::system_io::fs_read;
use log::trace;
use serde::Deserialize;
use std::path::Path;

/// This is the top level struct which holds all sections
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    soc: Option<SocToml>,
    measured_clock: Option<Vec<MeasuredClockToml>>,
    simulation: Option<SimulationToml>,
    sensors: Option<SensorsToml>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SocToml {
    sys_clk_freq: Option<u64>,
    with_pcie: Option<bool>,
    pcie_lanes: Option<u8>,
    with_ethernet: Option<bool>,
    ethernet_sfp: Option<u8>,
    etherbone_ip: Option<String>,
    with_jtagbone: Option<bool>,
    counter_step: Option<u64>,
    dma_buffering_depth: Option<u32>,
    pll_speedgrade: Option<i8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeasuredClockToml {
    name: String,
    frequency_hz: Option<u64>,
    running: Option<bool>,
    gated_by_si5351: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SimulationToml {
    free_run: Option<bool>,
    cycles_per_tick: Option<u64>,
    tick_interval_ms: Option<u64>,
    pll_lock_cycles: Option<u64>,
    i2c_freq: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SensorsToml {
    temperature_c: Option<f64>,
    vccint: Option<f64>,
    vccaux: Option<f64>,
    vccbram: Option<f64>,
    dna_id: Option<u64>,
}

fn merge_section<T>(primary: Option<T>, fallback: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (primary, fallback) {
        (Some(p), Some(f)) => Some(merge(p, f)),
        (p, f) => p.or(f),
    }
}

impl TomlConfig {
    /// Fields set in `self` win over fields set in `fallback`.
    pub(crate) fn merge(self, fallback: TomlConfig) -> TomlConfig {
        TomlConfig {
            soc: merge_section(self.soc, fallback.soc, SocToml::merge),
            measured_clock: self.measured_clock.or(fallback.measured_clock),
            simulation: merge_section(self.simulation, fallback.simulation, SimulationToml::merge),
            sensors: merge_section(self.sensors, fallback.sensors, SensorsToml::merge),
        }
    }
}

impl SocToml {
    fn merge(self, fallback: SocToml) -> SocToml {
        SocToml {
            sys_clk_freq: self.sys_clk_freq.or(fallback.sys_clk_freq),
            with_pcie: self.with_pcie.or(fallback.with_pcie),
            pcie_lanes: self.pcie_lanes.or(fallback.pcie_lanes),
            with_ethernet: self.with_ethernet.or(fallback.with_ethernet),
            ethernet_sfp: self.ethernet_sfp.or(fallback.ethernet_sfp),
            etherbone_ip: self.etherbone_ip.or(fallback.etherbone_ip),
            with_jtagbone: self.with_jtagbone.or(fallback.with_jtagbone),
            counter_step: self.counter_step.or(fallback.counter_step),
            dma_buffering_depth: self.dma_buffering_depth.or(fallback.dma_buffering_depth),
            pll_speedgrade: self.pll_speedgrade.or(fallback.pll_speedgrade),
        }
    }
}

impl SimulationToml {
    fn merge(self, fallback: SimulationToml) -> SimulationToml {
        SimulationToml {
            free_run: self.free_run.or(fallback.free_run),
            cycles_per_tick: self.cycles_per_tick.or(fallback.cycles_per_tick),
            tick_interval_ms: self.tick_interval_ms.or(fallback.tick_interval_ms),
            pll_lock_cycles: self.pll_lock_cycles.or(fallback.pll_lock_cycles),
            i2c_freq: self.i2c_freq.or(fallback.i2c_freq),
        }
    }
}

impl SensorsToml {
    fn merge(self, fallback: SensorsToml) -> SensorsToml {
        SensorsToml {
            temperature_c: self.temperature_c.or(fallback.temperature_c),
            vccint: self.vccint.or(fallback.vccint),
            vccaux: self.vccaux.or(fallback.vccaux),
            vccbram: self.vccbram.or(fallback.vccbram),
            dna_id: self.dna_id.or(fallback.dna_id),
        }
    }
}

impl From<MeasuredClockToml> for MeasuredClock {
    fn from(value: MeasuredClockToml) -> Self {
        MeasuredClock {
            name: value.name,
            frequency_hz: value.frequency_hz.unwrap_or(DEFAULT_SI5351_CLK_FREQ),
            running: value.running.unwrap_or(true),
            gated_by_si5351: value.gated_by_si5351.unwrap_or(false),
        }
    }
}

impl From<TomlConfig> for SocConfig {
    fn from(value: TomlConfig) -> Self {
        trace!("Creating SocConfig from {value:?}");
        let soc = value.soc.unwrap_or_default();
        let simulation = value.simulation.unwrap_or_default();
        let sensors = value.sensors.unwrap_or_default();
        let default_simulation = SimulationConfig::default();
        let default_sensors = SensorConfig::default();
        SocConfig {
            sys_clk_freq: soc.sys_clk_freq.unwrap_or_else(|| {
                trace!("No sys_clk_freq provided. Using hardcoded value.");
                DEFAULT_SYS_CLK_FREQ
            }),
            with_pcie: soc.with_pcie.unwrap_or(true),
            pcie_lanes: soc.pcie_lanes.unwrap_or(DEFAULT_PCIE_LANES),
            with_ethernet: soc.with_ethernet.unwrap_or(false),
            ethernet_sfp: soc.ethernet_sfp.unwrap_or(0),
            etherbone_ip: soc
                .etherbone_ip
                .unwrap_or_else(|| DEFAULT_ETHERBONE_IP.to_string()),
            with_jtagbone: soc.with_jtagbone.unwrap_or(true),
            counter_step: soc.counter_step.unwrap_or(DEFAULT_COUNTER_STEP),
            dma_buffering_depth: soc
                .dma_buffering_depth
                .unwrap_or(DEFAULT_DMA_BUFFERING_DEPTH),
            pll_speedgrade: soc.pll_speedgrade.unwrap_or(DEFAULT_PLL_SPEEDGRADE),
            measured_clocks: value
                .measured_clock
                .map(|clocks| clocks.into_iter().map(MeasuredClock::from).collect())
                .unwrap_or_else(|| {
                    trace!("No measured_clock list provided. Using the SI5351 outputs.");
                    default_measured_clocks()
                }),
            simulation: SimulationConfig {
                free_run: simulation.free_run.unwrap_or(default_simulation.free_run),
                cycles_per_tick: simulation
                    .cycles_per_tick
                    .unwrap_or(default_simulation.cycles_per_tick),
                tick_interval_ms: simulation
                    .tick_interval_ms
                    .unwrap_or(default_simulation.tick_interval_ms),
                pll_lock_cycles: simulation
                    .pll_lock_cycles
                    .unwrap_or(default_simulation.pll_lock_cycles),
                i2c_freq: simulation.i2c_freq.unwrap_or(default_simulation.i2c_freq),
            },
            sensors: SensorConfig {
                temperature_c: sensors.temperature_c.unwrap_or(default_sensors.temperature_c),
                vccint: sensors.vccint.unwrap_or(default_sensors.vccint),
                vccaux: sensors.vccaux.unwrap_or(default_sensors.vccaux),
                vccbram: sensors.vccbram.unwrap_or(default_sensors.vccbram),
                dna_id: sensors.dna_id.unwrap_or(default_sensors.dna_id),
            },
        }
    }
}

pub(crate) fn toml_str_to_config(toml_string: &str) -> Result<TomlConfig, SdrgwError> {
    match toml::from_str(toml_string) {
        Ok(config) => Ok(config),
        Err(e) => Err(SdrgwError::TomlDe {
            toml_string: toml_string.into(),
            e,
        }),
    }
}

pub(crate) fn toml_config_from_file(file_path: &Path) -> Result<TomlConfig, SdrgwError> {
    if !file_path.is_file() {
        return Err(SdrgwError::Config(format!(
            "Config file not found in {file_path:?}"
        )));
    }
    toml_str_to_config(&fs_read(file_path)?)
}

/// Parse a single TOML document into a complete [`SocConfig`], using hardcoded defaults for
/// anything it leaves out.
pub fn soc_config_from_str(toml_string: &str) -> Result<SocConfig, SdrgwError> {
    Ok(toml_str_to_config(toml_string)?.into())
}
