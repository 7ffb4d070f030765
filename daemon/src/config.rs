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

//! Configuration of the composed SoC and of the model that runs it.
//!
//! The board layer is not part of this crate: everything it would normally supply
//! (system clock frequency, which backend to build, the frequencies of the clocks to be
//! measured, the values the on-chip sensors return) arrives through TOML files. Two files
//! are layered, the user file overriding the vendor file, and hardcoded defaults fill
//! whatever neither provides. See [`config_files`] for the file format and
//! [`system_config`] for the process-wide accessors.

pub mod config_files;
pub mod system_config;

/// Vendor supplied configuration, typically shipped by the board package.
pub static VENDOR_CONFIG_PATH: &str = "/usr/lib/sdrgw/config.toml";

/// Local configuration written by the administrator. Overrides [`VENDOR_CONFIG_PATH`].
pub static USER_CONFIG_PATH: &str = "/etc/sdrgw/config.toml";

pub static DEFAULT_SYS_CLK_FREQ: u64 = 125_000_000;
pub static DEFAULT_PCIE_LANES: u8 = 1;
pub static DEFAULT_DMA_BUFFERING_DEPTH: u32 = 8192;
pub static DEFAULT_COUNTER_STEP: u64 = 1;
pub static DEFAULT_ETHERBONE_IP: &str = "192.168.1.50";
pub static DEFAULT_PLL_SPEEDGRADE: i8 = -3;
pub static DEFAULT_SI5351_CLK_FREQ: u64 = 38_400_000;
pub static DEFAULT_I2C_FREQ: u64 = 100_000;

/// An external clock the board routes to the FPGA for frequency measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredClock {
    pub name: String,
    pub frequency_hz: u64,
    /// A clock configured as not running never toggles; its measurement reads flat.
    pub running: bool,
    /// The clock only starts toggling once the SI5351 programmer reports done.
    pub gated_by_si5351: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub free_run: bool,
    pub cycles_per_tick: u64,
    pub tick_interval_ms: u64,
    /// System clock cycles the PLLs need before asserting lock.
    pub pll_lock_cycles: u64,
    /// Bit rate of the SI5351 I2C programmer.
    pub i2c_freq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub temperature_c: f64,
    pub vccint: f64,
    pub vccaux: f64,
    pub vccbram: f64,
    pub dna_id: u64,
}

/// The merged view of all configuration sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SocConfig {
    pub sys_clk_freq: u64,
    pub with_pcie: bool,
    pub pcie_lanes: u8,
    pub with_ethernet: bool,
    pub ethernet_sfp: u8,
    pub etherbone_ip: String,
    pub with_jtagbone: bool,
    pub counter_step: u64,
    pub dma_buffering_depth: u32,
    pub pll_speedgrade: i8,
    pub measured_clocks: Vec<MeasuredClock>,
    pub simulation: SimulationConfig,
    pub sensors: SensorConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            free_run: true,
            cycles_per_tick: 12_500,
            tick_interval_ms: 10,
            pll_lock_cycles: 100,
            i2c_freq: DEFAULT_I2C_FREQ,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            temperature_c: 45.0,
            vccint: 1.0,
            vccaux: 1.8,
            vccbram: 1.0,
            dna_id: 0x0012_3456_789a_bcde,
        }
    }
}

pub fn default_measured_clocks() -> Vec<MeasuredClock> {
    (0..4)
        .map(|i| MeasuredClock {
            name: format!("si5351_clk{i}"),
            frequency_hz: DEFAULT_SI5351_CLK_FREQ,
            running: true,
            gated_by_si5351: true,
        })
        .collect()
}

impl Default for SocConfig {
    fn default() -> Self {
        SocConfig {
            sys_clk_freq: DEFAULT_SYS_CLK_FREQ,
            with_pcie: true,
            pcie_lanes: DEFAULT_PCIE_LANES,
            with_ethernet: false,
            ethernet_sfp: 0,
            etherbone_ip: DEFAULT_ETHERBONE_IP.to_string(),
            with_jtagbone: true,
            counter_step: DEFAULT_COUNTER_STEP,
            dma_buffering_depth: DEFAULT_DMA_BUFFERING_DEPTH,
            pll_speedgrade: DEFAULT_PLL_SPEEDGRADE,
            measured_clocks: default_measured_clocks(),
            simulation: SimulationConfig::default(),
            sensors: SensorConfig::default(),
        }
    }
}
