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

use crate::config::SensorConfig;
use crate::error::SdrgwError;
use crate::gateware::csr::{CsrAccess, CsrMap};
use crate::gateware::domain::{DomainId, DomainSet};
use crate::model::{Block, Wires};

pub fn xadc(csr: &mut CsrMap) -> Result<(), SdrgwError> {
    csr.add_bank("xadc")?;
    for register in ["temperature", "vccint", "vccaux", "vccbram"] {
        csr.add_register("xadc", register, 12, CsrAccess::ReadOnly, 0)?;
    }
    csr.add_register("xadc", "eoc", 1, CsrAccess::ReadOnly, 0)?;
    Ok(())
}

/// 12-bit transfer function of the on-die temperature sensor.
pub fn temperature_code(celsius: f64) -> u64 {
    (((celsius + 273.15) * 4096.0 / 503.975).round() as u64).min(0xfff)
}

/// 12-bit transfer function of the supply sensors, 3 V full scale.
pub fn supply_code(volts: f64) -> u64 {
    ((volts * 4096.0 / 3.0).round().max(0.0) as u64).min(0xfff)
}

pub fn code_to_celsius(code: u64) -> f64 {
    code as f64 * 503.975 / 4096.0 - 273.15
}

pub fn code_to_volts(code: u64) -> f64 {
    code as f64 * 3.0 / 4096.0
}

pub struct XadcModel {
    sys: DomainId,
    sensors: SensorConfig,
    eoc: bool,
}

impl XadcModel {
    pub fn new(sys: DomainId, sensors: SensorConfig) -> Self {
        XadcModel {
            sys,
            sensors,
            eoc: false,
        }
    }
}

impl Block for XadcModel {
    fn name(&self) -> &str {
        "xadc"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if edges.contains(self.sys) {
            self.eoc = !wires.resets.contains(self.sys);
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "temperature" => temperature_code(self.sensors.temperature_c),
            "vccint" => supply_code(self.sensors.vccint),
            "vccaux" => supply_code(self.sensors.vccaux),
            "vccbram" => supply_code(self.sensors.vccbram),
            "eoc" => self.eoc as u64,
            _ => 0,
        }
    }
}
