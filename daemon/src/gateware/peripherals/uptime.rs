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

use crate::error::SdrgwError;
use crate::gateware::csr::{CsrAccess, CsrMap};
use crate::gateware::domain::{DomainId, DomainSet};
use crate::model::{Block, Wires};

pub fn uptime(csr: &mut CsrMap) -> Result<(), SdrgwError> {
    csr.add_bank("uptime")?;
    csr.add_register("uptime", "latch", 1, CsrAccess::Strobe, 0)?;
    csr.add_register("uptime", "cycles", 64, CsrAccess::ReadOnly, 0)?;
    Ok(())
}

/// System clock cycles since the last reset, captured on `latch`.
pub struct UptimeModel {
    sys: DomainId,
    counter: u64,
    latched: u64,
    strobe: bool,
}

impl UptimeModel {
    pub fn new(sys: DomainId) -> Self {
        UptimeModel {
            sys,
            counter: 0,
            latched: 0,
            strobe: false,
        }
    }
}

impl Block for UptimeModel {
    fn name(&self) -> &str {
        "uptime"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            self.counter = 0;
            self.latched = 0;
            self.strobe = false;
            return;
        }
        if std::mem::take(&mut self.strobe) {
            self.latched = self.counter;
        }
        self.counter += 1;
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "cycles" => self.latched,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, _value: u64) {
        if register == "latch" {
            self.strobe = true;
        }
    }
}
