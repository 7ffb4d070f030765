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

pub const USER_LEDS: u8 = 2;
/// One full chaser sequence per second.
pub const CHASER_PERIOD_S: f64 = 1.0;

const CHASER_MODE: u64 = 0;
const CSR_MODE: u64 = 1;

pub fn leds(csr: &mut CsrMap, count: u8) -> Result<(), SdrgwError> {
    csr.add_bank("leds")?;
    csr.add_register("leds", "out", count, CsrAccess::ReadWrite, 0)?;
    csr.add_register("leds", "mode", 1, CsrAccess::ReadWrite, CHASER_MODE)?;
    Ok(())
}

/// Johnson counter chaser, overridden by software once `out` is written.
pub struct LedChaserModel {
    sys: DomainId,
    mask: u64,
    count: u8,
    cycles_per_step: u64,
    timer: u64,
    chaser: u64,
    mode: u64,
    out: u64,
}

impl LedChaserModel {
    pub fn new(sys: DomainId, sys_clk_freq: u64, count: u8) -> Self {
        let cycles_per_step = (CHASER_PERIOD_S * sys_clk_freq as f64 / (2.0 * count as f64)) as u64;
        LedChaserModel::with_step(sys, count, cycles_per_step)
    }

    pub fn with_step(sys: DomainId, count: u8, cycles_per_step: u64) -> Self {
        LedChaserModel {
            sys,
            mask: (1u64 << count) - 1,
            count,
            cycles_per_step: cycles_per_step.max(1),
            timer: 0,
            chaser: 0,
            mode: CHASER_MODE,
            out: 0,
        }
    }

    pub fn pads(&self) -> u64 {
        if self.mode == CSR_MODE {
            self.out
        } else {
            self.chaser
        }
    }
}

impl Block for LedChaserModel {
    fn name(&self) -> &str {
        "leds"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            self.timer = 0;
            self.chaser = 0;
            self.mode = CHASER_MODE;
            self.out = 0;
            return;
        }
        self.timer += 1;
        if self.timer >= self.cycles_per_step {
            self.timer = 0;
            let msb = (self.chaser >> (self.count - 1)) & 1;
            self.chaser = ((self.chaser << 1) | (msb ^ 1)) & self.mask;
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "out" => self.pads(),
            "mode" => self.mode,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "out" => {
                self.out = value & self.mask;
                self.mode = CSR_MODE;
            }
            "mode" => self.mode = value & 1,
            _ => {}
        }
    }
}
