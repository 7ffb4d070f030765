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
use log::info;

pub const SCRATCH_RESET: u64 = 0x1234_5678;

pub fn ctrl(csr: &mut CsrMap) -> Result<(), SdrgwError> {
    csr.add_bank("ctrl")?;
    csr.add_register("ctrl", "reset", 1, CsrAccess::Strobe, 0)?;
    csr.add_register("ctrl", "scratch", 32, CsrAccess::ReadWrite, SCRATCH_RESET)?;
    Ok(())
}

/// Soft reset and scratch register.
pub struct CtrlModel {
    sys: DomainId,
    scratch: u64,
    reset_requested: bool,
}

impl CtrlModel {
    pub fn new(sys: DomainId) -> Self {
        CtrlModel {
            sys,
            scratch: SCRATCH_RESET,
            reset_requested: false,
        }
    }
}

impl Block for CtrlModel {
    fn name(&self) -> &str {
        "ctrl"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if edges.contains(self.sys) && wires.resets.contains(self.sys) {
            self.scratch = SCRATCH_RESET;
        }
    }

    fn take_system_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "scratch" => self.scratch,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "reset" if value & 1 == 1 => {
                info!("Soft reset requested through ctrl_reset");
                self.reset_requested = true;
            }
            "scratch" => self.scratch = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn reset_strobe_requests_system_reset_once() {
        let mut ctrl = CtrlModel::new(DomainId(0));
        ctrl.csr_write("reset", 1);
        expect_that!(ctrl.take_system_reset(), eq(true));
        expect_that!(ctrl.take_system_reset(), eq(false));
    }

    #[gtest]
    fn scratch_returns_to_default_in_reset() {
        let mut ctrl = CtrlModel::new(DomainId(0));
        ctrl.csr_write("scratch", 0xcafe);
        expect_that!(ctrl.csr_read("scratch"), eq(0xcafe));
        let wires = Wires {
            resets: DomainSet::single(DomainId(0)),
        };
        ctrl.tick(DomainSet::single(DomainId(0)), &wires);
        expect_that!(ctrl.csr_read("scratch"), eq(SCRATCH_RESET));
    }
}
