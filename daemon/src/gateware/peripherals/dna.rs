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
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, ResetSource, Signal};
use crate::gateware::graph::{DomainGraph, SyncKind};
use crate::model::{Block, Wires};
use log::debug;

pub const DNA_WIDTH: u8 = 57;
pub const DNA_CLK_DIVIDER: u32 = 2;

/// Adds the `dna` domain, a divided copy of `sys` read back quasi-statically.
pub fn dna(
    graph: &mut DomainGraph,
    csr: &mut CsrMap,
    sys: DomainId,
) -> Result<DomainId, SdrgwError> {
    let sys_freq = graph.domain(sys)?.nominal_frequency_hz;
    let domain = graph.add_domain(
        "dna",
        sys_freq / DNA_CLK_DIVIDER as u64,
        DomainOrigin::Divided {
            parent: sys,
            divider: DNA_CLK_DIVIDER,
        },
    )?;
    graph.set_reset_source(domain, ResetSource::Derived { parent: sys })?;
    graph.add_synchronizer(
        "dna_status",
        SyncKind::Quasistatic,
        &Signal::new("dna_shift", DNA_WIDTH, domain),
        sys,
    )?;
    csr.add_bank("dna")?;
    csr.add_register("dna", "id", DNA_WIDTH, CsrAccess::ReadOnly, 0)?;
    Ok(domain)
}

/// Serial readout of the device identifier.
///
/// Evaluated on `sys` edges: the primitive clock is `sys / 2`, so one bit is shifted in
/// on every odd count and the readout completes after `2 * 57` cycles.
pub struct DnaModel {
    sys: DomainId,
    id: u64,
    status: u64,
    count: u32,
}

impl DnaModel {
    pub fn new(sys: DomainId, id: u64) -> Self {
        DnaModel {
            sys,
            id: id & ((1u64 << DNA_WIDTH) - 1),
            status: 0,
            count: 0,
        }
    }

    pub fn done(&self) -> bool {
        self.count >= 2 * DNA_WIDTH as u32
    }
}

impl Block for DnaModel {
    fn name(&self) -> &str {
        "dna"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            self.status = 0;
            self.count = 0;
            return;
        }
        if self.done() {
            return;
        }
        if self.count % 2 == 1 {
            let bit = (self.id >> (DNA_WIDTH as u32 - 1 - self.count / 2)) & 1;
            self.status = (self.status << 1) | bit;
        }
        self.count += 1;
        if self.done() {
            debug!("DNA readout complete: 0x{:014x}", self.status);
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "id" => self.status,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn readout_takes_two_cycles_per_bit() {
        let sys = DomainSet::single(DomainId(0));
        let mut dna = DnaModel::new(DomainId(0), 0x0012_3456_789a_bcde);
        for _ in 0..113 {
            dna.tick(sys, &Wires::default());
        }
        expect_that!(dna.done(), eq(false));
        dna.tick(sys, &Wires::default());
        expect_that!(dna.done(), eq(true));
        expect_that!(dna.csr_read("id"), eq(0x0012_3456_789a_bcde));
    }

    #[gtest]
    fn identifier_is_truncated_to_57_bits() {
        let dna = DnaModel::new(DomainId(0), u64::MAX);
        expect_that!(dna.id, eq((1u64 << 57) - 1));
    }
}
