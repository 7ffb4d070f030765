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

//! Configuration port access, used to reload the FPGA from flash.

use crate::error::SdrgwError;
use crate::gateware::csr::{CsrAccess, CsrMap};
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, ResetSource, Signal};
use crate::gateware::graph::{DomainGraph, SyncKind};
use crate::model::{Block, Wires};
use log::{debug, info};

pub const ICAP_CLK_DIVIDER: u32 = 16;
pub const ICAP_CMD_REGISTER: u64 = 0x04;
pub const ICAP_CMD_IPROG: u64 = 0x0f;

/// Sync word, NOOP, write CMD IPROG.
pub const IPROG_SEQUENCE: [u32; 8] = [
    0xffff_ffff,
    0xaa99_5566,
    0x2000_0000,
    0x3002_0001,
    0x0000_0000,
    0x3000_8001,
    0x0000_000f,
    0x2000_0000,
];

pub fn icap(
    graph: &mut DomainGraph,
    csr: &mut CsrMap,
    sys: DomainId,
) -> Result<DomainId, SdrgwError> {
    let sys_freq = graph.domain(sys)?.nominal_frequency_hz;
    let domain = graph.add_domain(
        "icap",
        sys_freq / ICAP_CLK_DIVIDER as u64,
        DomainOrigin::Divided {
            parent: sys,
            divider: ICAP_CLK_DIVIDER,
        },
    )?;
    graph.set_reset_source(domain, ResetSource::Derived { parent: sys })?;
    graph.add_synchronizer(
        "icap_write",
        SyncKind::Quasistatic,
        &Signal::new("icap_data", 32, sys),
        domain,
    )?;
    csr.add_bank("icap")?;
    csr.add_register("icap", "addr", 5, CsrAccess::ReadWrite, 0)?;
    csr.add_register("icap", "data", 32, CsrAccess::ReadWrite, 0)?;
    csr.add_register("icap", "write", 1, CsrAccess::Strobe, 0)?;
    csr.add_register("icap", "done", 1, CsrAccess::ReadOnly, 1)?;
    csr.add_register("icap", "reload", 1, CsrAccess::Strobe, 0)?;
    Ok(domain)
}

pub struct IcapModel {
    sys: DomainId,
    addr: u64,
    data: u64,
    /// Words still to be clocked into the port.
    pending: Vec<u32>,
    countdown: u32,
    reload_after: bool,
    reload: bool,
}

impl IcapModel {
    pub fn new(sys: DomainId) -> Self {
        IcapModel {
            sys,
            addr: 0,
            data: 0,
            pending: Vec::new(),
            countdown: 0,
            reload_after: false,
            reload: false,
        }
    }

    pub fn busy(&self) -> bool {
        !self.pending.is_empty()
    }

    fn start(&mut self, words: Vec<u32>, reload: bool) {
        if self.busy() {
            debug!("ICAP busy, dropping request");
            return;
        }
        self.pending = words;
        self.countdown = ICAP_CLK_DIVIDER;
        self.reload_after = reload;
    }
}

impl Block for IcapModel {
    fn name(&self) -> &str {
        "icap"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            *self = IcapModel::new(self.sys);
            return;
        }
        if !self.busy() {
            return;
        }
        self.countdown -= 1;
        if self.countdown > 0 {
            return;
        }
        let word = self.pending.remove(0);
        debug!("ICAP word 0x{word:08x}");
        self.countdown = ICAP_CLK_DIVIDER;
        if self.pending.is_empty() && self.reload_after {
            info!("ICAP IPROG issued, reloading");
            self.reload = true;
        }
    }

    fn take_system_reset(&mut self) -> bool {
        std::mem::take(&mut self.reload)
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "addr" => self.addr,
            "data" => self.data,
            "done" => !self.busy() as u64,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "addr" => self.addr = value,
            "data" => self.data = value,
            "write" => {
                let reload = self.addr == ICAP_CMD_REGISTER && self.data == ICAP_CMD_IPROG;
                self.start(vec![self.data as u32], reload);
            }
            "reload" => self.start(IPROG_SEQUENCE.to_vec(), true),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    fn run(icap: &mut IcapModel, cycles: u32) {
        for _ in 0..cycles {
            icap.tick(DomainSet::single(DomainId(0)), &Wires::default());
        }
    }

    #[gtest]
    fn reload_shifts_the_sequence_then_resets() {
        let mut icap = IcapModel::new(DomainId(0));
        icap.csr_write("reload", 1);
        expect_that!(icap.csr_read("done"), eq(0));
        run(&mut icap, 8 * ICAP_CLK_DIVIDER - 1);
        expect_that!(icap.take_system_reset(), eq(false));
        run(&mut icap, 1);
        expect_that!(icap.csr_read("done"), eq(1));
        expect_that!(icap.take_system_reset(), eq(true));
    }

    #[gtest]
    fn plain_write_does_not_reload() {
        let mut icap = IcapModel::new(DomainId(0));
        icap.csr_write("addr", 0x01);
        icap.csr_write("data", 0x1234);
        icap.csr_write("write", 1);
        run(&mut icap, ICAP_CLK_DIVIDER);
        expect_that!(icap.busy(), eq(false));
        expect_that!(icap.take_system_reset(), eq(false));
    }

    #[gtest]
    fn writing_iprog_to_cmd_reloads() {
        let mut icap = IcapModel::new(DomainId(0));
        icap.csr_write("addr", ICAP_CMD_REGISTER);
        icap.csr_write("data", ICAP_CMD_IPROG);
        icap.csr_write("write", 1);
        run(&mut icap, ICAP_CLK_DIVIDER);
        expect_that!(icap.take_system_reset(), eq(true));
    }
}
