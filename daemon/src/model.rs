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

//! Cycle-level model of a composed SoC.
//!
//! A [`SocModel`] is built from a frozen [`Soc`](crate::gateware::soc::Soc) and evaluates
//! each block on the edges of the domains it is clocked by. Every step has two phases:
//! the shared wires (domain resets) are sampled once, then every block with an edge in
//! this instant ticks against that snapshot. Only after all blocks have ticked are the
//! wires recomputed, so no block sees a value another block produced on the same edge.

pub mod clock;

use crate::error::SdrgwError;
use crate::gateware::crg::CrgModel;
use crate::gateware::csr::{CsrAccess, CsrMap, CsrRegister};
use crate::gateware::domain::{DomainId, DomainSet};
use crate::gateware::graph::FrozenGraph;
use crate::gateware::measurement::VALUE_SYNC_STAGES;
use crate::model::clock::ClockScheduler;
use log::{debug, info, trace};

/// Signals every block may sample, taken before the current edge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wires {
    /// Domains whose reset is asserted.
    pub resets: DomainSet,
}

/// Runtime behaviour of one piece of gateware.
pub trait Block: Send {
    /// The CSR bank served by this block, if any.
    fn name(&self) -> &str;

    /// Whether registers of `bank` are routed to this block.
    fn serves(&self, bank: &str) -> bool {
        self.name() == bank
    }

    /// Domains on whose edges [`Block::tick`] is called.
    fn domains(&self) -> DomainSet;

    fn tick(&mut self, edges: DomainSet, wires: &Wires);

    /// Domains this block currently holds in reset.
    fn reset_out(&self) -> DomainSet {
        DomainSet::empty()
    }

    /// Clocks this block lets through.
    fn clock_enable_out(&self) -> DomainSet {
        DomainSet::empty()
    }

    /// Whether the block requested a full system reset since the last call.
    fn take_system_reset(&mut self) -> bool {
        false
    }

    fn csr_read(&self, _register: &str) -> u64 {
        0
    }

    fn csr_write(&mut self, _register: &str, _value: u64) {}
}

/// Counter edges a latch pulse needs to reach the holding register.
pub const LATCH_SETTLE_CYCLES: u64 = 5;

/// One latched measurement together with the system time it was taken at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasurementReading {
    pub value: u64,
    pub uptime_cycles: u64,
}

pub struct SocModel {
    graph: FrozenGraph,
    csr: CsrMap,
    sys: DomainId,
    scheduler: ClockScheduler,
    crg: CrgModel,
    blocks: Vec<Box<dyn Block>>,
    /// Index into `blocks` of the owner of each CSR register.
    csr_owners: Vec<usize>,
    wires: Wires,
    /// Clocks that only toggle while some block enables them.
    gated: DomainSet,
}

impl SocModel {
    pub fn new(
        graph: FrozenGraph,
        csr: CsrMap,
        scheduler: ClockScheduler,
        crg: CrgModel,
        blocks: Vec<Box<dyn Block>>,
        gated: DomainSet,
    ) -> Result<Self, SdrgwError> {
        let sys = csr.bus_domain();
        let csr_owners = csr
            .registers()
            .iter()
            .map(|reg| {
                blocks
                    .iter()
                    .position(|b| b.serves(&reg.bank))
                    .ok_or_else(|| {
                        SdrgwError::Internal(format!("No model serves CSR bank {}", reg.bank))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut model = SocModel {
            graph,
            csr,
            sys,
            scheduler,
            crg,
            blocks,
            csr_owners,
            wires: Wires::default(),
            gated,
        };
        model.commit()?;
        info!(
            "SoC model ready: {} clocks, {} blocks, {} registers",
            model.scheduler.clocks().len(),
            model.blocks.len(),
            model.csr.registers().len()
        );
        Ok(model)
    }

    pub fn graph(&self) -> &FrozenGraph {
        &self.graph
    }

    pub fn csr(&self) -> &CsrMap {
        &self.csr
    }

    pub fn scheduler(&self) -> &ClockScheduler {
        &self.scheduler
    }

    pub fn now_fs(&self) -> u128 {
        self.scheduler.now_fs()
    }

    fn commit(&mut self) -> Result<(), SdrgwError> {
        let mut system_reset = false;
        for block in self.blocks.iter_mut() {
            system_reset |= block.take_system_reset();
        }
        if system_reset {
            debug!("System reset requested");
            self.crg.request_reset();
        }
        self.wires.resets = self
            .blocks
            .iter()
            .fold(self.crg.reset_out(), |acc, b| acc.union(b.reset_out()));
        if !self.gated.is_empty() {
            let enabled = self
                .blocks
                .iter()
                .fold(DomainSet::empty(), |acc, b| acc.union(b.clock_enable_out()));
            for domain in self.gated.iter() {
                let on = enabled.contains(domain);
                if self.scheduler.clock(domain)?.is_enabled() != on {
                    self.scheduler.set_enabled(domain, on)?;
                }
            }
        }
        Ok(())
    }

    /// Process one instant with at least one clock edge.
    pub fn step(&mut self) -> Result<DomainSet, SdrgwError> {
        let edges = self.scheduler.next_edges().ok_or_else(|| {
            SdrgwError::Internal("No clock is toggling, the model cannot advance".into())
        })?;
        let wires = self.wires;
        if !self.crg.domains().intersect(edges).is_empty() {
            self.crg.tick(edges, &wires);
        }
        for block in self.blocks.iter_mut() {
            if !block.domains().intersect(edges).is_empty() {
                block.tick(edges, &wires);
            }
        }
        self.commit()?;
        Ok(edges)
    }

    /// Run until `domain` has seen `cycles` more edges.
    pub fn run_cycles(&mut self, domain: DomainId, cycles: u64) -> Result<(), SdrgwError> {
        if cycles > 0 && !self.scheduler.is_toggling(domain)? {
            return Err(SdrgwError::Argument(format!(
                "Clock of {} is not toggling",
                self.domain_name(domain)
            )));
        }
        let target = self.scheduler.cycles(domain)? + cycles;
        trace!("Running {} to cycle {target}", self.domain_name(domain));
        while self.scheduler.cycles(domain)? < target {
            self.step()?;
        }
        Ok(())
    }

    pub fn run_sys_cycles(&mut self, cycles: u64) -> Result<(), SdrgwError> {
        self.run_cycles(self.sys, cycles)
    }

    /// Process every edge within the next `duration_fs` femtoseconds.
    pub fn run_for_fs(&mut self, duration_fs: u128) -> Result<(), SdrgwError> {
        let target = self.scheduler.now_fs() + duration_fs;
        while self.scheduler.peek().is_some_and(|t| t <= target) {
            self.step()?;
        }
        self.scheduler.advance_to(target);
        Ok(())
    }

    pub fn cycles(&self, domain: DomainId) -> Result<u64, SdrgwError> {
        self.scheduler.cycles(domain)
    }

    pub fn cycles_by_name(&self, domain: &str) -> Result<u64, SdrgwError> {
        self.cycles(self.graph.lookup(domain)?)
    }

    pub fn reset_asserted(&self, domain: DomainId) -> bool {
        self.wires.resets.contains(domain)
    }

    /// Start or stop a clock, as if the board stopped driving it.
    pub fn set_clock_running(&mut self, domain: &str, running: bool) -> Result<(), SdrgwError> {
        let id = self.graph.lookup(domain)?;
        self.scheduler.set_running(id, running)
    }

    pub fn soft_reset(&mut self) -> Result<(), SdrgwError> {
        self.crg.request_reset();
        self.commit()
    }

    fn domain_name(&self, domain: DomainId) -> String {
        self.graph
            .domain(domain)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| domain.to_string())
    }

    fn read_index(&self, index: usize) -> u64 {
        let reg = &self.csr.registers()[index];
        if reg.access == CsrAccess::Strobe {
            return 0;
        }
        self.blocks[self.csr_owners[index]].csr_read(&reg.register) & reg.mask()
    }

    fn write_index(&mut self, index: usize, value: u64) -> Result<(), SdrgwError> {
        let reg = &self.csr.registers()[index];
        if !reg.access.writable() {
            return Err(SdrgwError::Register(format!(
                "{} at 0x{:08x} is read-only",
                reg.name, reg.address
            )));
        }
        trace!("CSR write {} <= 0x{value:x}", reg.name);
        let masked = value & reg.mask();
        let register = reg.register.clone();
        self.blocks[self.csr_owners[index]].csr_write(&register, masked);
        self.commit()
    }

    pub fn read(&self, address: u32) -> Result<u64, SdrgwError> {
        Ok(self.read_index(self.csr.index_of_address(address)?))
    }

    pub fn read_by_name(&self, name: &str) -> Result<u64, SdrgwError> {
        Ok(self.read_index(self.csr.index_of_name(name)?))
    }

    pub fn write(&mut self, address: u32, value: u64) -> Result<(), SdrgwError> {
        let index = self.csr.index_of_address(address)?;
        self.write_index(index, value)
    }

    pub fn write_by_name(&mut self, name: &str, value: u64) -> Result<(), SdrgwError> {
        let index = self.csr.index_of_name(name)?;
        self.write_index(index, value)
    }

    pub fn register(&self, name: &str) -> Result<&CsrRegister, SdrgwError> {
        self.csr.lookup_name(name)
    }

    /// Latch a clock measurement and the uptime counter together, then wait for both
    /// values to settle in their status registers.
    pub fn latch_measurement(&mut self, name: &str) -> Result<MeasurementReading, SdrgwError> {
        let counter = self.graph.lookup(&format!("{name}_counter"))?;
        self.write_by_name(&format!("{name}_latch"), 1)?;
        self.write_by_name("uptime_latch", 1)?;
        self.run_sys_cycles(1)?;
        if self.scheduler.is_toggling(counter)? {
            self.run_cycles(counter, LATCH_SETTLE_CYCLES)?;
        }
        self.run_sys_cycles(VALUE_SYNC_STAGES as u64 + 1)?;
        let reading = MeasurementReading {
            value: self.read_by_name(&format!("{name}_value"))?,
            uptime_cycles: self.read_by_name("uptime_cycles")?,
        };
        debug!("{name}: {reading:?}");
        Ok(reading)
    }
}
