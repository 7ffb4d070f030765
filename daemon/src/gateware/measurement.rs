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

//! Frequency measurement of an external clock.
//!
//! A 64-bit counter free-runs in a private domain clocked by the measured clock. Writing
//! the `latch` strobe sends a pulse into that domain which copies the counter into a
//! holding register; the holding register reaches the `value` status register through a
//! two stage [`MultiReg`]. Software computes the frequency from two successive values and
//! the control domain time between the two latches.
//!
//! A stopped clock is not an error: the counter stops and `value` keeps returning the same
//! number.

use crate::config::MeasuredClock;
use crate::error::SdrgwError;
use crate::gateware::crg::RESET_STAGES;
use crate::gateware::csr::{CsrAccess, CsrMap};
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, Signal};
use crate::gateware::graph::{DomainGraph, SyncKind};
use crate::gateware::sync::{AsyncResetSynchronizer, MultiReg, PulseSynchronizer};
use crate::model::{Block, Wires};
use log::{debug, trace};

pub const VALUE_SYNC_STAGES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ClockMeasurement {
    pub name: String,
    pub measured_clock: MeasuredClock,
    pub counter_domain: DomainId,
    pub control_domain: DomainId,
    pub counter_step: u64,
    /// Strobe in the control domain.
    pub latch: Signal,
    /// Last latched counter value in the control domain.
    pub value: Signal,
}

/// Build and wire a measurement of `clock`, controlled from `control`.
///
/// `control` must be the register bus domain, the latch and value registers live there.
pub fn clock_measurement(
    graph: &mut DomainGraph,
    csr: &mut CsrMap,
    name: &str,
    clock: &MeasuredClock,
    control: DomainId,
    counter_step: u64,
) -> Result<ClockMeasurement, SdrgwError> {
    if counter_step == 0 {
        return Err(SdrgwError::Config(format!(
            "{name}: counter step must be at least 1"
        )));
    }
    let counter = graph.add_domain(
        &format!("{name}_counter"),
        clock.frequency_hz,
        DomainOrigin::ExternalInput {
            pin: clock.name.clone(),
        },
    )?;
    graph.add_reset_synchronizer(&format!("{name}_rst_sync"), control, counter, RESET_STAGES)?;

    csr.add_bank(name)?;
    let latch = csr.add_register(name, "latch", 1, CsrAccess::Strobe, 0)?;
    graph.require_local(&latch, control)?;
    let latch_counter = graph.add_synchronizer(
        &format!("{name}_latch_sync"),
        SyncKind::Pulse,
        &latch,
        counter,
    )?;
    graph.require_local(&latch_counter, counter)?;

    let holding = Signal::new(format!("{name}_latch_value"), 64, counter);
    let holding_control = graph.add_synchronizer(
        &format!("{name}_value_sync"),
        SyncKind::MultiBit {
            stages: VALUE_SYNC_STAGES,
        },
        &holding,
        control,
    )?;
    let value = csr.add_register(name, "value", 64, CsrAccess::ReadOnly, 0)?;
    graph.require_local(&holding_control, value.domain)?;
    trace!("{name}: measuring {} in {counter}", clock.name);
    Ok(ClockMeasurement {
        name: name.into(),
        measured_clock: clock.clone(),
        counter_domain: counter,
        control_domain: control,
        counter_step,
        latch,
        value,
    })
}

pub struct ClockMeasurementModel {
    name: String,
    control: DomainId,
    counter_domain: DomainId,
    step: u64,
    strobe: bool,
    reset_sync: AsyncResetSynchronizer,
    latch_sync: PulseSynchronizer,
    value_sync: MultiReg,
    counter: u64,
    holding: u64,
    captures: u64,
}

impl ClockMeasurementModel {
    pub fn new(measurement: &ClockMeasurement) -> Result<Self, SdrgwError> {
        Ok(ClockMeasurementModel {
            name: measurement.name.clone(),
            control: measurement.control_domain,
            counter_domain: measurement.counter_domain,
            step: measurement.counter_step,
            strobe: false,
            reset_sync: AsyncResetSynchronizer::new(RESET_STAGES)?,
            latch_sync: PulseSynchronizer::new()?,
            value_sync: MultiReg::new(64, VALUE_SYNC_STAGES)?,
            counter: 0,
            holding: 0,
            captures: 0,
        })
    }

    /// Latch pulses that reached the counter domain.
    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn value(&self) -> u64 {
        self.value_sync.output()
    }

    pub fn latch(&mut self) {
        self.strobe = true;
    }
}

impl Block for ClockMeasurementModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn domains(&self) -> DomainSet {
        let mut set = DomainSet::single(self.control);
        set.insert(self.counter_domain);
        set
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        let control_edge = edges.contains(self.control);
        let counter_edge = edges.contains(self.counter_domain);
        let strobe = self.strobe;
        let pulse = self.latch_sync.output();
        let holding = self.holding;

        self.reset_sync.set_source(wires.resets.contains(self.control));
        let in_reset = self.reset_sync.asserted();

        if control_edge {
            self.value_sync.clock(holding);
            self.strobe = false;
        }
        self.latch_sync.step(control_edge, counter_edge, strobe);
        if counter_edge {
            self.reset_sync.clock();
            if in_reset {
                self.counter = 0;
                self.holding = 0;
            } else {
                if pulse {
                    self.holding = self.counter;
                    self.captures += 1;
                    debug!("{}: latched {}", self.name, self.counter);
                }
                self.counter = self.counter.wrapping_add(self.step);
            }
        }
    }

    fn reset_out(&self) -> DomainSet {
        if self.reset_sync.asserted() {
            DomainSet::single(self.counter_domain)
        } else {
            DomainSet::empty()
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "value" => self.value(),
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, _value: u64) {
        if register == "latch" {
            self.latch();
        }
    }
}
