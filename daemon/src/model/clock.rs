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

//! Exact multi-clock edge scheduling.
//!
//! Time is counted in femtoseconds. Edge `n` of a clock of frequency `f` with phase `p`
//! happens at `p + floor(n * 10^15 / f)`, computed from `n` each time so rounding never
//! accumulates. Stopping a clock and starting it again resumes at the first edge of the
//! original grid that lies after the current time.

use crate::error::SdrgwError;
use crate::gateware::domain::{DomainId, DomainSet};
use log::debug;

pub const FS_PER_SECOND: u128 = 1_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct ClockSource {
    pub domain: DomainId,
    pub name: String,
    pub frequency_hz: u64,
    phase_fs: u128,
    /// Cleared when the clock is absent or stopped.
    running: bool,
    /// Cleared while an upstream generator holds the clock off.
    enabled: bool,
    next_index: u128,
    cycles: u64,
}

impl ClockSource {
    fn edge_time(&self, index: u128) -> u128 {
        self.phase_fs + index * FS_PER_SECOND / self.frequency_hz as u128
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn toggling(&self) -> bool {
        self.running && self.enabled
    }

    fn next_edge(&self) -> Option<u128> {
        self.toggling().then(|| self.edge_time(self.next_index))
    }

    /// Move `next_index` to the first edge strictly after `now`.
    fn resync(&mut self, now: u128) {
        let mut index = if now < self.phase_fs {
            0
        } else {
            (now - self.phase_fs) * self.frequency_hz as u128 / FS_PER_SECOND
        };
        while self.edge_time(index) <= now && now > 0 {
            index += 1;
        }
        self.next_index = self.next_index.max(index);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClockScheduler {
    clocks: Vec<ClockSource>,
    now_fs: u128,
}

impl ClockScheduler {
    pub fn new() -> Self {
        ClockScheduler::default()
    }

    pub fn add_clock(
        &mut self,
        domain: DomainId,
        name: &str,
        frequency_hz: u64,
        phase_fs: u128,
        running: bool,
    ) -> Result<(), SdrgwError> {
        if frequency_hz == 0 {
            return Err(SdrgwError::Config(format!(
                "Clock {name} must have a non-zero frequency"
            )));
        }
        if self.clocks.iter().any(|c| c.domain == domain) {
            return Err(SdrgwError::DuplicateDomain(name.into()));
        }
        self.clocks.push(ClockSource {
            domain,
            name: name.into(),
            frequency_hz,
            phase_fs,
            running,
            enabled: true,
            next_index: 0,
            cycles: 0,
        });
        Ok(())
    }

    fn clock_mut(&mut self, domain: DomainId) -> Result<&mut ClockSource, SdrgwError> {
        self.clocks
            .iter_mut()
            .find(|c| c.domain == domain)
            .ok_or_else(|| SdrgwError::MissingDomain(domain.to_string()))
    }

    pub fn clock(&self, domain: DomainId) -> Result<&ClockSource, SdrgwError> {
        self.clocks
            .iter()
            .find(|c| c.domain == domain)
            .ok_or_else(|| SdrgwError::MissingDomain(domain.to_string()))
    }

    pub fn clocks(&self) -> &[ClockSource] {
        &self.clocks
    }

    pub fn now_fs(&self) -> u128 {
        self.now_fs
    }

    pub fn cycles(&self, domain: DomainId) -> Result<u64, SdrgwError> {
        Ok(self.clock(domain)?.cycles)
    }

    pub fn is_toggling(&self, domain: DomainId) -> Result<bool, SdrgwError> {
        Ok(self.clock(domain)?.toggling())
    }

    pub fn set_running(&mut self, domain: DomainId, running: bool) -> Result<(), SdrgwError> {
        let now = self.now_fs;
        let clock = self.clock_mut(domain)?;
        debug!("Clock {} running: {running}", clock.name);
        clock.running = running;
        clock.resync(now);
        Ok(())
    }

    pub fn set_enabled(&mut self, domain: DomainId, enabled: bool) -> Result<(), SdrgwError> {
        let now = self.now_fs;
        let clock = self.clock_mut(domain)?;
        if clock.enabled != enabled {
            debug!("Clock {} enabled: {enabled}", clock.name);
        }
        clock.enabled = enabled;
        clock.resync(now);
        Ok(())
    }

    /// Time of the next edge of any toggling clock.
    pub fn peek(&self) -> Option<u128> {
        self.clocks.iter().filter_map(ClockSource::next_edge).min()
    }

    /// Advance time to the next edge and return every domain edging at that instant.
    ///
    /// Returns `None` when no clock is toggling.
    pub fn next_edges(&mut self) -> Option<DomainSet> {
        let now = self.peek()?;
        self.now_fs = now;
        let mut edges = DomainSet::empty();
        for clock in self.clocks.iter_mut() {
            if clock.next_edge() == Some(now) {
                edges.insert(clock.domain);
                clock.next_index += 1;
                clock.cycles += 1;
            }
        }
        Some(edges)
    }

    /// Let time pass without processing edges, used once every edge up to `time_fs` has
    /// been consumed.
    pub fn advance_to(&mut self, time_fs: u128) {
        if time_fs > self.now_fs {
            self.now_fs = time_fs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    fn scheduler() -> ClockScheduler {
        let mut scheduler = ClockScheduler::new();
        scheduler
            .add_clock(DomainId(0), "sys", 125_000_000, 0, true)
            .unwrap();
        scheduler
            .add_clock(DomainId(1), "ext", 38_400_000, 0, true)
            .unwrap();
        scheduler
    }

    fn run_until(scheduler: &mut ClockScheduler, domain: DomainId, cycles: u64) {
        while scheduler.cycles(domain).unwrap() < cycles {
            scheduler.next_edges().unwrap();
        }
    }

    #[gtest]
    fn first_edges_are_simultaneous() {
        let mut scheduler = scheduler();
        let edges = scheduler.next_edges().unwrap();
        expect_that!(edges.contains(DomainId(0)), eq(true));
        expect_that!(edges.contains(DomainId(1)), eq(true));
        expect_that!(scheduler.now_fs(), eq(0));
    }

    #[gtest]
    fn edge_counts_do_not_drift() {
        let mut scheduler = scheduler();
        run_until(&mut scheduler, DomainId(0), 1_000_001);
        // 1_000_000 sys periods is 8 ms, which holds exactly 307_200 ext periods.
        expect_that!(scheduler.now_fs(), eq(8_000_000_000_000));
        expect_that!(scheduler.cycles(DomainId(1)).unwrap(), eq(307_201));
    }

    #[gtest]
    fn stopped_clock_does_not_edge() {
        let mut scheduler = scheduler();
        scheduler.set_running(DomainId(1), false).unwrap();
        run_until(&mut scheduler, DomainId(0), 100);
        assert_that!(scheduler.cycles(DomainId(1)).unwrap(), eq(0));
    }

    #[gtest]
    fn restarted_clock_resumes_on_its_grid() {
        let mut scheduler = scheduler();
        scheduler.set_enabled(DomainId(1), false).unwrap();
        run_until(&mut scheduler, DomainId(0), 10);
        scheduler.set_enabled(DomainId(1), true).unwrap();
        let next = scheduler.clock(DomainId(1)).unwrap().next_edge().unwrap();
        expect_that!(next > scheduler.now_fs(), eq(true));
        // Edge 3 of 38.4 MHz is at 78.125 ns, after 10 sys edges (72 ns).
        expect_that!(next, eq(78_125_000));
    }

    #[gtest]
    fn nothing_to_schedule_without_running_clocks() {
        let mut scheduler = scheduler();
        scheduler.set_running(DomainId(0), false).unwrap();
        scheduler.set_running(DomainId(1), false).unwrap();
        assert_that!(scheduler.next_edges(), none());
    }
}
