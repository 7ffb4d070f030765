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

//! Clock and reset generation.
//!
//! A 100 MHz board oscillator feeds a 7-series PLL producing the system clock and the
//! 200 MHz IDELAYCTRL reference. A second PLL generates the 156.25 MHz transceiver
//! reference when the Ethernet backend is built. Every PLL output domain is held in reset
//! until its PLL locks and released through an asynchronous reset synchronizer.

use crate::error::SdrgwError;
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, ResetSource};
use crate::gateware::graph::DomainGraph;
use crate::gateware::sync::AsyncResetSynchronizer;
use crate::model::{Block, Wires};
use log::{debug, trace};

pub const CLK100_FREQ: f64 = 100e6;
pub const IDELAY_FREQ: u64 = 200_000_000;
pub const ETH_REF_FREQ: u64 = 156_250_000;
pub const RESET_STAGES: usize = 2;

const DIVCLK_DIVIDE_RANGE: std::ops::RangeInclusive<u32> = 1..=56;
const CLKFBOUT_MULT_RANGE: std::ops::RangeInclusive<u32> = 2..=64;
const CLKOUT_DIVIDE_RANGE: std::ops::RangeInclusive<u32> = 1..=128;
const CLKIN_FREQ_RANGE: (f64, f64) = (19e6, 800e6);
const MAX_CLKOUTS: usize = 6;
pub const DEFAULT_CLKOUT_MARGIN: f64 = 1e-2;

fn vco_freq_range(speedgrade: i8) -> Result<(f64, f64), SdrgwError> {
    match speedgrade {
        -1 => Ok((800e6, 1600e6)),
        -2 => Ok((800e6, 1866e6)),
        -3 => Ok((800e6, 2133e6)),
        _ => Err(SdrgwError::Pll(format!(
            "Unknown speedgrade {speedgrade}, expected -1, -2 or -3"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ClkOut {
    domain: DomainId,
    name: String,
    freq: f64,
    margin: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PllOutput {
    pub domain: DomainId,
    pub name: String,
    pub requested_hz: f64,
    pub actual_hz: f64,
    pub divide: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PllConfig {
    pub pll: String,
    pub clkin_hz: f64,
    pub divclk_divide: u32,
    pub clkfbout_mult: u32,
    pub vco_hz: f64,
    pub outputs: Vec<PllOutput>,
}

impl PllConfig {
    pub fn output(&self, domain: DomainId) -> Option<&PllOutput> {
        self.outputs.iter().find(|o| o.domain == domain)
    }
}

/// 7-series PLLE2.
#[derive(Debug, Clone)]
pub struct S7Pll {
    name: String,
    vco_freq_range: (f64, f64),
    clkin: Option<(String, f64)>,
    clkouts: Vec<ClkOut>,
}

impl S7Pll {
    pub fn new(name: &str, speedgrade: i8) -> Result<Self, SdrgwError> {
        Ok(S7Pll {
            name: name.into(),
            vco_freq_range: vco_freq_range(speedgrade)?,
            clkin: None,
            clkouts: Vec::new(),
        })
    }

    pub fn register_clkin(&mut self, signal: &str, freq: f64) -> Result<(), SdrgwError> {
        if let Some((existing, _)) = &self.clkin {
            return Err(SdrgwError::Pll(format!(
                "{}: clock input already registered as {existing}",
                self.name
            )));
        }
        if freq < CLKIN_FREQ_RANGE.0 || freq > CLKIN_FREQ_RANGE.1 {
            return Err(SdrgwError::Pll(format!(
                "{}: input clock {signal} at {freq} Hz is outside {:?}",
                self.name, CLKIN_FREQ_RANGE
            )));
        }
        trace!("{}: clkin {signal} at {freq} Hz", self.name);
        self.clkin = Some((signal.into(), freq));
        Ok(())
    }

    pub fn create_clkout(
        &mut self,
        domain: DomainId,
        name: &str,
        freq: f64,
        margin: f64,
    ) -> Result<(), SdrgwError> {
        if self.clkouts.len() >= MAX_CLKOUTS {
            return Err(SdrgwError::Pll(format!(
                "{}: all {MAX_CLKOUTS} outputs are in use, cannot add {name}",
                self.name
            )));
        }
        trace!("{}: clkout{} {name} at {freq} Hz", self.name, self.clkouts.len());
        self.clkouts.push(ClkOut {
            domain,
            name: name.into(),
            freq,
            margin,
        });
        Ok(())
    }

    /// Search divider settings, highest VCO frequency first, for one that hits every
    /// output within its margin.
    pub fn compute_config(&self) -> Result<PllConfig, SdrgwError> {
        let (_, clkin_freq) = self
            .clkin
            .clone()
            .ok_or_else(|| SdrgwError::Pll(format!("{}: no clock input registered", self.name)))?;
        let (vco_min, vco_max) = self.vco_freq_range;
        for divclk_divide in DIVCLK_DIVIDE_RANGE {
            for clkfbout_mult in CLKFBOUT_MULT_RANGE.rev() {
                let vco = clkin_freq * clkfbout_mult as f64 / divclk_divide as f64;
                if vco < vco_min || vco > vco_max {
                    continue;
                }
                let outputs: Option<Vec<PllOutput>> = self
                    .clkouts
                    .iter()
                    .map(|clkout| {
                        CLKOUT_DIVIDE_RANGE
                            .clone()
                            .find(|d| {
                                (vco / *d as f64 - clkout.freq).abs() <= clkout.freq * clkout.margin
                            })
                            .map(|d| PllOutput {
                                domain: clkout.domain,
                                name: clkout.name.clone(),
                                requested_hz: clkout.freq,
                                actual_hz: vco / d as f64,
                                divide: d,
                            })
                    })
                    .collect();
                if let Some(outputs) = outputs {
                    let config = PllConfig {
                        pll: self.name.clone(),
                        clkin_hz: clkin_freq,
                        divclk_divide,
                        clkfbout_mult,
                        vco_hz: vco,
                        outputs,
                    };
                    debug!("{}: {config:?}", self.name);
                    return Ok(config);
                }
            }
        }
        Err(SdrgwError::Pll(format!(
            "{}: no configuration found for outputs {:?}",
            self.name,
            self.clkouts.iter().map(|c| (&c.name, c.freq)).collect::<Vec<_>>()
        )))
    }
}

/// IDELAYCTRL only calibrates against a 200 or 300 MHz reference.
pub fn check_idelayctrl_reference(freq: f64) -> Result<(), SdrgwError> {
    let valid = (190e6..=210e6).contains(&freq) || (290e6..=310e6).contains(&freq);
    if !valid {
        return Err(SdrgwError::Pll(format!(
            "IDELAYCTRL reference must be 190-210 MHz or 290-310 MHz, got {freq} Hz"
        )));
    }
    Ok(())
}

/// Composed clock generation.
#[derive(Debug, Clone)]
pub struct Crg {
    pub sys: DomainId,
    pub idelay: DomainId,
    pub eth_ref: Option<DomainId>,
    pub pll: PllConfig,
    pub eth_pll: Option<PllConfig>,
}

impl Crg {
    pub fn pll_configs(&self) -> Vec<&PllConfig> {
        std::iter::once(&self.pll).chain(self.eth_pll.as_ref()).collect()
    }

    /// Every domain driven by one of the PLLs.
    pub fn domains(&self) -> DomainSet {
        let mut set = DomainSet::empty();
        set.insert(self.sys);
        set.insert(self.idelay);
        if let Some(eth_ref) = self.eth_ref {
            set.insert(eth_ref);
        }
        set
    }
}

fn pll_domain(
    graph: &mut DomainGraph,
    name: &str,
    freq: u64,
    pll: &str,
) -> Result<DomainId, SdrgwError> {
    let id = graph.add_domain(name, freq, DomainOrigin::Pll { pll: pll.into() })?;
    graph.set_reset_source(id, ResetSource::PllLock { pll: pll.into() })?;
    Ok(id)
}

pub fn crg(
    graph: &mut DomainGraph,
    sys_clk_freq: u64,
    speedgrade: i8,
    with_ethernet: bool,
) -> Result<Crg, SdrgwError> {
    let sys = pll_domain(graph, "sys", sys_clk_freq, "pll")?;
    let idelay = pll_domain(graph, "idelay", IDELAY_FREQ, "pll")?;
    let mut pll = S7Pll::new("pll", speedgrade)?;
    pll.register_clkin("clk100", CLK100_FREQ)?;
    pll.create_clkout(sys, "sys", sys_clk_freq as f64, DEFAULT_CLKOUT_MARGIN)?;
    pll.create_clkout(idelay, "idelay", IDELAY_FREQ as f64, DEFAULT_CLKOUT_MARGIN)?;
    let pll = pll.compute_config()?;
    let idelay_freq = pll
        .output(idelay)
        .map(|o| o.actual_hz)
        .ok_or_else(|| SdrgwError::Internal("PLL config lost the idelay output".into()))?;
    check_idelayctrl_reference(idelay_freq)?;

    let (eth_ref, eth_pll) = if with_ethernet {
        let eth_ref = pll_domain(graph, "eth_ref", ETH_REF_FREQ, "eth_pll")?;
        let mut eth_pll = S7Pll::new("eth_pll", -1)?;
        eth_pll.register_clkin("clk100", CLK100_FREQ)?;
        eth_pll.create_clkout(eth_ref, "eth_ref", ETH_REF_FREQ as f64, 0.0)?;
        (Some(eth_ref), Some(eth_pll.compute_config()?))
    } else {
        (None, None)
    };
    Ok(Crg {
        sys,
        idelay,
        eth_ref,
        pll,
        eth_pll,
    })
}

/// PLL lock and reset release for every PLL output domain.
pub struct CrgModel {
    sys: DomainId,
    lock_cycles: u64,
    lock_counter: u64,
    locked: bool,
    domains: DomainSet,
    resets: Vec<(DomainId, AsyncResetSynchronizer)>,
}

impl CrgModel {
    pub fn new(crg: &Crg, lock_cycles: u64) -> Result<Self, SdrgwError> {
        let resets = crg
            .domains()
            .iter()
            .map(|d| Ok((d, AsyncResetSynchronizer::new(RESET_STAGES)?)))
            .collect::<Result<Vec<_>, SdrgwError>>()?;
        Ok(CrgModel {
            sys: crg.sys,
            lock_cycles,
            lock_counter: 0,
            locked: false,
            domains: crg.domains(),
            resets,
        })
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Drop lock and assert every PLL domain reset until the PLL locks again.
    pub fn request_reset(&mut self) {
        self.locked = false;
        self.lock_counter = 0;
        for (_, sync) in self.resets.iter_mut() {
            sync.set_source(true);
        }
    }
}

impl Block for CrgModel {
    fn name(&self) -> &str {
        "crg"
    }

    fn domains(&self) -> DomainSet {
        self.domains
    }

    fn tick(&mut self, edges: DomainSet, _wires: &Wires) {
        let locked = self.locked;
        for (domain, sync) in self.resets.iter_mut() {
            if edges.contains(*domain) {
                sync.set_source(!locked);
                sync.clock();
            }
        }
        if edges.contains(self.sys) && !locked {
            self.lock_counter += 1;
            if self.lock_counter >= self.lock_cycles {
                debug!("PLL locked after {} sys cycles", self.lock_counter);
                self.locked = true;
            }
        }
    }

    fn reset_out(&self) -> DomainSet {
        self.resets
            .iter()
            .filter(|(_, sync)| sync.asserted())
            .map(|(d, _)| *d)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    fn default_clocking_uses_highest_vco() {
        let mut graph = DomainGraph::new();
        let crg = crg(&mut graph, 125_000_000, -3, false).unwrap();
        expect_that!(crg.pll.divclk_divide, eq(1));
        expect_that!(crg.pll.clkfbout_mult, eq(20));
        expect_that!(crg.pll.vco_hz, approx_eq(2e9));
        expect_that!(crg.pll.output(crg.sys).unwrap().divide, eq(16));
        expect_that!(crg.pll.output(crg.idelay).unwrap().divide, eq(10));
        expect_that!(crg.eth_pll.is_none(), eq(true));
    }

    #[gtest]
    fn ethernet_reference_is_exact() {
        let mut graph = DomainGraph::new();
        let crg = crg(&mut graph, 125_000_000, -3, true).unwrap();
        let eth_pll = crg.eth_pll.unwrap();
        let eth_ref = crg.eth_ref.unwrap();
        expect_that!(eth_pll.divclk_divide, eq(2));
        expect_that!(eth_pll.clkfbout_mult, eq(25));
        expect_that!(eth_pll.output(eth_ref).unwrap().divide, eq(8));
        expect_that!(eth_pll.output(eth_ref).unwrap().actual_hz, eq(156.25e6));
    }

    #[gtest]
    #[rstest]
    #[case::no_common_vco(1_500_000_000)]
    #[case::below_vco_range(1_000)]
    fn impossible_sys_clock_fails(#[case] sys_clk_freq: u64) {
        let mut graph = DomainGraph::new();
        let result = crg(&mut graph, sys_clk_freq, -3, false);
        assert_that!(
            &result,
            err(displays_as(contains_substring("SdrgwError::Pll")))
        );
    }

    #[gtest]
    fn pll_output_count_is_limited() {
        let mut pll = S7Pll::new("pll", -1).unwrap();
        for i in 0..MAX_CLKOUTS {
            pll.create_clkout(DomainId(i as u8), "out", 100e6, DEFAULT_CLKOUT_MARGIN)
                .unwrap();
        }
        assert_that!(
            pll.create_clkout(DomainId(7), "out", 100e6, DEFAULT_CLKOUT_MARGIN),
            err(displays_as(contains_substring("outputs are in use")))
        );
    }

    #[gtest]
    #[rstest]
    #[case::low(150e6, false)]
    #[case::nominal(200e6, true)]
    #[case::high(300e6, true)]
    #[case::between(250e6, false)]
    fn idelayctrl_reference_bands(#[case] freq: f64, #[case] valid: bool) {
        assert_that!(check_idelayctrl_reference(freq).is_ok(), eq(valid));
    }

    #[gtest]
    fn domains_are_released_after_lock() {
        let mut graph = DomainGraph::new();
        let crg = crg(&mut graph, 125_000_000, -3, false).unwrap();
        let mut model = CrgModel::new(&crg, 3).unwrap();
        let sys = DomainSet::single(crg.sys);
        let wires = Wires::default();
        let mut released_at = None;
        for cycle in 1..=10 {
            model.tick(sys, &wires);
            if released_at.is_none() && !model.reset_out().contains(crg.sys) {
                released_at = Some(cycle);
            }
        }
        // Lock on the third edge, then two stages of release.
        expect_that!(released_at, some(eq(5)));
        expect_that!(model.reset_out().contains(crg.idelay), eq(true));
        model.request_reset();
        expect_that!(model.reset_out().contains(crg.sys), eq(true));
    }
}
