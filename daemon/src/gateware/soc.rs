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

//! Top-level composition of the carrier board SoC.
//!
//! [`compose`] elaborates every block in a fixed order, freezes the domain graph and
//! derives the timing constraints from it. The backend is selected before anything is
//! elaborated, so a conflicting configuration fails without touching the graph.

use crate::config::SocConfig;
use crate::error::SdrgwError;
use crate::gateware::backends::{Backend, BackendMode, Composer, TransceiverPll, select_backend};
use crate::gateware::constraints::ConstraintSet;
use crate::gateware::crg::{Crg, CrgModel, crg};
use crate::gateware::csr::CsrMap;
use crate::gateware::domain::{DomainId, DomainSet};
use crate::gateware::graph::{DomainGraph, FrozenGraph};
use crate::gateware::measurement::{ClockMeasurement, ClockMeasurementModel, clock_measurement};
use crate::gateware::peripherals::ctrl::{CtrlModel, ctrl};
use crate::gateware::peripherals::dna::{DnaModel, dna};
use crate::gateware::peripherals::icap::{IcapModel, icap};
use crate::gateware::peripherals::jtagbone::jtagbone;
use crate::gateware::peripherals::leds::{LedChaserModel, USER_LEDS, leds};
use crate::gateware::peripherals::uptime::{UptimeModel, uptime};
use crate::gateware::peripherals::xadc::{XadcModel, xadc};
use crate::gateware::peripherals::IDENT;
use crate::gateware::si5351::{PwmModel, Si5351Model, si5351, si5351_pwm};
use crate::model::clock::ClockScheduler;
use crate::model::{Block, SocModel};
use crate::system_io::{fs_create_dir, fs_write};
use log::{info, trace};
use std::fmt::Write;
use std::path::Path;

pub struct Soc {
    pub ident: String,
    pub config: SocConfig,
    pub graph: FrozenGraph,
    pub constraints: ConstraintSet,
    pub csr: CsrMap,
    pub crg: Crg,
    pub backend: Option<Box<dyn Backend>>,
    pub measurements: Vec<ClockMeasurement>,
    pub jtag: Option<DomainId>,
}

pub fn compose(config: &SocConfig) -> Result<Soc, SdrgwError> {
    let mut backend = select_backend(config)?;

    let mut graph = DomainGraph::new();
    let crg = crg(
        &mut graph,
        config.sys_clk_freq,
        config.pll_speedgrade,
        config.with_ethernet,
    )?;
    let sys = crg.sys;
    let mut csr = CsrMap::new(sys);
    ctrl(&mut csr)?;
    uptime(&mut csr)?;
    si5351(&mut csr)?;
    si5351_pwm(&mut csr)?;
    leds(&mut csr, USER_LEDS)?;
    icap(&mut graph, &mut csr, sys)?;
    xadc(&mut csr)?;
    dna(&mut graph, &mut csr, sys)?;
    let jtag = if config.with_jtagbone {
        Some(jtagbone(&mut graph, sys)?)
    } else {
        None
    };

    if let Some(backend) = backend.as_mut() {
        let mut transceiver_pll = TransceiverPll::default();
        let mut composer = Composer {
            graph: &mut graph,
            csr: &mut csr,
            crg: &crg,
            transceiver_pll: &mut transceiver_pll,
        };
        backend.elaborate(&mut composer)?;
    }

    let measurements = config
        .measured_clocks
        .iter()
        .map(|clock| {
            clock_measurement(
                &mut graph,
                &mut csr,
                &clock.name,
                clock,
                sys,
                config.counter_step,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let graph = graph.freeze()?;
    let constraints = ConstraintSet::emit(&graph);
    info!(
        "Composed {IDENT}: {} domains, {} crossings, {} CSR banks",
        graph.domains().len(),
        graph.synchronizers().len(),
        csr.banks().len()
    );
    Ok(Soc {
        ident: IDENT.to_string(),
        config: config.clone(),
        graph,
        constraints,
        csr,
        crg,
        backend,
        measurements,
        jtag,
    })
}

impl Soc {
    pub fn backend_mode(&self) -> BackendMode {
        self.backend
            .as_ref()
            .map_or(BackendMode::None, |backend| backend.mode())
    }

    fn blocks(&self) -> Result<Vec<Box<dyn Block>>, SdrgwError> {
        let config = &self.config;
        let sys = self.crg.sys;
        let si5351_outputs = self
            .measurements
            .iter()
            .filter(|m| m.measured_clock.gated_by_si5351)
            .map(|m| m.counter_domain)
            .collect();
        let mut blocks: Vec<Box<dyn Block>> = vec![
            Box::new(CtrlModel::new(sys)),
            Box::new(UptimeModel::new(sys)),
            Box::new(Si5351Model::new(
                sys,
                config.sys_clk_freq,
                config.simulation.i2c_freq,
                si5351_outputs,
            )?),
            Box::new(PwmModel::new(sys)),
            Box::new(LedChaserModel::new(sys, config.sys_clk_freq, USER_LEDS)),
            Box::new(IcapModel::new(sys)),
            Box::new(XadcModel::new(sys, config.sensors.clone())),
            Box::new(DnaModel::new(sys, config.sensors.dna_id)),
        ];
        if let Some(backend) = &self.backend {
            blocks.extend(backend.blocks()?);
        }
        for measurement in &self.measurements {
            blocks.push(Box::new(ClockMeasurementModel::new(measurement)?));
        }
        Ok(blocks)
    }

    /// Build a runnable model of this SoC.
    pub fn instantiate(&self) -> Result<SocModel, SdrgwError> {
        let blocks = self.blocks()?;
        let clocked = blocks
            .iter()
            .fold(self.crg.domains(), |acc, b| acc.union(b.domains()));
        let mut scheduler = ClockScheduler::new();
        for domain in self.graph.domains() {
            if !clocked.contains(domain.id) {
                continue;
            }
            let running = self
                .measurements
                .iter()
                .find(|m| m.counter_domain == domain.id)
                .is_none_or(|m| m.measured_clock.running);
            trace!("Clocking {} at {} Hz", domain.name, domain.nominal_frequency_hz);
            scheduler.add_clock(
                domain.id,
                &domain.name,
                domain.nominal_frequency_hz,
                0,
                running,
            )?;
        }
        let gated: DomainSet = self
            .measurements
            .iter()
            .filter(|m| m.measured_clock.gated_by_si5351)
            .map(|m| m.counter_domain)
            .collect();
        let crg = CrgModel::new(&self.crg, self.config.simulation.pll_lock_cycles)?;
        SocModel::new(
            self.graph.clone(),
            self.csr.clone(),
            scheduler,
            crg,
            blocks,
            gated,
        )
    }

    pub fn export_artifacts(&self, directory: &Path) -> Result<(), SdrgwError> {
        write_artifacts(&self.graph, &self.csr, directory)
    }
}

/// `clock,frequency_hz,period_ns` for every domain.
pub fn clock_table(constraints: &ConstraintSet) -> String {
    let mut text = String::new();
    for period in constraints.periods() {
        let _ = writeln!(
            text,
            "{},{},{:.3}",
            period.clock, period.frequency_hz, period.period_ns
        );
    }
    text
}

/// Write `csr.csv`, `constraints.txt` and `clocks.txt` into `directory`.
pub fn write_artifacts(
    graph: &FrozenGraph,
    csr: &CsrMap,
    directory: &Path,
) -> Result<(), SdrgwError> {
    fs_create_dir(directory)?;
    let constraints = ConstraintSet::emit(graph);
    fs_write(&directory.join("csr.csv"), true, csr.to_csv())?;
    fs_write(&directory.join("constraints.txt"), true, constraints.render())?;
    fs_write(&directory.join("clocks.txt"), true, clock_table(&constraints))?;
    info!("Exported build artifacts to {directory:?}");
    Ok(())
}
