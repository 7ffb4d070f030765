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

//! The clock domain graph.
//!
//! Nodes are [`ClockDomain`]s, edges are [`SynchronizerInstance`]s. Composition adds
//! domains and crossings to a mutable [`DomainGraph`]; [`DomainGraph::freeze`] validates it
//! and returns a [`FrozenGraph`] which is what the constraint emitter and the model read.
//! There is no way back from a frozen graph to a mutable one.

use crate::error::SdrgwError;
use crate::gateware::domain::{
    ClockDomain, DomainId, DomainOrigin, MAX_DOMAINS, ResetSource, Signal,
};
use log::{debug, trace};

/// The largest value a multi-bit register synchronizer can carry.
pub const MAX_MULTIREG_WIDTH: u8 = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum SyncKind {
    /// Asynchronous assertion, synchronous release after `stages` destination edges.
    Reset { stages: usize },
    /// Single-cycle event transfer by toggle and edge detect.
    Pulse,
    /// Multi-stage register chain for a quasi-static multi-bit value.
    MultiBit { stages: usize },
    /// Streaming data path built around a dual clock FIFO.
    AsyncFifo { depth: u32 },
    /// Value written once during configuration and read later in another domain. Needs a
    /// false-path exception rather than a full asynchronous group.
    Quasistatic,
}

impl SyncKind {
    pub fn label(&self) -> &'static str {
        match self {
            SyncKind::Reset { .. } => "reset",
            SyncKind::Pulse => "pulse",
            SyncKind::MultiBit { .. } => "multireg",
            SyncKind::AsyncFifo { .. } => "async_fifo",
            SyncKind::Quasistatic => "quasistatic",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SynchronizerInstance {
    pub name: String,
    pub kind: SyncKind,
    pub source: DomainId,
    pub destination: DomainId,
    pub payload_width: u8,
}

#[derive(Debug, Default)]
pub struct DomainGraph {
    domains: Vec<ClockDomain>,
    synchronizers: Vec<SynchronizerInstance>,
}

impl DomainGraph {
    pub fn new() -> Self {
        DomainGraph::default()
    }

    /// Declare a new domain. Its reset source starts unset, see
    /// [`DomainGraph::set_reset_source`].
    pub fn add_domain(
        &mut self,
        name: &str,
        nominal_frequency_hz: u64,
        origin: DomainOrigin,
    ) -> Result<DomainId, SdrgwError> {
        if self.domains.iter().any(|d| d.name == name) {
            return Err(SdrgwError::DuplicateDomain(name.into()));
        }
        if nominal_frequency_hz == 0 {
            return Err(SdrgwError::Config(format!(
                "Clock domain {name} must have a non-zero frequency"
            )));
        }
        if self.domains.len() >= MAX_DOMAINS {
            return Err(SdrgwError::Config(format!(
                "Cannot declare {name}: at most {MAX_DOMAINS} clock domains are supported"
            )));
        }
        let id = DomainId(self.domains.len() as u8);
        debug!("Declaring clock domain {name} ({nominal_frequency_hz} Hz, {origin:?}) as {id}");
        self.domains.push(ClockDomain {
            id,
            name: name.into(),
            clock_signal: format!("{name}_clk"),
            reset_signal: format!("{name}_rst"),
            nominal_frequency_hz,
            origin,
            reset_source: None,
        });
        Ok(id)
    }

    pub fn set_reset_source(
        &mut self,
        domain: DomainId,
        source: ResetSource,
    ) -> Result<(), SdrgwError> {
        let domain = self.domain_mut(domain)?;
        trace!("Reset of {} driven by {source:?}", domain.name);
        domain.reset_source = Some(source);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<DomainId, SdrgwError> {
        lookup(&self.domains, name)
    }

    pub fn domain(&self, id: DomainId) -> Result<&ClockDomain, SdrgwError> {
        domain(&self.domains, id)
    }

    fn domain_mut(&mut self, id: DomainId) -> Result<&mut ClockDomain, SdrgwError> {
        self.domains
            .get_mut(id.index())
            .ok_or_else(|| SdrgwError::MissingDomain(id.to_string()))
    }

    fn domain_name(&self, id: DomainId) -> String {
        self.domain(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| id.to_string())
    }

    /// Record a crossing of `signal` into `destination`.
    ///
    /// Returns the synchronized copy of the signal, registered in `destination`. That copy is
    /// the only form of the value that logic in `destination` may consume.
    pub fn add_synchronizer(
        &mut self,
        name: &str,
        kind: SyncKind,
        signal: &Signal,
        destination: DomainId,
    ) -> Result<Signal, SdrgwError> {
        self.domain(signal.domain)?;
        self.domain(destination)?;
        if signal.domain == destination {
            return Err(SdrgwError::Synchronizer(format!(
                "{name}: {} is already in {}, no synchronizer is needed",
                signal.name,
                self.domain_name(destination)
            )));
        }
        match &kind {
            SyncKind::Pulse if signal.width > 1 => {
                return Err(SdrgwError::Synchronizer(format!(
                    "{name}: a pulse synchronizer carries a single bit, {} is {} bits wide",
                    signal.name, signal.width
                )));
            }
            SyncKind::MultiBit { .. }
                if signal.width == 0 || signal.width > MAX_MULTIREG_WIDTH =>
            {
                return Err(SdrgwError::Synchronizer(format!(
                    "{name}: multi-bit register width must be 1..={MAX_MULTIREG_WIDTH}, {} is {}",
                    signal.name, signal.width
                )));
            }
            SyncKind::Reset { stages } | SyncKind::MultiBit { stages } if *stages < 2 => {
                return Err(SdrgwError::Synchronizer(format!(
                    "{name}: at least two register stages are required, got {stages}"
                )));
            }
            _ => {}
        }
        debug!(
            "Adding {} synchronizer {name}: {} {} -> {}",
            kind.label(),
            signal.name,
            self.domain_name(signal.domain),
            self.domain_name(destination)
        );
        self.synchronizers.push(SynchronizerInstance {
            name: name.into(),
            kind,
            source: signal.domain,
            destination,
            payload_width: signal.width,
        });
        Ok(Signal::new(
            format!("{}_{}", signal.name, self.domain_name(destination)),
            signal.width,
            destination,
        ))
    }

    /// Drive the reset of `destination` from the reset of `source` through an asynchronous
    /// reset synchronizer.
    pub fn add_reset_synchronizer(
        &mut self,
        name: &str,
        source: DomainId,
        destination: DomainId,
        stages: usize,
    ) -> Result<(), SdrgwError> {
        let reset = Signal::new(self.domain(source)?.reset_signal.clone(), 1, source);
        self.add_synchronizer(name, SyncKind::Reset { stages }, &reset, destination)?;
        self.set_reset_source(destination, ResetSource::Domain(source))
    }

    /// Check that `signal` may be consumed by logic of `domain`.
    pub fn require_local(&self, signal: &Signal, domain: DomainId) -> Result<(), SdrgwError> {
        if signal.domain != domain {
            return Err(SdrgwError::DomainMismatch {
                signal: signal.name.clone(),
                expected: self.domain_name(domain),
                found: self.domain_name(signal.domain),
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SdrgwError> {
        for domain in &self.domains {
            match &domain.reset_source {
                None => return Err(SdrgwError::MissingReset(domain.name.clone())),
                Some(ResetSource::Domain(source)) => {
                    let synchronized = self.synchronizers.iter().any(|s| {
                        matches!(s.kind, SyncKind::Reset { .. })
                            && s.source == *source
                            && s.destination == domain.id
                    });
                    if !synchronized {
                        return Err(SdrgwError::Synchronizer(format!(
                            "Reset of {} comes from {} without a reset synchronizer",
                            domain.name,
                            self.domain_name(*source)
                        )));
                    }
                }
                Some(ResetSource::Derived { parent }) => {
                    self.domain(*parent)?;
                }
                Some(_) => {}
            }
            if let DomainOrigin::Divided { parent, divider } = domain.origin {
                self.domain(parent)?;
                if divider < 2 {
                    return Err(SdrgwError::Config(format!(
                        "Divided clock {} needs a divider of at least 2, got {divider}",
                        domain.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn freeze(self) -> Result<FrozenGraph, SdrgwError> {
        self.validate()?;
        debug!(
            "Freezing domain graph with {} domains and {} synchronizers",
            self.domains.len(),
            self.synchronizers.len()
        );
        Ok(FrozenGraph {
            domains: self.domains,
            synchronizers: self.synchronizers,
        })
    }
}

/// A validated, immutable domain graph.
#[derive(Debug, Clone)]
pub struct FrozenGraph {
    domains: Vec<ClockDomain>,
    synchronizers: Vec<SynchronizerInstance>,
}

impl FrozenGraph {
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    pub fn synchronizers(&self) -> &[SynchronizerInstance] {
        &self.synchronizers
    }

    pub fn lookup(&self, name: &str) -> Result<DomainId, SdrgwError> {
        lookup(&self.domains, name)
    }

    pub fn domain(&self, id: DomainId) -> Result<&ClockDomain, SdrgwError> {
        domain(&self.domains, id)
    }
}

fn lookup(domains: &[ClockDomain], name: &str) -> Result<DomainId, SdrgwError> {
    domains
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.id)
        .ok_or_else(|| SdrgwError::MissingDomain(name.into()))
}

fn domain(domains: &[ClockDomain], id: DomainId) -> Result<&ClockDomain, SdrgwError> {
    domains
        .get(id.index())
        .ok_or_else(|| SdrgwError::MissingDomain(id.to_string()))
}
