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

//! Timing exceptions derived from the frozen domain graph.
//!
//! Every pair of domains connected by at least one synchronizer gets exactly one entry,
//! whatever the number or direction of crossings between them. Pairs crossed only by
//! quasi-static paths are declared false paths; any other crossing makes the pair
//! asynchronous. No entry is produced for a pair without a crossing.

use crate::gateware::domain::DomainId;
use crate::gateware::graph::{FrozenGraph, SyncKind};
use log::trace;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relationship {
    Asynchronous,
    FalsePath,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Asynchronous => write!(f, "asynchronous"),
            Relationship::FalsePath => write!(f, "false_path"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockRelation {
    pub domain_a: DomainId,
    pub domain_b: DomainId,
    pub clock_a: String,
    pub clock_b: String,
    pub relationship: Relationship,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PeriodConstraint {
    pub clock: String,
    pub period_ns: f64,
    pub frequency_hz: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintSet {
    relations: Vec<ClockRelation>,
    periods: Vec<PeriodConstraint>,
}

impl ConstraintSet {
    pub fn emit(graph: &FrozenGraph) -> Self {
        let mut pairs: BTreeMap<(DomainId, DomainId), Relationship> = BTreeMap::new();
        for sync in graph.synchronizers() {
            let key = if sync.source < sync.destination {
                (sync.source, sync.destination)
            } else {
                (sync.destination, sync.source)
            };
            let relationship = match sync.kind {
                SyncKind::Quasistatic => Relationship::FalsePath,
                _ => Relationship::Asynchronous,
            };
            pairs
                .entry(key)
                .and_modify(|r| {
                    if relationship == Relationship::Asynchronous {
                        *r = Relationship::Asynchronous;
                    }
                })
                .or_insert(relationship);
        }
        let clock = |id: DomainId| {
            graph
                .domain(id)
                .map(|d| d.clock_signal.clone())
                .unwrap_or_else(|_| id.to_string())
        };
        let relations = pairs
            .into_iter()
            .map(|((a, b), relationship)| {
                trace!("{} {} {relationship}", clock(a), clock(b));
                ClockRelation {
                    domain_a: a,
                    domain_b: b,
                    clock_a: clock(a),
                    clock_b: clock(b),
                    relationship,
                }
            })
            .collect();
        let periods = graph
            .domains()
            .iter()
            .map(|d| PeriodConstraint {
                clock: d.clock_signal.clone(),
                period_ns: d.period_ns(),
                frequency_hz: d.nominal_frequency_hz,
            })
            .collect();
        ConstraintSet { relations, periods }
    }

    pub fn relations(&self) -> &[ClockRelation] {
        &self.relations
    }

    pub fn periods(&self) -> &[PeriodConstraint] {
        &self.periods
    }

    pub fn relation(&self, a: DomainId, b: DomainId) -> Option<&ClockRelation> {
        self.relations.iter().find(|r| {
            (r.domain_a == a && r.domain_b == b) || (r.domain_a == b && r.domain_b == a)
        })
    }

    /// `(clock_a, clock_b, relationship)` in declaration order.
    pub fn to_triples(&self) -> Vec<(String, String, String)> {
        self.relations
            .iter()
            .map(|r| {
                (
                    r.clock_a.clone(),
                    r.clock_b.clone(),
                    r.relationship.to_string(),
                )
            })
            .collect()
    }

    /// `(clock, frequency_hz)` for every domain.
    pub fn frequency_table(&self) -> Vec<(String, u64)> {
        self.periods
            .iter()
            .map(|p| (p.clock.clone(), p.frequency_hz))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        for p in &self.periods {
            let _ = writeln!(text, "period {} {:.3}", p.clock, p.period_ns);
        }
        for r in &self.relations {
            let _ = writeln!(text, "{} {} {}", r.clock_a, r.clock_b, r.relationship);
        }
        text
    }
}
