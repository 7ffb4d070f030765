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

use crate::common::test_functions::*;
use googletest::prelude::*;
use rstest::*;
use sdrgw::config::SocConfig;
use sdrgw::gateware::constraints::Relationship;
use sdrgw::gateware::graph::SyncKind;
use std::collections::HashSet;

fn ethernet() -> SocConfig {
    SocConfig {
        with_pcie: false,
        with_ethernet: true,
        ..SocConfig::default()
    }
}

fn no_backend() -> SocConfig {
    SocConfig {
        with_pcie: false,
        ..SocConfig::default()
    }
}

#[gtest]
#[rstest]
#[case::pcie(SocConfig::default())]
#[case::ethernet(ethernet())]
#[case::no_backend(no_backend())]
fn every_crossed_pair_is_declared_exactly_once(#[case] config: SocConfig) {
    let soc = compose_with(&config).unwrap();
    let mut pairs = HashSet::new();
    for relation in soc.constraints.relations() {
        let key = (relation.domain_a, relation.domain_b);
        expect_that!(pairs.insert(key), eq(true));
        expect_that!(relation.domain_a < relation.domain_b, eq(true));
    }
    for sync in soc.graph.synchronizers() {
        let relation = soc.constraints.relation(sync.source, sync.destination);
        expect_that!(relation.is_some(), eq(true));
    }
    let crossed: HashSet<_> = soc
        .graph
        .synchronizers()
        .iter()
        .map(|s| (s.source.min(s.destination), s.source.max(s.destination)))
        .collect();
    assert_that!(pairs.len(), eq(crossed.len()));
}

#[gtest]
fn measurement_domains_are_asynchronous_to_sys() {
    let soc = compose_with(&SocConfig::default()).unwrap();
    for measurement in &soc.measurements {
        let relation = soc
            .constraints
            .relation(soc.crg.sys, measurement.counter_domain)
            .unwrap();
        expect_that!(relation.relationship, eq(Relationship::Asynchronous));
    }
}

#[gtest]
#[rstest]
#[case::dna("dna")]
#[case::icap("icap")]
#[case::jtag("jtag")]
fn quasistatic_peripherals_are_false_paths(#[case] domain: &str) {
    let soc = compose_with(&SocConfig::default()).unwrap();
    let id = soc.graph.lookup(domain).unwrap();
    let relation = soc.constraints.relation(soc.crg.sys, id).unwrap();
    expect_that!(relation.relationship, eq(Relationship::FalsePath));
    let kinds: Vec<&str> = soc
        .graph
        .synchronizers()
        .iter()
        .filter(|s| s.source == id || s.destination == id)
        .map(|s| s.kind.label())
        .collect();
    expect_that!(kinds.iter().all(|k| *k == SyncKind::Quasistatic.label()), eq(true));
}

#[gtest]
fn pll_siblings_without_a_crossing_are_not_constrained() {
    let soc = compose_with(&SocConfig::default()).unwrap();
    expect_that!(
        soc.constraints.relation(soc.crg.sys, soc.crg.idelay).is_none(),
        eq(true)
    );
}

#[gtest]
fn ethernet_phy_domains_cross_through_fifos() {
    let soc = compose_with(&ethernet()).unwrap();
    let triples = soc.constraints.to_triples();
    for clock in ["eth_rx_clk", "eth_tx_clk"] {
        let found = triples
            .iter()
            .any(|(a, b, r)| a == "sys_clk" && b == clock && r == "asynchronous");
        expect_that!(found, eq(true));
    }
    expect_that!(soc.graph.lookup("pcie").is_err(), eq(true));
    expect_that!(soc.graph.lookup("eth_ref").is_ok(), eq(true));
}

#[gtest]
fn constraints_are_deterministic() {
    let first = compose_with(&SocConfig::default()).unwrap();
    let second = compose_with(&SocConfig::default()).unwrap();
    assert_eq!(first.constraints.to_triples(), second.constraints.to_triples());
    assert_eq!(
        first.constraints.frequency_table(),
        second.constraints.frequency_table()
    );
}

#[gtest]
fn every_domain_has_a_period() {
    let soc = compose_with(&SocConfig::default()).unwrap();
    let table = soc.constraints.frequency_table();
    expect_that!(table.len(), eq(soc.graph.domains().len()));
    assert_eq!(table[0], ("sys_clk".to_string(), 125_000_000));
    assert_eq!(table[1], ("idelay_clk".to_string(), 200_000_000));
}
