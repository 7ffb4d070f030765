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
use sdrgw::gateware::backends::{
    Backend, BackendMode, Composer, TransceiverPll, register_backends, select_backend,
};
use sdrgw::gateware::backends::ethernet::EthernetBackend;
use sdrgw::gateware::backends::pcie::PcieBackend;
use sdrgw::gateware::crg::crg;
use sdrgw::gateware::csr::CsrMap;
use sdrgw::gateware::graph::DomainGraph;

#[gtest]
fn both_backends_fail_before_composition() {
    let result = compose_with(&SocConfig {
        with_pcie: true,
        with_ethernet: true,
        ..SocConfig::default()
    });
    assert_that!(
        result.map(|soc| soc.ident),
        err(displays_as(contains_substring(
            "requested: [\"pcie\", \"ethernet\"]"
        )))
    );
}

#[gtest]
#[rstest]
#[case::pcie(true, false, BackendMode::Pcie)]
#[case::ethernet(false, true, BackendMode::Ethernet)]
#[case::none(false, false, BackendMode::None)]
fn mode_follows_configuration(
    #[case] with_pcie: bool,
    #[case] with_ethernet: bool,
    #[case] mode: BackendMode,
) {
    let soc = compose_with(&SocConfig {
        with_pcie,
        with_ethernet,
        ..SocConfig::default()
    })
    .unwrap();
    assert_that!(soc.backend_mode(), eq(mode));
}

#[gtest]
#[rstest]
#[case::lanes(SocConfig { pcie_lanes: 2, ..SocConfig::default() }, "SdrgwError::LaneConfig")]
#[case::depth(SocConfig { dma_buffering_depth: 1000, ..SocConfig::default() }, "SdrgwError::DmaConfig")]
#[case::sfp(SocConfig { with_pcie: false, with_ethernet: true, ethernet_sfp: 3, ..SocConfig::default() }, "SdrgwError::Config")]
fn invalid_backend_parameters_are_rejected(#[case] config: SocConfig, #[case] message: &str) {
    register_backends();
    assert_that!(
        select_backend(&config).map(|b| b.map(|b| b.name())),
        err(displays_as(contains_substring(message)))
    );
}

#[gtest]
fn four_lanes_widen_the_datapath() {
    let soc = compose_with(&SocConfig {
        pcie_lanes: 4,
        ..SocConfig::default()
    })
    .unwrap();
    let properties = soc.backend.as_ref().unwrap().properties();
    expect_that!(
        properties.contains(&("data_width".to_string(), "128".to_string())),
        eq(true)
    );
    expect_that!(
        properties.contains(&("bar0_size".to_string(), "0x20000".to_string())),
        eq(true)
    );
}

#[gtest]
fn transceiver_pll_cannot_serve_two_backends() {
    let config = SocConfig {
        with_ethernet: true,
        ..SocConfig::default()
    };
    let mut graph = DomainGraph::new();
    let crg = crg(&mut graph, 125_000_000, -3, true).unwrap();
    let mut csr = CsrMap::new(crg.sys);
    let mut transceiver_pll = TransceiverPll::default();
    let mut composer = Composer {
        graph: &mut graph,
        csr: &mut csr,
        crg: &crg,
        transceiver_pll: &mut transceiver_pll,
    };
    let mut pcie = PcieBackend::from_config(&config).unwrap();
    let mut ethernet = EthernetBackend::from_config(&config).unwrap();
    pcie.elaborate(&mut composer).unwrap();
    assert_that!(
        ethernet.elaborate(&mut composer),
        err(displays_as(contains_substring(
            "transceiver_pll is owned by pcie, cannot be allocated to ethernet"
        )))
    );
}

#[gtest]
fn ethernet_needs_the_reference_clock() {
    let config = SocConfig {
        with_pcie: false,
        with_ethernet: true,
        ..SocConfig::default()
    };
    let mut graph = DomainGraph::new();
    let crg = crg(&mut graph, 125_000_000, -3, false).unwrap();
    let mut csr = CsrMap::new(crg.sys);
    let mut transceiver_pll = TransceiverPll::default();
    let mut composer = Composer {
        graph: &mut graph,
        csr: &mut csr,
        crg: &crg,
        transceiver_pll: &mut transceiver_pll,
    };
    let mut ethernet = EthernetBackend::from_config(&config).unwrap();
    assert_that!(
        ethernet.elaborate(&mut composer),
        err(displays_as(contains_substring("eth_ref is not declared")))
    );
    expect_that!(transceiver_pll.owner().is_none(), eq(true));
}

#[gtest]
fn ethernet_registers_expose_board_constants() {
    let config = SocConfig {
        with_pcie: false,
        with_ethernet: true,
        ethernet_sfp: 1,
        etherbone_ip: "10.0.0.2".into(),
        ..quick_config()
    };
    let (_, model) = instantiate(&config);
    expect_that!(model.read_by_name("ethphy_rx_polarity").unwrap(), eq(1));
    expect_that!(model.read_by_name("ethphy_tx_polarity").unwrap(), eq(0));
    expect_that!(model.read_by_name("ethphy_sfp").unwrap(), eq(1));
    expect_that!(model.read_by_name("etherbone_ip_address").unwrap(), eq(0x0a00_0002));
    expect_that!(model.read_by_name("etherbone_udp_port").unwrap(), eq(1234));
}

#[gtest]
fn pcie_link_comes_up_and_releases_its_domain() {
    let (_, mut model) = instantiate(&quick_config());
    let pcie = model.graph().lookup("pcie").unwrap();
    expect_that!(model.reset_asserted(pcie), eq(true));
    expect_that!(model.read_by_name("pcie_phy_link_status").unwrap(), eq(0));
    model.run_cycles(pcie, 1_100).unwrap();
    expect_that!(model.read_by_name("pcie_phy_link_status").unwrap(), eq(1));
    expect_that!(model.reset_asserted(pcie), eq(false));
    expect_that!(model.read_by_name("pcie_dma0_buffering_depth").unwrap(), eq(8192));
}
