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

//! PCIe endpoint with DMA and MSI.

use crate::config::SocConfig;
use crate::error::SdrgwError;
use crate::gateware::backends::{Backend, BackendMode, Composer};
use crate::gateware::csr::CsrAccess;
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, ResetSource, Signal};
use crate::gateware::graph::SyncKind;
use crate::model::{Block, Wires};
use log::{debug, trace};
use sdrgw_macros::backend;

pub const PCIE_CLK_FREQ: u64 = 125_000_000;
pub const BAR0_SIZE: u32 = 0x20000;
pub const MAX_REQUEST_SIZE: u32 = 512;
pub const MAX_PAYLOAD_SIZE: u32 = 256;
pub const CDC_FIFO_DEPTH: u32 = 8;
pub const MSI_VECTORS: u32 = 32;
/// PCIe user clock cycles from reset release until the link reports up.
pub const LINK_TRAINING_CYCLES: u64 = 1024;

/// Data width of the PHY user interface for a lane count.
pub fn data_width(lanes: u8) -> Result<u32, SdrgwError> {
    match lanes {
        1 => Ok(64),
        4 => Ok(128),
        lanes => Err(SdrgwError::LaneConfig { lanes }),
    }
}

#[backend(name = "pcie")]
#[derive(Debug, Clone)]
pub struct PcieBackend {
    lanes: u8,
    data_width: u32,
    dma_buffering_depth: u32,
    domains: Option<(DomainId, DomainId)>,
}

impl PcieBackend {
    pub fn from_config(config: &SocConfig) -> Result<Self, SdrgwError> {
        let data_width = data_width(config.pcie_lanes)?;
        let depth = config.dma_buffering_depth;
        if !depth.is_power_of_two() || depth < MAX_REQUEST_SIZE {
            return Err(SdrgwError::DmaConfig(format!(
                "DMA buffering depth {depth} must be a power of two of at least {MAX_REQUEST_SIZE}"
            )));
        }
        Ok(PcieBackend {
            lanes: config.pcie_lanes,
            data_width,
            dma_buffering_depth: depth,
            domains: None,
        })
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }
}

impl Backend for PcieBackend {
    fn name(&self) -> &'static str {
        Self::BACKEND_NAME
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Pcie
    }

    fn elaborate(&mut self, composer: &mut Composer) -> Result<(), SdrgwError> {
        composer.transceiver_pll.claim(Self::BACKEND_NAME)?;
        let graph = &mut *composer.graph;
        let sys = composer.crg.sys;
        let pcie = graph.add_domain(
            "pcie",
            PCIE_CLK_FREQ,
            DomainOrigin::Phy {
                name: "pcie_phy".into(),
            },
        )?;
        graph.set_reset_source(
            pcie,
            ResetSource::Phy {
                name: "pcie_phy".into(),
            },
        )?;
        let width = self.data_width.min(64) as u8;
        graph.add_synchronizer(
            "pcie_phy_rx_cdc",
            SyncKind::AsyncFifo {
                depth: CDC_FIFO_DEPTH,
            },
            &Signal::new("pcie_phy_source", width, pcie),
            sys,
        )?;
        graph.add_synchronizer(
            "pcie_phy_tx_cdc",
            SyncKind::AsyncFifo {
                depth: CDC_FIFO_DEPTH,
            },
            &Signal::new("pcie_phy_sink", width, sys),
            pcie,
        )?;

        let csr = &mut *composer.csr;
        csr.add_bank("pcie_phy")?;
        csr.add_register("pcie_phy", "link_status", 1, CsrAccess::ReadOnly, 0)?;
        csr.add_register("pcie_phy", "lanes", 4, CsrAccess::ReadOnly, self.lanes as u64)?;
        let data_width = self.data_width as u64;
        csr.add_register("pcie_phy", "data_width", 8, CsrAccess::ReadOnly, data_width)?;
        csr.add_register("pcie_phy", "max_request_size", 16, CsrAccess::ReadOnly, 0)?;
        csr.add_register("pcie_phy", "max_payload_size", 16, CsrAccess::ReadOnly, 0)?;
        csr.add_bank("pcie_msi")?;
        csr.add_register("pcie_msi", "enable", 32, CsrAccess::ReadWrite, 0)?;
        csr.add_register("pcie_msi", "clear", 32, CsrAccess::Strobe, 0)?;
        csr.add_register("pcie_msi", "vector", 32, CsrAccess::ReadOnly, 0)?;
        csr.add_bank("pcie_dma0")?;
        csr.add_register("pcie_dma0", "loopback_enable", 1, CsrAccess::ReadWrite, 0)?;
        csr.add_register("pcie_dma0", "reader_enable", 1, CsrAccess::ReadWrite, 0)?;
        csr.add_register("pcie_dma0", "writer_enable", 1, CsrAccess::ReadWrite, 0)?;
        csr.add_register("pcie_dma0", "buffering_depth", 32, CsrAccess::ReadOnly, 0)?;
        csr.add_register("pcie_dma0", "loopback_words", 32, CsrAccess::ReadOnly, 0)?;
        trace!(
            "pcie: x{} lanes, {}-bit, DMA depth {}",
            self.lanes, self.data_width, self.dma_buffering_depth
        );
        self.domains = Some((pcie, sys));
        Ok(())
    }

    fn blocks(&self) -> Result<Vec<Box<dyn Block>>, SdrgwError> {
        let (pcie, sys) = self
            .domains
            .ok_or_else(|| SdrgwError::Internal("pcie backend was not elaborated".into()))?;
        Ok(vec![Box::new(PcieModel::new(self, pcie, sys))])
    }

    fn properties(&self) -> Vec<(String, String)> {
        vec![
            ("lanes".to_string(), self.lanes.to_string()),
            ("data_width".to_string(), self.data_width.to_string()),
            ("bar0_size".to_string(), format!("0x{BAR0_SIZE:x}")),
            (
                "dma_buffering_depth".to_string(),
                self.dma_buffering_depth.to_string(),
            ),
            ("msi_vectors".to_string(), MSI_VECTORS.to_string()),
        ]
    }
}

/// Link training, MSI and DMA loopback of the endpoint.
pub struct PcieModel {
    pcie: DomainId,
    sys: DomainId,
    lanes: u8,
    data_width: u32,
    dma_buffering_depth: u32,
    training: u64,
    link_up: bool,
    msi_enable: u64,
    msi_vector: u64,
    loopback_enable: bool,
    reader_enable: bool,
    writer_enable: bool,
    loopback_words: u64,
}

impl PcieModel {
    fn new(backend: &PcieBackend, pcie: DomainId, sys: DomainId) -> Self {
        PcieModel {
            pcie,
            sys,
            lanes: backend.lanes,
            data_width: backend.data_width,
            dma_buffering_depth: backend.dma_buffering_depth,
            training: 0,
            link_up: false,
            msi_enable: 0,
            msi_vector: 0,
            loopback_enable: false,
            reader_enable: false,
            writer_enable: false,
            loopback_words: 0,
        }
    }

    fn looping(&self) -> bool {
        self.link_up && self.loopback_enable && self.reader_enable && self.writer_enable
    }
}

impl Block for PcieModel {
    fn name(&self) -> &str {
        "pcie"
    }

    fn serves(&self, bank: &str) -> bool {
        matches!(bank, "pcie_phy" | "pcie_msi" | "pcie_dma0")
    }

    fn domains(&self) -> DomainSet {
        let mut set = DomainSet::single(self.pcie);
        set.insert(self.sys);
        set
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if edges.contains(self.sys) && wires.resets.contains(self.sys) {
            self.msi_enable = 0;
            self.msi_vector = 0;
            self.loopback_enable = false;
            self.reader_enable = false;
            self.writer_enable = false;
            self.loopback_words = 0;
        }
        if !edges.contains(self.pcie) {
            return;
        }
        if !self.link_up {
            self.training += 1;
            if self.training >= LINK_TRAINING_CYCLES {
                debug!("pcie: link up, x{}", self.lanes);
                self.link_up = true;
            }
            return;
        }
        if self.looping() {
            let before = self.loopback_words;
            self.loopback_words = (self.loopback_words + 1) & 0xffff_ffff;
            let words_per_buffer = (self.dma_buffering_depth / (self.data_width / 8)) as u64;
            if (before + 1) % words_per_buffer == 0 {
                // Writer vector.
                self.msi_vector |= 1 & self.msi_enable;
            }
        }
    }

    fn reset_out(&self) -> DomainSet {
        if self.link_up {
            DomainSet::empty()
        } else {
            DomainSet::single(self.pcie)
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "link_status" => self.link_up as u64,
            "lanes" => self.lanes as u64,
            "data_width" => self.data_width as u64,
            "max_request_size" => MAX_REQUEST_SIZE as u64,
            "max_payload_size" => MAX_PAYLOAD_SIZE as u64,
            "enable" => self.msi_enable,
            "vector" => self.msi_vector,
            "loopback_enable" => self.loopback_enable as u64,
            "reader_enable" => self.reader_enable as u64,
            "writer_enable" => self.writer_enable as u64,
            "buffering_depth" => self.dma_buffering_depth as u64,
            "loopback_words" => self.loopback_words,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "enable" => self.msi_enable = value,
            "clear" => self.msi_vector &= !value,
            "loopback_enable" => self.loopback_enable = value & 1 == 1,
            "reader_enable" => self.reader_enable = value & 1 == 1,
            "writer_enable" => self.writer_enable = value & 1 == 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    fn config(lanes: u8, depth: u32) -> SocConfig {
        SocConfig {
            pcie_lanes: lanes,
            dma_buffering_depth: depth,
            ..SocConfig::default()
        }
    }

    #[gtest]
    #[rstest]
    #[case::x1(1, 64)]
    #[case::x4(4, 128)]
    fn lanes_set_data_width(#[case] lanes: u8, #[case] width: u32) {
        let backend = PcieBackend::from_config(&config(lanes, 8192)).unwrap();
        assert_that!(backend.data_width(), eq(width));
    }

    #[gtest]
    #[rstest]
    #[case::two(2)]
    #[case::eight(8)]
    fn other_lane_counts_are_rejected(#[case] lanes: u8) {
        let result = PcieBackend::from_config(&config(lanes, 8192));
        assert_that!(
            &result,
            err(displays_as(contains_substring("SdrgwError::LaneConfig")))
        );
    }

    #[gtest]
    #[rstest]
    #[case::not_power_of_two(3000)]
    #[case::below_request_size(256)]
    fn dma_depth_is_validated(#[case] depth: u32) {
        let result = PcieBackend::from_config(&config(1, depth));
        assert_that!(
            &result,
            err(displays_as(contains_substring("SdrgwError::DmaConfig")))
        );
    }

    #[gtest]
    fn loopback_counts_words_once_link_is_up() {
        let backend = PcieBackend::from_config(&config(1, 8192)).unwrap();
        let mut model = PcieModel::new(&backend, DomainId(1), DomainId(0));
        let pcie = DomainSet::single(DomainId(1));
        let wires = Wires::default();
        for _ in 0..LINK_TRAINING_CYCLES {
            model.tick(pcie, &wires);
        }
        expect_that!(model.csr_read("link_status"), eq(1));
        expect_that!(model.reset_out().is_empty(), eq(true));
        for register in ["loopback_enable", "reader_enable", "writer_enable"] {
            model.csr_write(register, 1);
        }
        model.csr_write("enable", 1);
        for _ in 0..1024 {
            model.tick(pcie, &wires);
        }
        expect_that!(model.csr_read("loopback_words"), eq(1024));
        expect_that!(model.csr_read("vector"), eq(1));
        model.csr_write("clear", 1);
        expect_that!(model.csr_read("vector"), eq(0));
    }
}
