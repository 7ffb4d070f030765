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

//! 1000BASE-X over SFP carrying an Etherbone tunnel to the register bus.

use crate::config::SocConfig;
use crate::error::SdrgwError;
use crate::gateware::backends::{Backend, BackendMode, Composer};
use crate::gateware::csr::CsrAccess;
use crate::gateware::domain::{DomainId, DomainOrigin, DomainSet, ResetSource, Signal};
use crate::gateware::graph::SyncKind;
use crate::model::{Block, Wires};
use log::{debug, trace};
use sdrgw_macros::backend;
use std::net::Ipv4Addr;

pub const RX_POLARITY: u8 = 1;
pub const TX_POLARITY: u8 = 0;
pub const ETHERBONE_UDP_PORT: u16 = 1234;
pub const CDC_FIFO_DEPTH: u32 = 8;
/// 8b/10b on a 16-bit user interface.
pub const BITS_PER_USER_CYCLE: u64 = 20;
/// User clock cycles between reset release and a completed auto-negotiation.
pub const LINK_UP_CYCLES: u64 = 2048;
const QPLL_VCO_RANGE: (f64, f64) = (1.6e9, 3.3e9);

/// Quad PLL settings for the shared transceiver channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QpllSettings {
    pub refclk_hz: u64,
    pub refclksel: u8,
    pub fbdiv: u32,
    pub fbdiv_45: u32,
    pub refclk_div: u32,
    /// Output divider of the transceiver channel.
    pub rate_div: u32,
}

impl QpllSettings {
    pub fn gigabit(refclk_hz: u64) -> Self {
        QpllSettings {
            refclk_hz,
            refclksel: 0b111,
            fbdiv: 4,
            fbdiv_45: 4,
            refclk_div: 1,
            rate_div: 4,
        }
    }

    pub fn vco_hz(&self) -> f64 {
        self.refclk_hz as f64 * (self.fbdiv * self.fbdiv_45) as f64 / self.refclk_div as f64
    }

    pub fn linerate(&self) -> f64 {
        self.vco_hz() * 2.0 / self.rate_div as f64
    }

    pub fn user_clk_hz(&self) -> u64 {
        (self.linerate() / BITS_PER_USER_CYCLE as f64).round() as u64
    }

    pub fn check(&self) -> Result<(), SdrgwError> {
        let vco = self.vco_hz();
        if vco < QPLL_VCO_RANGE.0 || vco > QPLL_VCO_RANGE.1 {
            return Err(SdrgwError::Pll(format!(
                "Transceiver PLL VCO at {:.3} GHz is outside {:.1}-{:.1} GHz",
                vco / 1e9,
                QPLL_VCO_RANGE.0 / 1e9,
                QPLL_VCO_RANGE.1 / 1e9
            )));
        }
        Ok(())
    }
}

#[backend(name = "ethernet")]
#[derive(Debug, Clone)]
pub struct EthernetBackend {
    sfp: u8,
    ip_address: Ipv4Addr,
    qpll: Option<QpllSettings>,
    domains: Option<(DomainId, DomainId, DomainId)>,
}

impl EthernetBackend {
    pub fn from_config(config: &SocConfig) -> Result<Self, SdrgwError> {
        if config.ethernet_sfp > 1 {
            return Err(SdrgwError::Config(format!(
                "The board has SFP cages 0 and 1, got {}",
                config.ethernet_sfp
            )));
        }
        let ip_address = config.etherbone_ip.parse::<Ipv4Addr>().map_err(|e| {
            SdrgwError::Config(format!(
                "Invalid Etherbone IP address {:?}: {e}",
                config.etherbone_ip
            ))
        })?;
        Ok(EthernetBackend {
            sfp: config.ethernet_sfp,
            ip_address,
            qpll: None,
            domains: None,
        })
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    pub fn qpll(&self) -> Option<&QpllSettings> {
        self.qpll.as_ref()
    }
}

impl Backend for EthernetBackend {
    fn name(&self) -> &'static str {
        Self::BACKEND_NAME
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Ethernet
    }

    fn elaborate(&mut self, composer: &mut Composer) -> Result<(), SdrgwError> {
        let eth_ref = composer
            .crg
            .eth_ref
            .ok_or_else(|| SdrgwError::MissingDomain("eth_ref".into()))?;
        let sys = composer.crg.sys;
        composer.transceiver_pll.claim(Self::BACKEND_NAME)?;
        let graph = &mut *composer.graph;
        let refclk_hz = graph.domain(eth_ref)?.nominal_frequency_hz;
        let qpll = QpllSettings::gigabit(refclk_hz);
        qpll.check()?;
        let user_clk = qpll.user_clk_hz();

        let mut phy_domain = |name: &str| -> Result<DomainId, SdrgwError> {
            let id = graph.add_domain(
                name,
                user_clk,
                DomainOrigin::Phy {
                    name: "ethphy".into(),
                },
            )?;
            graph.set_reset_source(
                id,
                ResetSource::Phy {
                    name: "ethphy".into(),
                },
            )?;
            Ok(id)
        };
        let eth_tx = phy_domain("eth_tx")?;
        let eth_rx = phy_domain("eth_rx")?;
        graph.add_synchronizer(
            "ethmac_rx_cdc",
            SyncKind::AsyncFifo {
                depth: CDC_FIFO_DEPTH,
            },
            &Signal::new("ethphy_source", 8, eth_rx),
            sys,
        )?;
        graph.add_synchronizer(
            "ethmac_tx_cdc",
            SyncKind::AsyncFifo {
                depth: CDC_FIFO_DEPTH,
            },
            &Signal::new("ethmac_sink", 8, sys),
            eth_tx,
        )?;

        let csr = &mut *composer.csr;
        csr.add_bank("ethphy")?;
        csr.add_register("ethphy", "sfp", 1, CsrAccess::ReadOnly, self.sfp as u64)?;
        csr.add_register("ethphy", "rx_polarity", 1, CsrAccess::ReadOnly, RX_POLARITY as u64)?;
        csr.add_register("ethphy", "tx_polarity", 1, CsrAccess::ReadOnly, TX_POLARITY as u64)?;
        csr.add_register("ethphy", "link_status", 1, CsrAccess::ReadOnly, 0)?;
        csr.add_register("ethphy", "restart", 1, CsrAccess::Strobe, 0)?;
        csr.add_bank("etherbone")?;
        let ip = u32::from(self.ip_address) as u64;
        csr.add_register("etherbone", "ip_address", 32, CsrAccess::ReadOnly, ip)?;
        csr.add_register("etherbone", "udp_port", 16, CsrAccess::ReadOnly, 0)?;
        trace!(
            "ethernet: sfp{} at {}, user clock {user_clk} Hz",
            self.sfp, self.ip_address
        );
        self.qpll = Some(qpll);
        self.domains = Some((eth_tx, eth_rx, sys));
        Ok(())
    }

    fn blocks(&self) -> Result<Vec<Box<dyn Block>>, SdrgwError> {
        let (eth_tx, eth_rx, sys) = self
            .domains
            .ok_or_else(|| SdrgwError::Internal("ethernet backend was not elaborated".into()))?;
        Ok(vec![Box::new(EthernetModel::new(self, eth_tx, eth_rx, sys))])
    }

    fn properties(&self) -> Vec<(String, String)> {
        let mut properties = vec![
            ("sfp".to_string(), self.sfp.to_string()),
            ("etherbone_ip".to_string(), self.ip_address.to_string()),
            ("rx_polarity".to_string(), RX_POLARITY.to_string()),
            ("tx_polarity".to_string(), TX_POLARITY.to_string()),
        ];
        if let Some(qpll) = &self.qpll {
            properties.push(("qpll_refclksel".to_string(), format!("0b{:03b}", qpll.refclksel)));
            properties.push(("qpll_fbdiv".to_string(), qpll.fbdiv.to_string()));
            properties.push(("qpll_fbdiv_45".to_string(), qpll.fbdiv_45.to_string()));
            properties.push(("qpll_refclk_div".to_string(), qpll.refclk_div.to_string()));
            properties.push(("linerate".to_string(), format!("{:.3e}", qpll.linerate())));
        }
        properties
    }
}

pub struct EthernetModel {
    eth_tx: DomainId,
    eth_rx: DomainId,
    sys: DomainId,
    sfp: u8,
    ip_address: u32,
    negotiation: u64,
    link_up: bool,
    restart: bool,
}

impl EthernetModel {
    fn new(backend: &EthernetBackend, eth_tx: DomainId, eth_rx: DomainId, sys: DomainId) -> Self {
        EthernetModel {
            eth_tx,
            eth_rx,
            sys,
            sfp: backend.sfp,
            ip_address: u32::from(backend.ip_address),
            negotiation: 0,
            link_up: false,
            restart: false,
        }
    }
}

impl Block for EthernetModel {
    fn name(&self) -> &str {
        "ethernet"
    }

    fn serves(&self, bank: &str) -> bool {
        matches!(bank, "ethphy" | "etherbone")
    }

    fn domains(&self) -> DomainSet {
        [self.eth_tx, self.eth_rx, self.sys].into_iter().collect()
    }

    fn tick(&mut self, edges: DomainSet, _wires: &Wires) {
        if edges.contains(self.sys) && std::mem::take(&mut self.restart) {
            debug!("ethphy: restarting auto-negotiation");
            self.negotiation = 0;
            self.link_up = false;
        }
        if edges.contains(self.eth_rx) && !self.link_up {
            self.negotiation += 1;
            if self.negotiation >= LINK_UP_CYCLES {
                debug!("ethphy: link up on sfp{}", self.sfp);
                self.link_up = true;
            }
        }
    }

    fn reset_out(&self) -> DomainSet {
        if self.link_up {
            DomainSet::empty()
        } else {
            DomainSet::single(self.eth_tx)
        }
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "sfp" => self.sfp as u64,
            "rx_polarity" => RX_POLARITY as u64,
            "tx_polarity" => TX_POLARITY as u64,
            "link_status" => self.link_up as u64,
            "ip_address" => self.ip_address as u64,
            "udp_port" => ETHERBONE_UDP_PORT as u64,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, _value: u64) {
        if register == "restart" {
            self.restart = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateware::crg::ETH_REF_FREQ;
    use googletest::prelude::*;

    fn config() -> SocConfig {
        SocConfig {
            with_pcie: false,
            with_ethernet: true,
            ..SocConfig::default()
        }
    }

    #[gtest]
    fn gigabit_qpll_gives_a_62_5_mhz_user_clock() {
        let qpll = QpllSettings::gigabit(ETH_REF_FREQ);
        expect_that!(qpll.vco_hz(), approx_eq(2.5e9));
        expect_that!(qpll.linerate(), approx_eq(1.25e9));
        expect_that!(qpll.user_clk_hz(), eq(62_500_000));
        expect_that!(QpllSettings::check(&qpll), ok(anything()));
    }

    #[gtest]
    fn sfp_index_is_bounded() {
        let result = EthernetBackend::from_config(&SocConfig {
            ethernet_sfp: 2,
            ..config()
        });
        assert_that!(&result, err(displays_as(contains_substring("SFP cages"))));
    }

    #[gtest]
    fn ip_address_must_parse() {
        let result = EthernetBackend::from_config(&SocConfig {
            etherbone_ip: "192.168.1".into(),
            ..config()
        });
        assert_that!(
            &result,
            err(displays_as(contains_substring("Invalid Etherbone IP")))
        );
        let backend = EthernetBackend::from_config(&config()).unwrap();
        expect_that!(backend.ip_address(), eq(Ipv4Addr::new(192, 168, 1, 50)));
    }

    #[gtest]
    fn restart_drops_the_link() {
        let backend = EthernetBackend::from_config(&config()).unwrap();
        let mut model = EthernetModel::new(&backend, DomainId(1), DomainId(2), DomainId(0));
        let all = model.domains();
        for _ in 0..LINK_UP_CYCLES {
            model.tick(all, &Wires::default());
        }
        expect_that!(model.csr_read("link_status"), eq(1));
        model.csr_write("restart", 1);
        model.tick(DomainSet::single(DomainId(0)), &Wires::default());
        expect_that!(model.csr_read("link_status"), eq(0));
        expect_that!(model.reset_out().contains(DomainId(1)), eq(true));
    }
}
