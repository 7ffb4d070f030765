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

//! Gateware description of the carrier board SoC.
//!
//! Everything in this module is elaborated once: [`soc::compose`] builds a
//! [`graph::DomainGraph`] of clock domains and synchronizer crossings, validates it and
//! freezes it together with the register map and the constraint set. Nothing here changes
//! after composition. Block files also carry the models implementing
//! [`crate::model::Block`], which [`soc::Soc::instantiate`] collects into a
//! [`crate::model::SocModel`].
//!
//! # Layout
//!
//! - [`domain`] - clock domains, domain ids and domain-tagged signals
//! - [`graph`] - the domain graph and its validation
//! - [`sync`] - asynchronous reset synchronizer, pulse synchronizer, multi-bit register
//! - [`measurement`] - free-running counter + latch, built from the three primitives
//! - [`crg`] - PLL configuration search and the clock/reset generator
//! - [`si5351`] - external clock generator programming over I2C
//! - [`backends`] - PCIe/Ethernet communication backend registry and selector
//! - [`csr`] - register bus map
//! - [`peripherals`] - LED chaser, XADC, DNA, ICAP, JTAGBone, ctrl, uptime
//! - [`constraints`] - timing exceptions derived from the frozen graph
//! - [`soc`] - compose, validate, freeze

pub mod backends;
pub mod constraints;
pub mod crg;
pub mod csr;
pub mod domain;
pub mod graph;
pub mod measurement;
pub mod peripherals;
pub mod si5351;
pub mod soc;
pub mod sync;
