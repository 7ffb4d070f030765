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

//! Gateware composition and cycle-level model for an FPGA SDR carrier board.
//!
//! The library composes the board SoC from a [`config::SocConfig`]: clock domains and
//! their crossings, the PLL configuration, the register map and the timing constraints
//! derived from them ([`gateware`]). The composed SoC can be instantiated as a
//! [`model::SocModel`] that evaluates every block on the exact edges of its clocks. The
//! `sdrgwd` binary serves such a model over DBus ([`comm`]).

pub mod comm;
pub mod config;
pub mod error;
pub mod gateware;
pub mod model;
pub mod system_io;
