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

//! Auxiliary blocks present in every build.
//!
//! Each submodule offers a composition function adding the block's CSR bank (and clock
//! domain, where it has one) and a model implementing [`Block`](crate::model::Block).

pub mod ctrl;
pub mod dna;
pub mod icap;
pub mod jtagbone;
pub mod leds;
pub mod uptime;
pub mod xadc;

pub const IDENT: &str = "LiteX SoC on LiteX-M2SDR";
