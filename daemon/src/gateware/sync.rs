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

//! Cycle-level behaviour of the clock domain crossing primitives.
//!
//! Each primitive is advanced explicitly on the edges of the domains it spans. Callers
//! sample everything they need from the previous cycle before clocking, so that a
//! register never observes a value written on the same edge.

pub mod multireg;
pub mod pulse;
pub mod reset;

pub use multireg::MultiReg;
pub use pulse::PulseSynchronizer;
pub use reset::AsyncResetSynchronizer;
