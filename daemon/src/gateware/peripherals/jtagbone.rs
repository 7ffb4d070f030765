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

use crate::error::SdrgwError;
use crate::gateware::domain::{DomainId, DomainOrigin, ResetSource, Signal};
use crate::gateware::graph::{DomainGraph, SyncKind};

pub const JTAG_CLK_FREQ: u64 = 20_000_000;

/// JTAG bridge to the register bus. The TAP clock is driven by the cable and only reaches
/// the bus through the bridge's handshake, so the crossing is quasi-static.
pub fn jtagbone(graph: &mut DomainGraph, sys: DomainId) -> Result<DomainId, SdrgwError> {
    let jtag = graph.add_domain(
        "jtag",
        JTAG_CLK_FREQ,
        DomainOrigin::Phy {
            name: "bscane2".into(),
        },
    )?;
    graph.set_reset_source(
        jtag,
        ResetSource::Phy {
            name: "bscane2".into(),
        },
    )?;
    graph.add_synchronizer(
        "jtagbone_bridge",
        SyncKind::Quasistatic,
        &Signal::new("jtag_shift", 32, jtag),
        sys,
    )?;
    Ok(jtag)
}
