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
use crate::gateware::sync::MultiReg;

/// Transfers single-cycle events from one domain to another.
///
/// A pulse in the source domain flips a toggle register. The toggle level is brought into
/// the destination through a two stage [`MultiReg`], and every change of the synchronized
/// level is reported as one single-cycle pulse.
///
/// A source pulse arriving before the destination has sampled the previous flip is merged
/// into it instead of flipping the toggle back. Pulses the destination cannot tell apart
/// therefore coalesce into one, and a burst always yields at least one output pulse.
#[derive(Debug, Clone)]
pub struct PulseSynchronizer {
    toggle_i: bool,
    /// The last flip has not been sampled by a destination edge yet.
    pending: bool,
    sync: MultiReg,
    toggle_o_r: bool,
    coalesced: u64,
}

impl PulseSynchronizer {
    pub fn new() -> Result<Self, SdrgwError> {
        Ok(PulseSynchronizer {
            toggle_i: false,
            pending: false,
            sync: MultiReg::new(1, 2)?,
            toggle_o_r: false,
            coalesced: 0,
        })
    }

    /// Whether the last flip is still waiting for a destination edge.
    pub fn busy(&self) -> bool {
        self.pending
    }

    /// Source pulses merged into a flip the destination had not sampled yet.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Advance on a simultaneous set of edges.
    ///
    /// `input` is the source pulse as driven during the cycle ending at this source edge.
    /// Both sides update from values sampled before either edge is applied.
    pub fn step(&mut self, src_edge: bool, dst_edge: bool, input: bool) {
        let toggle_i = self.toggle_i;
        let pending = self.pending && !dst_edge;
        if dst_edge {
            self.toggle_o_r = self.sync.output() != 0;
            self.sync.clock(toggle_i as u64);
        }
        self.pending = pending;
        if src_edge && input {
            if pending {
                self.coalesced += 1;
            } else {
                self.toggle_i = !toggle_i;
                self.pending = true;
            }
        }
    }

    /// The destination pulse, high for exactly one destination cycle per transferred event.
    pub fn output(&self) -> bool {
        (self.sync.output() != 0) != self.toggle_o_r
    }
}
