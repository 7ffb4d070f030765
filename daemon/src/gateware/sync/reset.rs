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

/// Asynchronous assert, synchronous deassert.
///
/// Asserting the source presets every stage immediately, regardless of the destination
/// clock. Release is only observed after the deasserted value has travelled through all
/// stages, one destination edge per stage.
#[derive(Debug, Clone)]
pub struct AsyncResetSynchronizer {
    stages: Vec<bool>,
    source: bool,
}

impl AsyncResetSynchronizer {
    /// A synchronizer that powers up asserted.
    pub fn new(stages: usize) -> Result<Self, SdrgwError> {
        if stages < 2 {
            return Err(SdrgwError::Synchronizer(format!(
                "Reset synchronizer needs at least two stages, got {stages}"
            )));
        }
        Ok(AsyncResetSynchronizer {
            stages: vec![true; stages],
            source: true,
        })
    }

    pub fn set_source(&mut self, asserted: bool) {
        self.source = asserted;
        if asserted {
            self.stages.fill(true);
        }
    }

    /// One destination clock edge.
    pub fn clock(&mut self) {
        self.stages.rotate_right(1);
        self.stages[0] = self.source;
    }

    /// The reset as seen by destination logic.
    pub fn asserted(&self) -> bool {
        self.source || self.stages.last().copied().unwrap_or(true)
    }
}
