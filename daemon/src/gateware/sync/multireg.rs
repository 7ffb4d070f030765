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

/// Chain of registers carrying a multi-bit value into another domain.
///
/// Only safe for values that stay stable for at least as many destination cycles as there
/// are stages; the output then equals the input after `stages` destination edges.
#[derive(Debug, Clone)]
pub struct MultiReg {
    regs: Vec<u64>,
    mask: u64,
}

impl MultiReg {
    pub fn new(width: u8, stages: usize) -> Result<Self, SdrgwError> {
        if width == 0 || width > 64 {
            return Err(SdrgwError::Synchronizer(format!(
                "MultiReg width must be 1..=64, got {width}"
            )));
        }
        if stages < 2 {
            return Err(SdrgwError::Synchronizer(format!(
                "MultiReg needs at least two stages, got {stages}"
            )));
        }
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        Ok(MultiReg {
            regs: vec![0; stages],
            mask,
        })
    }

    /// One destination clock edge sampling `input`.
    pub fn clock(&mut self, input: u64) {
        self.regs.rotate_right(1);
        self.regs[0] = input & self.mask;
    }

    pub fn output(&self) -> u64 {
        self.regs.last().copied().unwrap_or(0)
    }

    pub fn stages(&self) -> usize {
        self.regs.len()
    }
}
