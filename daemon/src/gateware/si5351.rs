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

//! SI5351 clock generator programming and its PWM control pin.
//!
//! The board clocks seen by the FPGA come from an SI5351. After every system reset the
//! gateware replays one of two register programs over I2C; the outputs only carry a valid
//! clock once the program has completed and `done` is raised.

use crate::error::SdrgwError;
use crate::gateware::csr::{CsrAccess, CsrMap};
use crate::gateware::domain::{DomainId, DomainSet};
use crate::model::{Block, Wires};
use log::debug;

pub const SI5351_I2C_ADDR: u8 = 0x60;

/// START, address, register, data and STOP, each byte followed by an ACK bit.
const I2C_BITS_PER_WRITE: u64 = 2 + 3 * 9;

/// Register 3 disables outputs, one bit per output.
const OUTPUT_ENABLE_CONTROL: u8 = 0x03;

pub const PWM_DEFAULT_ENABLE: u64 = 1;
pub const PWM_DEFAULT_WIDTH: u64 = 1024;
pub const PWM_DEFAULT_PERIOD: u64 = 2048;

/// 38.4 MHz on every output from the 38.4 MHz crystal.
pub const PROGRAM_38P4_XO: &[(u8, u8)] = &[
    (0x02, 0x33), (0x03, 0x00), (0x04, 0x10), (0x07, 0x01), (0x0f, 0x00), (0x10, 0x2f),
    (0x11, 0x2f), (0x12, 0x2f), (0x13, 0x2f), (0x14, 0x2f), (0x15, 0x2f), (0x16, 0x2f),
    (0x17, 0x2f), (0x22, 0x42), (0x23, 0x40), (0x24, 0x00), (0x25, 0x0e), (0x26, 0xe5),
    (0x27, 0xf5), (0x28, 0xbc), (0x29, 0xc0), (0x2a, 0x00), (0x2b, 0x01), (0x2c, 0x00),
    (0x2d, 0x09), (0x2e, 0x00), (0x2f, 0x00), (0x30, 0x00), (0x31, 0x00), (0x32, 0x00),
    (0x33, 0x01), (0x34, 0x00), (0x35, 0x09), (0x36, 0x00), (0x37, 0x00), (0x38, 0x00),
    (0x39, 0x00), (0x3a, 0x00), (0x3b, 0x01), (0x3c, 0x00), (0x3d, 0x09), (0x3e, 0x00),
    (0x3f, 0x00), (0x40, 0x00), (0x41, 0x00), (0x42, 0x00), (0x43, 0x01), (0x44, 0x00),
    (0x45, 0x09), (0x46, 0x00), (0x47, 0x00), (0x48, 0x00), (0x49, 0x00), (0x4a, 0x00),
    (0x4b, 0x01), (0x4c, 0x00), (0x4d, 0x09), (0x4e, 0x00), (0x4f, 0x00), (0x50, 0x00),
    (0x51, 0x00), (0x52, 0x00), (0x53, 0x01), (0x54, 0x00), (0x55, 0x09), (0x56, 0x00),
    (0x57, 0x00), (0x58, 0x00), (0x59, 0x00), (0x5a, 0x16), (0x5b, 0x16), (0x95, 0x00),
    (0x96, 0x00), (0x97, 0x00), (0x98, 0x00), (0x99, 0x00), (0x9a, 0x00), (0x9b, 0x00),
    (0xa2, 0xf2), (0xa3, 0xfd), (0xa4, 0x01), (0xa5, 0x00), (0xa6, 0x00), (0xa7, 0x00),
    (0xa8, 0x00), (0xa9, 0x00), (0xaa, 0x00), (0xb7, 0x12),
];

/// 38.4 MHz on every output locked to a 10 MHz reference on CLKIN.
pub const PROGRAM_38P4_CLKIN_10M: &[(u8, u8)] = &[
    (0x02, 0x4b), (0x03, 0x00), (0x04, 0x20), (0x07, 0x01), (0x0f, 0x04), (0x10, 0x0f),
    (0x11, 0x0f), (0x12, 0x0f), (0x13, 0x0f), (0x14, 0x0f), (0x15, 0x0f), (0x16, 0x0f),
    (0x17, 0x0f), (0x1a, 0x00), (0x1b, 0x19), (0x1c, 0x00), (0x1d, 0x28), (0x1e, 0x3d),
    (0x1f, 0x00), (0x20, 0x00), (0x21, 0x0b), (0x2a, 0x00), (0x2b, 0x01), (0x2c, 0x00),
    (0x2d, 0x09), (0x2e, 0x00), (0x2f, 0x00), (0x30, 0x00), (0x31, 0x00), (0x32, 0x00),
    (0x33, 0x01), (0x34, 0x00), (0x35, 0x09), (0x36, 0x00), (0x37, 0x00), (0x38, 0x00),
    (0x39, 0x00), (0x3a, 0x00), (0x3b, 0x01), (0x3c, 0x00), (0x3d, 0x09), (0x3e, 0x00),
    (0x3f, 0x00), (0x40, 0x00), (0x41, 0x00), (0x42, 0x00), (0x43, 0x01), (0x44, 0x00),
    (0x45, 0x09), (0x46, 0x00), (0x47, 0x00), (0x48, 0x00), (0x49, 0x00), (0x4a, 0x00),
    (0x4b, 0x01), (0x4c, 0x00), (0x4d, 0x09), (0x4e, 0x00), (0x4f, 0x00), (0x50, 0x00),
    (0x51, 0x00), (0x52, 0x00), (0x53, 0x01), (0x54, 0x00), (0x55, 0x09), (0x56, 0x00),
    (0x57, 0x00), (0x58, 0x00), (0x59, 0x00), (0x5a, 0x16), (0x5b, 0x16), (0x95, 0x00),
    (0x96, 0x00), (0x97, 0x00), (0x98, 0x00), (0x99, 0x00), (0x9a, 0x00), (0x9b, 0x00),
    (0xa2, 0x00), (0xa3, 0x00), (0xa4, 0x00), (0xa5, 0x00), (0xa6, 0x00), (0xa7, 0x00),
    (0xa8, 0x00), (0xa9, 0x00), (0xaa, 0x00), (0xb7, 0x12),
];

pub const SI5351_PROGRAMS: [&[(u8, u8)]; 2] = [PROGRAM_38P4_XO, PROGRAM_38P4_CLKIN_10M];

pub fn si5351(csr: &mut CsrMap) -> Result<(), SdrgwError> {
    csr.add_bank("si5351")?;
    csr.add_register("si5351", "program", 1, CsrAccess::ReadWrite, 0)?;
    csr.add_register("si5351", "start", 1, CsrAccess::Strobe, 0)?;
    csr.add_register("si5351", "done", 1, CsrAccess::ReadOnly, 0)?;
    csr.add_register("si5351", "writes", 8, CsrAccess::ReadOnly, 0)?;
    Ok(())
}

pub fn si5351_pwm(csr: &mut CsrMap) -> Result<(), SdrgwError> {
    csr.add_bank("si5351_pwm")?;
    csr.add_register("si5351_pwm", "enable", 1, CsrAccess::ReadWrite, PWM_DEFAULT_ENABLE)?;
    csr.add_register("si5351_pwm", "width", 32, CsrAccess::ReadWrite, PWM_DEFAULT_WIDTH)?;
    csr.add_register("si5351_pwm", "period", 32, CsrAccess::ReadWrite, PWM_DEFAULT_PERIOD)?;
    Ok(())
}

/// I2C sequencer replaying a register program into the device.
pub struct Si5351Model {
    sys: DomainId,
    cycles_per_write: u64,
    /// Measured clocks in SI5351 output order.
    outputs: Vec<DomainId>,
    program: usize,
    start: bool,
    busy: bool,
    countdown: u64,
    writes: usize,
    done: bool,
    device: [u8; 256],
}

impl Si5351Model {
    pub fn new(
        sys: DomainId,
        sys_clk_freq: u64,
        i2c_freq: u64,
        outputs: Vec<DomainId>,
    ) -> Result<Self, SdrgwError> {
        if i2c_freq == 0 || i2c_freq > sys_clk_freq {
            return Err(SdrgwError::Config(format!(
                "SI5351 I2C rate must be between 1 Hz and the system clock, got {i2c_freq} Hz"
            )));
        }
        Ok(Si5351Model {
            sys,
            cycles_per_write: I2C_BITS_PER_WRITE * (sys_clk_freq / i2c_freq),
            outputs,
            program: 0,
            start: true,
            busy: false,
            countdown: 0,
            writes: 0,
            done: false,
            // Outputs power up disabled.
            device: [0xff; 256],
        })
    }

    pub fn done(&self) -> bool {
        self.done
    }

    /// Value last written to a device register.
    pub fn device_register(&self, register: u8) -> u8 {
        self.device[register as usize]
    }
}

impl Block for Si5351Model {
    fn name(&self) -> &str {
        "si5351"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            self.program = 0;
            self.start = true;
            self.busy = false;
            self.done = false;
            return;
        }
        if self.start {
            self.start = false;
            self.busy = true;
            self.done = false;
            self.writes = 0;
            self.countdown = self.cycles_per_write;
            debug!("SI5351: running program {}", self.program);
        }
        if !self.busy {
            return;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return;
        }
        let program = SI5351_PROGRAMS[self.program];
        if let Some((register, value)) = program.get(self.writes) {
            self.device[*register as usize] = *value;
            self.writes += 1;
        }
        if self.writes >= program.len() {
            debug!("SI5351: program {} done after {} writes", self.program, self.writes);
            self.busy = false;
            self.done = true;
        } else {
            self.countdown = self.cycles_per_write;
        }
    }

    fn clock_enable_out(&self) -> DomainSet {
        if !self.done {
            return DomainSet::empty();
        }
        let disabled = self.device[OUTPUT_ENABLE_CONTROL as usize];
        self.outputs
            .iter()
            .enumerate()
            .filter(|(i, _)| disabled & (1 << (i % 8)) == 0)
            .map(|(_, d)| *d)
            .collect()
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "program" => self.program as u64,
            "done" => self.done as u64,
            "writes" => self.writes as u64,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "program" => self.program = (value as usize) % SI5351_PROGRAMS.len(),
            "start" => self.start = true,
            _ => {}
        }
    }
}

/// PWM driving the SI5351 input reference.
pub struct PwmModel {
    sys: DomainId,
    enable: u64,
    width: u64,
    period: u64,
    counter: u64,
    output: bool,
}

impl PwmModel {
    pub fn new(sys: DomainId) -> Self {
        PwmModel {
            sys,
            enable: PWM_DEFAULT_ENABLE,
            width: PWM_DEFAULT_WIDTH,
            period: PWM_DEFAULT_PERIOD,
            counter: 0,
            output: false,
        }
    }

    pub fn output(&self) -> bool {
        self.output
    }
}

impl Block for PwmModel {
    fn name(&self) -> &str {
        "si5351_pwm"
    }

    fn domains(&self) -> DomainSet {
        DomainSet::single(self.sys)
    }

    fn tick(&mut self, edges: DomainSet, wires: &Wires) {
        if !edges.contains(self.sys) {
            return;
        }
        if wires.resets.contains(self.sys) {
            self.enable = PWM_DEFAULT_ENABLE;
            self.width = PWM_DEFAULT_WIDTH;
            self.period = PWM_DEFAULT_PERIOD;
            self.counter = 0;
            self.output = false;
            return;
        }
        if self.enable == 0 {
            self.counter = 0;
            self.output = false;
            return;
        }
        self.output = self.counter < self.width;
        self.counter = if self.counter + 1 >= self.period {
            0
        } else {
            self.counter + 1
        };
    }

    fn csr_read(&self, register: &str) -> u64 {
        match register {
            "enable" => self.enable,
            "width" => self.width,
            "period" => self.period,
            _ => 0,
        }
    }

    fn csr_write(&mut self, register: &str, value: u64) {
        match register {
            "enable" => self.enable = value,
            "width" => self.width = value,
            "period" => self.period = value,
            _ => {}
        }
    }
}
