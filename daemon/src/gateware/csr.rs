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

//! Register bus map.
//!
//! Every block with software visible state gets one bank of [`CSR_BANK_SIZE`] bytes, in
//! the order blocks are added. Inside a bank registers are packed on 32-bit words; a
//! register wider than the bus data width takes several consecutive words and is addressed
//! by its first one.

use crate::error::SdrgwError;
use crate::gateware::domain::{DomainId, Signal};
use log::trace;
use std::fmt::Write;

pub const CSR_BANK_SIZE: u32 = 0x800;
pub const CSR_DATA_WIDTH: u8 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrAccess {
    /// Storage written by software, read back as written.
    ReadWrite,
    /// Status driven by gateware.
    ReadOnly,
    /// A write raises a single cycle pulse in the bus domain. Reads return 0.
    Strobe,
}

impl CsrAccess {
    pub fn mode(self) -> &'static str {
        match self {
            CsrAccess::ReadOnly => "ro",
            CsrAccess::ReadWrite | CsrAccess::Strobe => "rw",
        }
    }

    pub fn writable(self) -> bool {
        self != CsrAccess::ReadOnly
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CsrRegister {
    /// `<bank>_<register>`.
    pub name: String,
    pub bank: String,
    pub register: String,
    pub address: u32,
    pub width: u8,
    pub access: CsrAccess,
    pub reset: u64,
}

impl CsrRegister {
    pub fn words(&self) -> u32 {
        (self.width as u32).div_ceil(CSR_DATA_WIDTH as u32).max(1)
    }

    pub fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CsrBank {
    pub name: String,
    pub base: u32,
    next_offset: u32,
}

#[derive(Clone, Debug)]
pub struct CsrMap {
    bus_domain: DomainId,
    banks: Vec<CsrBank>,
    registers: Vec<CsrRegister>,
}

impl CsrMap {
    pub fn new(bus_domain: DomainId) -> Self {
        CsrMap {
            bus_domain,
            banks: Vec::new(),
            registers: Vec::new(),
        }
    }

    pub fn bus_domain(&self) -> DomainId {
        self.bus_domain
    }

    pub fn add_bank(&mut self, name: &str) -> Result<u32, SdrgwError> {
        if self.banks.iter().any(|b| b.name == name) {
            return Err(SdrgwError::Register(format!(
                "CSR bank {name} is already allocated"
            )));
        }
        let base = self.banks.len() as u32 * CSR_BANK_SIZE;
        trace!("Allocating CSR bank {name} at 0x{base:08x}");
        self.banks.push(CsrBank {
            name: name.into(),
            base,
            next_offset: 0,
        });
        Ok(base)
    }

    /// Add a register to an existing bank and return the signal it drives or samples in
    /// the bus domain.
    pub fn add_register(
        &mut self,
        bank: &str,
        register: &str,
        width: u8,
        access: CsrAccess,
        reset: u64,
    ) -> Result<Signal, SdrgwError> {
        if width == 0 || width > 64 {
            return Err(SdrgwError::Register(format!(
                "{bank}_{register}: width must be 1..=64, got {width}"
            )));
        }
        let name = format!("{bank}_{register}");
        if self.registers.iter().any(|r| r.name == name) {
            return Err(SdrgwError::Register(format!(
                "CSR register {name} is already allocated"
            )));
        }
        let csr_bank = self
            .banks
            .iter_mut()
            .find(|b| b.name == bank)
            .ok_or_else(|| SdrgwError::Register(format!("CSR bank {bank} does not exist")))?;
        let mut csr = CsrRegister {
            name: name.clone(),
            bank: bank.into(),
            register: register.into(),
            address: 0,
            width,
            access,
            reset,
        };
        let size = csr.words() * (CSR_DATA_WIDTH as u32 / 8);
        if csr_bank.next_offset + size > CSR_BANK_SIZE {
            return Err(SdrgwError::Register(format!(
                "CSR bank {bank} is full, cannot add {register}"
            )));
        }
        csr.address = csr_bank.base + csr_bank.next_offset;
        csr_bank.next_offset += size;
        trace!(
            "CSR {name} at 0x{:08x}, {} word(s), {}",
            csr.address,
            csr.words(),
            access.mode()
        );
        self.registers.push(csr);
        Ok(Signal::new(name, width, self.bus_domain))
    }

    pub fn banks(&self) -> &[CsrBank] {
        &self.banks
    }

    pub fn registers(&self) -> &[CsrRegister] {
        &self.registers
    }

    pub fn index_of_address(&self, address: u32) -> Result<usize, SdrgwError> {
        self.registers
            .iter()
            .position(|r| r.address == address)
            .ok_or_else(|| SdrgwError::Register(format!("No register at address 0x{address:08x}")))
    }

    pub fn index_of_name(&self, name: &str) -> Result<usize, SdrgwError> {
        self.registers
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| SdrgwError::Register(format!("No register named {name}")))
    }

    pub fn lookup_address(&self, address: u32) -> Result<&CsrRegister, SdrgwError> {
        Ok(&self.registers[self.index_of_address(address)?])
    }

    pub fn lookup_name(&self, name: &str) -> Result<&CsrRegister, SdrgwError> {
        Ok(&self.registers[self.index_of_name(name)?])
    }

    /// Register map in the csr.csv layout consumed by host software.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        for bank in &self.banks {
            let _ = writeln!(csv, "csr_base,{},0x{:08x},,", bank.name, bank.base);
        }
        for csr in &self.registers {
            let _ = writeln!(
                csv,
                "csr_register,{},0x{:08x},{},{}",
                csr.name,
                csr.address,
                csr.words(),
                csr.access.mode()
            );
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    fn map() -> CsrMap {
        let mut map = CsrMap::new(DomainId(0));
        map.add_bank("ctrl").unwrap();
        map.add_register("ctrl", "reset", 1, CsrAccess::Strobe, 0)
            .unwrap();
        map.add_register("ctrl", "scratch", 32, CsrAccess::ReadWrite, 0x1234_5678)
            .unwrap();
        map.add_bank("uptime").unwrap();
        map.add_register("uptime", "latch", 1, CsrAccess::Strobe, 0)
            .unwrap();
        map.add_register("uptime", "cycles", 64, CsrAccess::ReadOnly, 0)
            .unwrap();
        map
    }

    #[gtest]
    fn registers_are_packed_per_bank() {
        let map = map();
        expect_that!(map.lookup_name("ctrl_scratch").unwrap().address, eq(0x4));
        expect_that!(map.lookup_name("uptime_latch").unwrap().address, eq(0x800));
        expect_that!(map.lookup_name("uptime_cycles").unwrap().address, eq(0x804));
        expect_that!(map.lookup_name("uptime_cycles").unwrap().words(), eq(2));
    }

    #[gtest]
    fn unknown_address_is_an_error() {
        let map = map();
        assert_that!(
            map.lookup_address(0x808),
            err(displays_as(contains_substring("No register at address 0x00000808")))
        );
    }

    #[gtest]
    fn register_in_missing_bank_is_rejected() {
        let mut map = map();
        let result = map.add_register("leds", "out", 4, CsrAccess::ReadWrite, 0);
        assert_that!(
            &result,
            err(displays_as(contains_substring("bank leds does not exist")))
        );
    }

    #[gtest]
    fn csv_lists_banks_then_registers() {
        let csv = map().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "csr_base,ctrl,0x00000000,,",
                "csr_base,uptime,0x00000800,,",
                "csr_register,ctrl_reset,0x00000000,1,rw",
                "csr_register,ctrl_scratch,0x00000004,1,rw",
                "csr_register,uptime_latch,0x00000800,1,rw",
                "csr_register,uptime_cycles,0x00000804,2,ro",
            ]
        );
    }
}
