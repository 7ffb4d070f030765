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

use crate::common::test_functions::*;
use googletest::prelude::*;
use sdrgw::gateware::csr::CSR_BANK_SIZE;
use sdrgw::gateware::peripherals::ctrl::SCRATCH_RESET;
use sdrgw::gateware::peripherals::xadc::temperature_code;
use sdrgw::gateware::soc::write_artifacts;
use sdrgw::system_io::fs_read;

#[gtest]
fn banks_are_consecutive_with_ctrl_first() {
    let (_, model) = instantiate(&quick_config());
    let banks = model.csr().banks();
    expect_that!(banks[0].name.as_str(), eq("ctrl"));
    for (index, bank) in banks.iter().enumerate() {
        expect_that!(bank.base, eq(index as u32 * CSR_BANK_SIZE));
    }
}

#[gtest]
fn scratch_is_readable_by_address_and_name() {
    let (_, model) = instantiate(&quick_config());
    let address = model.register("ctrl_scratch").unwrap().address;
    expect_that!(address, eq(0x4));
    expect_that!(model.read(address).unwrap(), eq(SCRATCH_RESET));
    expect_that!(model.read_by_name("ctrl_scratch").unwrap(), eq(SCRATCH_RESET));
}

#[gtest]
fn read_only_registers_reject_writes() {
    let (_, mut model) = instantiate(&quick_config());
    assert_that!(
        model.write_by_name("si5351_clk0_value", 1),
        err(displays_as(contains_substring("is read-only")))
    );
}

#[gtest]
fn unknown_addresses_are_rejected() {
    let (_, model) = instantiate(&quick_config());
    assert_that!(
        model.read(0x00ff_fff0),
        err(displays_as(contains_substring("SdrgwError::Register")))
    );
}

#[gtest]
fn strobes_read_as_zero() {
    let (_, mut model) = instantiate(&quick_config());
    model.write_by_name("uptime_latch", 1).unwrap();
    expect_that!(model.read_by_name("uptime_latch").unwrap(), eq(0));
}

#[gtest]
fn writes_are_masked_to_the_register_width() {
    let (_, mut model) = instantiate(&quick_config());
    model.write_by_name("leds_out", 0xff).unwrap();
    expect_that!(model.read_by_name("leds_out").unwrap(), eq(0b11));
    expect_that!(model.read_by_name("leds_mode").unwrap(), eq(1));
}

#[gtest]
fn sensors_follow_configuration() {
    let mut config = quick_config();
    config.sensors.temperature_c = 60.0;
    config.sensors.dna_id = 0x0001_0203_0405_0607;
    let (_, mut model) = instantiate(&config);
    run_until_out_of_reset(&mut model);
    model.run_sys_cycles(200).unwrap();
    expect_that!(
        model.read_by_name("xadc_temperature").unwrap(),
        eq(temperature_code(60.0))
    );
    expect_that!(model.read_by_name("dna_id").unwrap(), eq(0x0001_0203_0405_0607));
}

#[gtest]
fn time_advances_exactly() {
    let (_, mut model) = instantiate(&quick_config());
    model.run_for_fs(8_000_000_000).unwrap();
    expect_that!(model.now_fs(), eq(8_000_000_000));
    // Edges at 0, 8 ns, ..., 8 us inclusive.
    expect_that!(model.cycles_by_name("sys").unwrap(), eq(1_001));
    expect_that!(model.cycles_by_name("si5351_clk0_counter").unwrap(), eq(308));
}

#[gtest]
fn stopped_sys_clock_cannot_be_advanced() {
    let (_, mut model) = instantiate(&quick_config());
    model.set_clock_running("sys", false).unwrap();
    assert_that!(
        model.run_sys_cycles(10),
        err(displays_as(contains_substring("not toggling")))
    );
}

#[gtest]
fn artifacts_are_written() {
    let (soc, _) = instantiate(&quick_config());
    let directory = std::env::temp_dir().join(format!("sdrgw-artifacts-{}", std::process::id()));
    write_artifacts(&soc.graph, &soc.csr, &directory).unwrap();
    let csv = fs_read(&directory.join("csr.csv")).unwrap();
    expect_that!(csv.as_str(), starts_with("csr_base,ctrl,0x00000000,,\n"));
    let constraints = fs_read(&directory.join("constraints.txt")).unwrap();
    expect_that!(constraints.as_str(), contains_substring("sys_clk jtag_clk false_path"));
    let clocks = fs_read(&directory.join("clocks.txt")).unwrap();
    expect_that!(clocks.as_str(), contains_substring("idelay_clk,200000000,5.000"));
    let _ = std::fs::remove_dir_all(&directory);
}
