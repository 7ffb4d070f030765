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
use rstest::*;
use sdrgw::gateware::peripherals::ctrl::SCRATCH_RESET;
use sdrgw::gateware::sync::AsyncResetSynchronizer;

#[gtest]
#[rstest]
#[case::two_stages(2)]
#[case::three_stages(3)]
fn release_takes_one_edge_per_stage(#[case] stages: usize) {
    let mut sync = AsyncResetSynchronizer::new(stages).unwrap();
    sync.set_source(true);
    sync.clock();
    sync.set_source(false);
    let mut edges = 0;
    while sync.asserted() {
        sync.clock();
        edges += 1;
    }
    assert_that!(edges, eq(stages));
}

#[gtest]
fn assertion_is_immediate() {
    let mut sync = AsyncResetSynchronizer::new(2).unwrap();
    for _ in 0..4 {
        sync.clock();
    }
    sync.set_source(false);
    sync.clock();
    sync.clock();
    expect_that!(sync.asserted(), eq(false));
    sync.set_source(true);
    assert_that!(sync.asserted(), eq(true));
}

#[gtest]
fn sys_reset_waits_for_pll_lock() {
    let (_, mut model) = instantiate(&quick_config());
    let sys = model.graph().lookup("sys").unwrap();
    expect_that!(model.reset_asserted(sys), eq(true));
    run_until_out_of_reset(&mut model);
    expect_that!(model.cycles(sys).unwrap(), ge(10 + 2));
}

#[gtest]
fn counter_domain_leaves_reset_at_least_two_edges_after_sys() {
    let (_, mut model) = instantiate(&quick_config());
    let sys = model.graph().lookup("sys").unwrap();
    let counter = model.graph().lookup("si5351_clk0_counter").unwrap();
    while model.reset_asserted(sys) {
        model.step().unwrap();
    }
    let released_at = model.cycles(counter).unwrap();
    expect_that!(model.reset_asserted(counter), eq(true));
    while model.reset_asserted(counter) {
        model.step().unwrap();
    }
    assert_that!(model.cycles(counter).unwrap() - released_at, ge(2));
}

#[gtest]
fn ctrl_reset_restores_defaults() {
    let (_, mut model) = instantiate(&quick_config());
    run_until_out_of_reset(&mut model);
    model.write_by_name("ctrl_scratch", 0xdead_beef).unwrap();
    model.run_sys_cycles(1_000).unwrap();
    expect_that!(model.read_by_name("ctrl_scratch").unwrap(), eq(0xdead_beef));

    model.write_by_name("ctrl_reset", 1).unwrap();
    let sys = model.graph().lookup("sys").unwrap();
    expect_that!(model.reset_asserted(sys), eq(true));
    run_until_out_of_reset(&mut model);
    expect_that!(model.read_by_name("ctrl_scratch").unwrap(), eq(SCRATCH_RESET));

    model.write_by_name("uptime_latch", 1).unwrap();
    model.run_sys_cycles(1).unwrap();
    expect_that!(model.read_by_name("uptime_cycles").unwrap(), lt(100));
}

#[gtest]
fn icap_reload_resets_the_soc() {
    let (_, mut model) = instantiate(&quick_config());
    run_until_out_of_reset(&mut model);
    let sys = model.graph().lookup("sys").unwrap();
    model.write_by_name("icap_reload", 1).unwrap();
    expect_that!(model.read_by_name("icap_done").unwrap(), eq(0));
    let mut reset_seen = false;
    for _ in 0..200 {
        model.run_sys_cycles(1).unwrap();
        reset_seen |= model.reset_asserted(sys);
    }
    expect_that!(reset_seen, eq(true));
    expect_that!(model.read_by_name("icap_done").unwrap(), eq(1));
}

#[gtest]
fn soft_reset_restarts_uptime() {
    let (_, mut model) = instantiate(&quick_config());
    run_until_out_of_reset(&mut model);
    model.run_sys_cycles(5_000).unwrap();
    model.soft_reset().unwrap();
    run_until_out_of_reset(&mut model);
    model.write_by_name("uptime_latch", 1).unwrap();
    model.run_sys_cycles(1).unwrap();
    expect_that!(model.read_by_name("uptime_cycles").unwrap(), lt(100));
}
