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
use sdrgw::gateware::csr::CsrMap;
use sdrgw::gateware::domain::{DomainId, DomainOrigin, ResetSource};
use sdrgw::gateware::graph::DomainGraph;
use sdrgw::gateware::measurement::{ClockMeasurementModel, clock_measurement};
use sdrgw::model::clock::ClockScheduler;
use sdrgw::model::{Block, Wires};

/// One measurement evaluated on its own two clocks.
struct Bench {
    scheduler: ClockScheduler,
    model: ClockMeasurementModel,
    sys: DomainId,
    counter: DomainId,
}

impl Bench {
    fn new(sys_hz: u64, clock_hz: u64, counter_step: u64) -> Self {
        let mut graph = DomainGraph::new();
        let sys = graph
            .add_domain("sys", sys_hz, DomainOrigin::Pll { pll: "pll".into() })
            .unwrap();
        graph
            .set_reset_source(sys, ResetSource::PllLock { pll: "pll".into() })
            .unwrap();
        let mut csr = CsrMap::new(sys);
        let clock = measured_clock("ext", clock_hz, false);
        let measurement =
            clock_measurement(&mut graph, &mut csr, "ext", &clock, sys, counter_step).unwrap();
        let counter = measurement.counter_domain;
        let mut scheduler = ClockScheduler::new();
        scheduler.add_clock(sys, "sys", sys_hz, 0, true).unwrap();
        scheduler
            .add_clock(counter, "ext_counter", clock_hz, 0, true)
            .unwrap();
        Bench {
            scheduler,
            model: ClockMeasurementModel::new(&measurement).unwrap(),
            sys,
            counter,
        }
    }

    fn sys_cycles(&self) -> u64 {
        self.scheduler.cycles(self.sys).unwrap()
    }

    fn run_sys(&mut self, cycles: u64) {
        let target = self.sys_cycles() + cycles;
        while self.sys_cycles() < target {
            let edges = self.scheduler.next_edges().unwrap();
            self.model.tick(edges, &Wires::default());
        }
    }

    fn latch(&mut self) -> u64 {
        self.model.latch();
        self.run_sys(50);
        self.model.value()
    }
}

#[gtest]
fn delta_over_8ms_matches_the_frequency_ratio() {
    let mut bench = Bench::new(125_000_000, 38_400_000, 1);
    bench.run_sys(100);
    let start = bench.sys_cycles();
    let first = bench.latch();
    bench.run_sys(start + 1_000_000 - bench.sys_cycles());
    let second = bench.latch();
    let delta = second - first;
    expect_that!(delta, ge(307_200 - 4));
    expect_that!(delta, le(307_200 + 4));
    expect_that!(bench.model.captures(), eq(2));
}

#[gtest]
#[rstest]
#[case::step_one(1)]
#[case::step_four(4)]
fn counter_step_scales_the_delta(#[case] step: u64) {
    let mut bench = Bench::new(100_000_000, 10_000_000, step);
    bench.run_sys(100);
    let start = bench.sys_cycles();
    let first = bench.latch();
    bench.run_sys(start + 10_000 - bench.sys_cycles());
    let second = bench.latch();
    assert_that!(second - first, eq(1_000 * step));
}

#[gtest]
fn spaced_latches_each_capture_exactly_once() {
    let mut bench = Bench::new(125_000_000, 38_400_000, 1);
    bench.run_sys(100);
    let mut values = Vec::new();
    for _ in 0..50 {
        bench.model.latch();
        bench.run_sys(20);
        values.push(bench.model.value());
    }
    bench.run_sys(50);
    expect_that!(bench.model.captures(), eq(50));
    expect_that!(values.windows(2).all(|w| w[0] <= w[1]), eq(true));
}

#[gtest]
#[rstest]
#[case::same_frequency(125_000_000, 4)]
#[case::faster_counter(200_000_000, 3)]
#[case::slower_counter(38_400_000, 14)]
fn latches_four_counter_cycles_apart_are_never_merged(
    #[case] clock_hz: u64,
    #[case] sys_cycles_between: u64,
) {
    let mut bench = Bench::new(125_000_000, clock_hz, 1);
    bench.run_sys(100);
    for _ in 0..40 {
        bench.model.latch();
        bench.run_sys(sys_cycles_between);
    }
    bench.run_sys(50);
    assert_that!(bench.model.captures(), eq(40));
}

#[gtest]
fn stopped_clock_reads_back_a_constant() {
    let mut bench = Bench::new(125_000_000, 38_400_000, 1);
    bench.run_sys(100);
    let running = bench.latch();
    bench.scheduler.set_running(bench.counter, false).unwrap();
    let stopped = bench.latch();
    bench.run_sys(10_000);
    let later = bench.latch();
    expect_that!(stopped, eq(running));
    expect_that!(later, eq(stopped));
    expect_that!(bench.model.captures(), eq(1));
}

#[gtest]
fn value_is_readable_through_the_register_bus() {
    let (_, mut model) = instantiate(&quick_config());
    run_until_out_of_reset(&mut model);
    model.run_sys_cycles(1_000).unwrap();
    let first = model.latch_measurement("si5351_clk0").unwrap();
    model.run_sys_cycles(125_000).unwrap();
    let second = model.latch_measurement("si5351_clk0").unwrap();
    let counts = (second.value - first.value) as f64;
    let seconds = (second.uptime_cycles - first.uptime_cycles) as f64 / 125e6;
    expect_that!(counts / seconds, near(38.4e6, 3_000.0));
    expect_that!(
        model.read_by_name("si5351_clk0_value").unwrap(),
        eq(second.value)
    );
}

#[gtest]
fn gated_clock_starts_once_the_si5351_is_programmed() {
    let mut config = quick_config();
    config.measured_clocks = vec![measured_clock("si5351_clk0", 38_400_000, true)];
    config.simulation.i2c_freq = 12_500_000;
    let (_, mut model) = instantiate(&config);
    run_until_out_of_reset(&mut model);
    model.run_sys_cycles(1_000).unwrap();
    expect_that!(model.cycles_by_name("si5351_clk0_counter").unwrap(), eq(0));
    let idle = model.latch_measurement("si5351_clk0").unwrap();
    expect_that!(idle.value, eq(0));

    let mut waited = 0;
    while model.read_by_name("si5351_done").unwrap() == 0 && waited < 100 {
        model.run_sys_cycles(1_000).unwrap();
        waited += 1;
    }
    expect_that!(model.read_by_name("si5351_done").unwrap(), eq(1));
    model.run_sys_cycles(100).unwrap();
    expect_that!(model.cycles_by_name("si5351_clk0_counter").unwrap(), gt(0));

    let first = model.latch_measurement("si5351_clk0").unwrap();
    model.run_sys_cycles(1_000_000).unwrap();
    let second = model.latch_measurement("si5351_clk0").unwrap();
    let counts = (second.value - first.value) as f64;
    let seconds = (second.uptime_cycles - first.uptime_cycles) as f64 / 125e6;
    expect_that!(counts / seconds, near(38.4e6, 500.0));
}

#[gtest]
fn latching_an_unknown_measurement_fails() {
    let (_, mut model) = instantiate(&quick_config());
    assert_that!(
        model.latch_measurement("si5351_clk7"),
        err(displays_as(contains_substring("SdrgwError::MissingDomain")))
    );
}
