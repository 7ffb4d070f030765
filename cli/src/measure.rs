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

use crate::proxies::control_proxy::ControlProxy;
use crate::proxies::status_proxy::StatusProxy;
use log::debug;
use std::time::Duration;
use zbus::Connection;

/// Frequency of a measured clock from two `(value, uptime_cycles)` readings.
pub fn compute_frequency(
    first: (u64, u64),
    second: (u64, u64),
    sys_clk_freq: u64,
) -> Result<f64, String> {
    let (value_a, uptime_a) = first;
    let (value_b, uptime_b) = second;
    if uptime_b <= uptime_a {
        return Err(format!(
            "No system time elapsed between the two readings ({uptime_a} -> {uptime_b})"
        ));
    }
    let counts = value_b.wrapping_sub(value_a) as f64;
    let seconds = (uptime_b - uptime_a) as f64 / sys_clk_freq as f64;
    Ok(counts / seconds)
}

pub fn format_frequency(hz: f64) -> String {
    if hz >= 1e6 {
        format!("{:.6} MHz", hz / 1e6)
    } else if hz >= 1e3 {
        format!("{:.3} kHz", hz / 1e3)
    } else {
        format!("{hz:.1} Hz")
    }
}

/// Latch `name` twice, either `advance` sys cycles or `window_ms` of wall time apart.
pub async fn measure_handler(
    name: &str,
    window_ms: u64,
    advance: Option<u64>,
) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let status = StatusProxy::new(&connection).await?;
    let control = ControlProxy::new(&connection).await?;
    let sys_clk_freq = status.get_sys_clk_freq().await?;

    let first = control.latch_measurement(name).await?;
    match advance {
        Some(cycles) => {
            control.advance(cycles).await?;
        }
        None => tokio::time::sleep(Duration::from_millis(window_ms)).await,
    }
    let second = control.latch_measurement(name).await?;
    debug!("{name}: {first:?} -> {second:?}");
    let hz = compute_frequency(first, second, sys_clk_freq).map_err(zbus::Error::Failure)?;
    Ok(format!(
        "{name}: {} ({} counts in {} sys cycles)",
        format_frequency(hz),
        second.0.wrapping_sub(first.0),
        second.1 - first.1
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    fn frequency_from_counter_delta() {
        let hz = compute_frequency((100, 10), (307_300, 1_000_010), 125_000_000).unwrap();
        expect_that!(hz, approx_eq(38_400_000.0));
    }

    #[gtest]
    fn stopped_clock_reads_zero_hz() {
        let hz = compute_frequency((42, 0), (42, 1000), 125_000_000).unwrap();
        expect_that!(hz, approx_eq(0.0));
    }

    #[gtest]
    fn readings_need_elapsed_time() {
        assert_that!(
            compute_frequency((0, 5), (10, 5), 125_000_000),
            err(displays_as(contains_substring("No system time elapsed")))
        );
    }

    #[gtest]
    #[rstest]
    #[case::mhz(38_400_000.0, "38.400000 MHz")]
    #[case::khz(100_000.0, "100.000 kHz")]
    #[case::hz(12.0, "12.0 Hz")]
    fn frequencies_are_scaled(#[case] hz: f64, #[case] expected: &str) {
        expect_that!(format_frequency(hz).as_str(), eq(expected));
    }
}
