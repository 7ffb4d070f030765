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

use crate::comm::dbus::{SharedModel, validate_domain_name, validate_export_directory};
use crate::config::system_config::set_free_run;
use crate::gateware::soc::write_artifacts;
use log::{info, trace};
use zbus::{fdo, interface};

pub struct ControlInterface {
    pub model: SharedModel,
}

#[interface(name = "io.sdrgw.control")]
impl ControlInterface {
    async fn write_register(&self, address: u32, value: u64) -> Result<String, fdo::Error> {
        info!("write_register called with address: 0x{address:08x} and value: 0x{value:x}");
        let mut model = self.model.lock().await;
        model.write(address, value)?;
        let name = model.csr().lookup_address(address)?.name.clone();
        Ok(format!("Wrote 0x{value:x} to {name}"))
    }

    async fn write_register_by_name(&self, name: &str, value: u64) -> Result<String, fdo::Error> {
        info!("write_register_by_name called with name: {name} and value: 0x{value:x}");
        let mut model = self.model.lock().await;
        model.write_by_name(name, value)?;
        Ok(format!("Wrote 0x{value:x} to {name}"))
    }

    /// Returns `(value, uptime_cycles)`.
    async fn latch_measurement(&self, name: &str) -> Result<(u64, u64), fdo::Error> {
        info!("latch_measurement called with name: {name}");
        let mut model = self.model.lock().await;
        let reading = model.latch_measurement(name)?;
        Ok((reading.value, reading.uptime_cycles))
    }

    async fn advance(&self, cycles: u64) -> Result<String, fdo::Error> {
        info!("advance called with cycles: {cycles}");
        let mut model = self.model.lock().await;
        model.run_sys_cycles(cycles)?;
        trace!("Model time is now {} fs", model.now_fs());
        Ok(format!("Advanced {cycles} sys cycles"))
    }

    async fn set_clock_running(&self, domain: &str, running: bool) -> Result<String, fdo::Error> {
        info!("set_clock_running called with domain: {domain} and running: {running}");
        validate_domain_name(domain)?;
        let mut model = self.model.lock().await;
        model.set_clock_running(domain, running)?;
        let state = if running { "running" } else { "stopped" };
        Ok(format!("Clock of {domain} {state}"))
    }

    async fn set_free_run(&self, enabled: bool) -> Result<String, fdo::Error> {
        info!("set_free_run called with enabled: {enabled}");
        set_free_run(enabled)?;
        Ok(format!("Free running {}", if enabled { "enabled" } else { "disabled" }))
    }

    async fn soft_reset(&self) -> Result<String, fdo::Error> {
        info!("soft_reset called");
        let mut model = self.model.lock().await;
        model.soft_reset()?;
        Ok("Soft reset requested".into())
    }

    async fn export_artifacts(&self, directory: &str) -> Result<String, fdo::Error> {
        info!("export_artifacts called with directory: {directory}");
        let path = validate_export_directory(directory)?;
        let model = self.model.lock().await;
        write_artifacts(model.graph(), model.csr(), &path)?;
        Ok(format!("Artifacts written to {directory}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::dbus::quick_shared_model;
    use crate::gateware::peripherals::ctrl::SCRATCH_RESET;
    use googletest::prelude::*;
    use rstest::*;

    fn control() -> ControlInterface {
        let (_, model) = quick_shared_model();
        ControlInterface { model }
    }

    fn invalid_args_message(result: Result<impl std::fmt::Debug, fdo::Error>) -> String {
        match result {
            Err(fdo::Error::InvalidArgs(msg)) => msg,
            other => panic!("expected InvalidArgs, got {other:?}"),
        }
    }

    #[gtest]
    #[tokio::test]
    async fn writes_go_to_the_named_register() {
        let control = control();
        let address = control
            .model
            .lock()
            .await
            .register("ctrl_scratch")
            .unwrap()
            .address;
        let reply = control.write_register(address, 0xcafe).await.unwrap();
        expect_that!(reply.as_str(), eq("Wrote 0xcafe to ctrl_scratch"));
        let value = control.model.lock().await.read_by_name("ctrl_scratch").unwrap();
        assert_that!(value, eq(0xcafe));
    }

    #[gtest]
    #[tokio::test]
    async fn read_only_register_write_is_invalid_args() {
        let control = control();
        let address = control
            .model
            .lock()
            .await
            .register("si5351_clk0_value")
            .unwrap()
            .address;
        let msg = invalid_args_message(control.write_register(address, 1).await);
        assert_that!(msg.as_str(), contains_substring("is read-only"));
    }

    #[gtest]
    #[tokio::test]
    async fn latched_measurements_give_the_clock_frequency() {
        let control = control();
        control.advance(1_000).await.unwrap();
        let (first, first_uptime) = control.latch_measurement("si5351_clk0").await.unwrap();
        control.advance(125_000).await.unwrap();
        let (second, second_uptime) = control.latch_measurement("si5351_clk0").await.unwrap();
        let seconds = (second_uptime - first_uptime) as f64 / 125_000_000.0;
        let frequency = (second - first) as f64 / seconds;
        assert_that!(frequency, near(38_400_000.0, 3_000.0));
    }

    #[gtest]
    #[tokio::test]
    async fn unknown_measurement_fails() {
        let control = control();
        match control.latch_measurement("si5351_clk7").await {
            Err(fdo::Error::Failed(msg)) => {
                assert_that!(msg.as_str(), contains_substring("SdrgwError::MissingDomain"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[gtest]
    #[tokio::test]
    #[rstest]
    #[case::relative("build/out", "must be an absolute path")]
    #[case::parent("/tmp/../etc", "may not contain")]
    async fn export_directory_is_validated(#[case] directory: &str, #[case] message: &str) {
        let msg = invalid_args_message(control().export_artifacts(directory).await);
        assert_that!(msg.as_str(), contains_substring(message));
    }

    #[gtest]
    #[tokio::test]
    async fn stopped_sys_clock_cannot_advance() {
        let control = control();
        control.set_clock_running("sys", false).await.unwrap();
        let msg = invalid_args_message(control.advance(10).await);
        expect_that!(msg.as_str(), contains_substring("not toggling"));
        let reply = control.set_clock_running("sys", true).await.unwrap();
        expect_that!(reply.as_str(), eq("Clock of sys running"));
        assert_that!(control.advance(10).await, ok(anything()));
    }

    #[gtest]
    #[tokio::test]
    async fn malformed_domain_name_is_rejected() {
        let msg = invalid_args_message(control().set_clock_running("sys clk", false).await);
        assert_that!(msg.as_str(), contains_substring("not a valid clock domain name"));
    }

    #[gtest]
    #[tokio::test]
    async fn soft_reset_restores_scratch() {
        let control = control();
        control.advance(100).await.unwrap();
        control.write_register_by_name("ctrl_scratch", 0).await.unwrap();
        control.soft_reset().await.unwrap();
        control.advance(100).await.unwrap();
        let value = control.model.lock().await.read_by_name("ctrl_scratch").unwrap();
        assert_that!(value, eq(SCRATCH_RESET));
    }
}
