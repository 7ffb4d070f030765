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

use sdrgw::config::{MeasuredClock, SocConfig};
use sdrgw::error::SdrgwError;
use sdrgw::gateware::backends::register_backends;
use sdrgw::gateware::soc::{Soc, compose};
use sdrgw::model::SocModel;

pub fn measured_clock(name: &str, frequency_hz: u64, gated_by_si5351: bool) -> MeasuredClock {
    MeasuredClock {
        name: name.into(),
        frequency_hz,
        running: true,
        gated_by_si5351,
    }
}

/// Default SoC with a short PLL lock time and a single ungated measured clock.
pub fn quick_config() -> SocConfig {
    let mut config = SocConfig {
        measured_clocks: vec![measured_clock("si5351_clk0", 38_400_000, false)],
        ..SocConfig::default()
    };
    config.simulation.pll_lock_cycles = 10;
    config
}

pub fn compose_with(config: &SocConfig) -> Result<Soc, SdrgwError> {
    register_backends();
    compose(config)
}

pub fn instantiate(config: &SocConfig) -> (Soc, SocModel) {
    let soc = compose_with(config).unwrap();
    let model = soc.instantiate().unwrap();
    (soc, model)
}

/// Run until every PLL domain is out of reset.
pub fn run_until_out_of_reset(model: &mut SocModel) {
    let sys = model.graph().lookup("sys").unwrap();
    model.run_sys_cycles(1).unwrap();
    while model.reset_asserted(sys) {
        model.run_sys_cycles(1).unwrap();
    }
}
