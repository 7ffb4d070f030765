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

use crate::proxies::status_proxy::StatusProxy;
use zbus::Connection;

async fn status_proxy() -> Result<StatusProxy<'static>, zbus::Error> {
    let connection = Connection::system().await?;
    StatusProxy::new(&connection).await
}

pub async fn status_handler() -> Result<String, zbus::Error> {
    let proxy = status_proxy().await?;
    let ident = proxy.get_ident().await?;
    let backend = proxy.get_backend().await?;
    let time_fs = proxy.get_time_fs().await?;
    let sys_cycles = proxy.get_cycles("sys").await?;
    let mut ret_string = format!(
        "---- SOC ----\n\
        {ident}\n\
        model time: {time_fs} fs ({sys_cycles} sys cycles)\n\
        \n---- BACKEND ----\n"
    );
    for line in backend.lines() {
        ret_string += format!("| {} |\n", line.replace('=', " | ")).as_str();
    }
    ret_string += "\n---- MEASUREMENTS ----\n";
    for name in proxy.get_measurements().await?.lines() {
        let cycles = proxy.get_cycles(&format!("{name}_counter")).await?;
        ret_string += format!("| {name} | {cycles} cycles |\n").as_str();
    }
    Ok(ret_string)
}

pub async fn domains_handler() -> Result<String, zbus::Error> {
    let domains = status_proxy().await?.get_domains().await?;
    let mut ret_string = String::from("| domain | frequency | clock | reset |\n");
    for line in domains.lines() {
        ret_string += format!("| {} |\n", line.replace(',', " | ")).as_str();
    }
    Ok(ret_string)
}

pub async fn constraints_handler(periods: bool) -> Result<String, zbus::Error> {
    let proxy = status_proxy().await?;
    if periods {
        proxy.get_period_constraints().await
    } else {
        proxy.get_constraints().await
    }
}
