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

//! Command line client for the sdrgw daemon.
//!
//! Every subcommand maps onto one or a few DBus calls on `io.sdrgw`; `measure` is the
//! only one doing work of its own, turning two counter readings into a frequency.

use crate::control::{
    advance_handler, clock_handler, export_handler, free_run_handler, reset_handler,
};
use crate::csr::{CsrTarget, csr_list_handler, csr_read_handler, csr_write_handler};
use crate::measure::measure_handler;
use crate::status::{constraints_handler, domains_handler, status_handler};
use clap::{Parser, Subcommand, arg, command};
use log::{debug, error};

mod control;
mod csr;
mod measure;
mod proxies;
mod status;

#[derive(Parser, Debug)]
#[command(name = "sdrgw")]
#[command(bin_name = "sdrgw")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// SoC identifier, backend and measured clocks
    Status,
    /// Clock domains of the composed SoC
    Domains,
    /// Timing constraints derived from the domain graph
    Constraints {
        #[arg(long, help = "print period constraints instead of clock relationships")]
        periods: bool,
    },
    /// Register bus access
    Csr {
        #[command(subcommand)]
        command: CsrCommands,
    },
    /// Measure the frequency of an external clock
    Measure {
        name: String,
        #[arg(long = "window-ms", default_value_t = 100)]
        window_ms: u64,
        #[arg(
            long,
            help = "advance the model by this many sys cycles between the two latches \
            instead of waiting for the window"
        )]
        advance: Option<u64>,
    },
    /// Advance the model by a number of sys cycles
    Advance { cycles: u64 },
    /// Start or stop a clock
    Clock {
        domain: String,
        #[arg(long)]
        stop: bool,
    },
    /// Enable or disable free running
    FreeRun {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Request a soft reset
    Reset,
    /// Write csr.csv, constraints.txt and clocks.txt
    Export { directory: String },
}

#[derive(Subcommand, Debug)]
enum CsrCommands {
    List,
    Read {
        /// register name or address
        register: String,
    },
    Write {
        /// register name or address
        register: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");
    let result = match cli.command {
        Commands::Status => status_handler().await,
        Commands::Domains => domains_handler().await,
        Commands::Constraints { periods } => constraints_handler(periods).await,
        Commands::Csr { command } => match command {
            CsrCommands::List => csr_list_handler().await,
            CsrCommands::Read { register } => csr_read_handler(&CsrTarget::parse(&register)).await,
            CsrCommands::Write { register, value } => {
                csr_write_handler(&CsrTarget::parse(&register), &value).await
            }
        },
        Commands::Measure {
            name,
            window_ms,
            advance,
        } => measure_handler(&name, window_ms, advance).await,
        Commands::Advance { cycles } => advance_handler(cycles).await,
        Commands::Clock { domain, stop } => clock_handler(&domain, !stop).await,
        Commands::FreeRun { enabled } => free_run_handler(enabled).await,
        Commands::Reset => reset_handler().await,
        Commands::Export { directory } => export_handler(&directory).await,
    };
    match result {
        Ok(msg) => println!("{msg}"),
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    }
    Ok(())
}
