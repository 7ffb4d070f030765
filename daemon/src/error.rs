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

use log::error;
use std::path::PathBuf;
use zbus::fdo;

#[derive(Debug, thiserror::Error)]
pub enum SdrgwError {
    #[error("SdrgwError::Config: {0}")]
    Config(String),
    #[error("SdrgwError::TomlDe: Failed to parse toml {toml_string:?}: {e}")]
    TomlDe {
        toml_string: String,
        e: toml::de::Error,
    },
    #[error("SdrgwError::BackendConflict: Only one communication backend may be active, requested: {0:?}")]
    BackendConflict(Vec<String>),
    #[error("SdrgwError::LaneConfig: {lanes} PCIe lanes requested, supported lane counts are 1 and 4")]
    LaneConfig { lanes: u8 },
    #[error("SdrgwError::DmaConfig: {0}")]
    DmaConfig(String),
    #[error("SdrgwError::DuplicateDomain: Clock domain {0} is already declared")]
    DuplicateDomain(String),
    #[error("SdrgwError::MissingDomain: Clock domain {0} is not declared")]
    MissingDomain(String),
    #[error("SdrgwError::MissingReset: Clock domain {0} has no reset source")]
    MissingReset(String),
    #[error("SdrgwError::DomainMismatch: Signal {signal} belongs to {found} but was wired as if from {expected}")]
    DomainMismatch {
        signal: String,
        expected: String,
        found: String,
    },
    #[error("SdrgwError::Synchronizer: {0}")]
    Synchronizer(String),
    #[error("SdrgwError::Pll: {0}")]
    Pll(String),
    #[error("SdrgwError::ResourceBusy: {resource} is owned by {owner}, cannot be allocated to {requester}")]
    ResourceBusy {
        resource: String,
        owner: String,
        requester: String,
    },
    #[error("SdrgwError::Register: {0}")]
    Register(String),
    #[error("SdrgwError::Argument: {0}")]
    Argument(String),
    #[error("SdrgwError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("SdrgwError::IOWrite: An IO error occurred when writing to {file:?}: {e}")]
    IOWrite { file: PathBuf, e: std::io::Error },
    #[error("SdrgwError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl From<SdrgwError> for fdo::Error {
    fn from(err: SdrgwError) -> Self {
        error!("{err}");
        match err {
            SdrgwError::Argument(..) => fdo::Error::InvalidArgs(err.to_string()),
            SdrgwError::Register(..) => fdo::Error::InvalidArgs(err.to_string()),
            SdrgwError::IORead { .. } => fdo::Error::IOError(err.to_string()),
            SdrgwError::IOWrite { .. } => fdo::Error::IOError(err.to_string()),
            _ => fdo::Error::Failed(err.to_string()),
        }
    }
}
