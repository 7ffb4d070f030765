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

//! Error Wrapping File System I/O Helpers
//!
//! Thin wrappers around the standard file operations that the daemon needs: reading
//! configuration files and writing exported artifacts (register map, constraint set,
//! frequency table). Every helper trace-logs and converts failures into [`SdrgwError`]
//! variants carrying the offending path.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use sdrgw::system_io::{fs_read, fs_write};
//! # use std::path::Path;
//! # fn example() -> Result<(), sdrgw::error::SdrgwError> {
//! let config = fs_read(Path::new("/etc/sdrgw/config.toml"))?;
//! fs_write(Path::new("/tmp/sdrgw/csr.csv"), true, "csr_base,ctrl,0x00000000,,")?;
//! # Ok(())
//! # }
//! ```

use crate::error::SdrgwError;
use log::trace;
use std::fs::{OpenOptions, create_dir_all};
use std::io::{Read, Write};
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Arguments
///
/// * `file_path` - Path to the file to read
///
/// # Returns: `Result<String, SdrgwError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(SdrgwError::IORead)` - If the file cannot be read
pub fn fs_read(file_path: &Path) -> Result<String, SdrgwError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(SdrgwError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Write a string value to a file, replacing previous content.
///
/// # Arguments
///
/// * `file_path` - Path to the file to write
/// * `create` - If `true`, create the file if it doesn't exist; if `false`, file must already exist
/// * `value` - The string value to write
///
/// # Returns: `Result<(), SdrgwError>`
/// * `Ok(())` - Write succeeded
/// * `Err(SdrgwError::IOWrite)` - If the write fails
pub fn fs_write(file_path: &Path, create: bool, value: impl AsRef<str>) -> Result<(), SdrgwError> {
    trace!(
        "Attempting to write {} bytes to {:?}",
        value.as_ref().len(),
        file_path
    );
    let result = OpenOptions::new()
        .create(create)
        .write(true)
        .truncate(true)
        .open(file_path)
        .and_then(|mut f| write!(f, "{}", value.as_ref()));
    match result {
        Ok(_) => {
            trace!("Write done.");
            Ok(())
        }
        Err(e) => Err(SdrgwError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}

/// Recursively create directories up to the specified path.
pub fn fs_create_dir(path: &Path) -> Result<(), SdrgwError> {
    trace!("Attempting to Create '{path:?}'");
    match create_dir_all(path) {
        Ok(_) => {
            trace!("Directory created at {path:?}.");
            Ok(())
        }
        Err(e) => Err(SdrgwError::IOWrite {
            file: path.into(),
            e,
        }),
    }
}
