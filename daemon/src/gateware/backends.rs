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

//! Host communication backends.
//!
//! At most one backend is built into a SoC. A backend registers a constructor under its
//! name with the [`backend`](sdrgw_macros::backend) attribute; [`select_backend`] decides
//! from the configuration which one to construct, rejecting conflicting requests before
//! anything is added to the domain graph.

#[cfg(feature = "ethernet")]
pub mod ethernet;
#[cfg(feature = "pcie")]
pub mod pcie;

use crate::config::SocConfig;
use crate::error::SdrgwError;
use crate::gateware::crg::Crg;
use crate::gateware::csr::CsrMap;
use crate::gateware::graph::DomainGraph;
use crate::model::Block;
use log::{info, trace, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendMode {
    Pcie,
    Ethernet,
    None,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Pcie => write!(f, "pcie"),
            BackendMode::Ethernet => write!(f, "ethernet"),
            BackendMode::None => write!(f, "none"),
        }
    }
}

/// The quad PLL shared by every serial transceiver of the device.
#[derive(Debug, Default)]
pub struct TransceiverPll {
    owner: Option<String>,
}

impl TransceiverPll {
    pub fn claim(&mut self, requester: &str) -> Result<(), SdrgwError> {
        match &self.owner {
            Some(owner) => Err(SdrgwError::ResourceBusy {
                resource: "transceiver_pll".into(),
                owner: owner.clone(),
                requester: requester.into(),
            }),
            None => {
                trace!("transceiver_pll allocated to {requester}");
                self.owner = Some(requester.into());
                Ok(())
            }
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

/// Everything a backend may extend while the SoC is composed.
pub struct Composer<'a> {
    pub graph: &'a mut DomainGraph,
    pub csr: &'a mut CsrMap,
    pub crg: &'a Crg,
    pub transceiver_pll: &'a mut TransceiverPll,
}

pub trait Backend: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn mode(&self) -> BackendMode;

    /// Add the backend's domains, crossings and registers.
    fn elaborate(&mut self, composer: &mut Composer) -> Result<(), SdrgwError>;

    /// Runtime models for the registers added by [`Backend::elaborate`].
    fn blocks(&self) -> Result<Vec<Box<dyn Block>>, SdrgwError>;

    /// Human readable build parameters.
    fn properties(&self) -> Vec<(String, String)>;
}

type BackendConstructor = fn(&SocConfig) -> Result<Box<dyn Backend>, SdrgwError>;

pub static BACKEND_REGISTRY: OnceLock<Mutex<HashMap<&'static str, BackendConstructor>>> =
    OnceLock::new();

pub fn init_backend_registry() {
    BACKEND_REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
}

pub fn register_backend(name: &'static str, constructor: BackendConstructor) {
    init_backend_registry();
    let Some(registry) = BACKEND_REGISTRY.get() else {
        return;
    };
    match registry.lock() {
        Ok(mut map) => {
            map.insert(name, constructor);
        }
        Err(e) => warn!("Failed to register backend {name}: {e}"),
    }
}

/// Register every backend compiled into this build.
pub fn register_backends() {
    #[cfg(feature = "pcie")]
    pcie::PcieBackend::register_backend();
    #[cfg(feature = "ethernet")]
    ethernet::EthernetBackend::register_backend();
}

pub fn registered_backends() -> Result<Vec<&'static str>, SdrgwError> {
    let registry = BACKEND_REGISTRY
        .get()
        .ok_or(SdrgwError::Internal("BACKEND_REGISTRY not initialized".into()))?;
    let map = registry.lock().map_err(|e| {
        SdrgwError::Internal(format!("Failed to acquire lock on BACKEND_REGISTRY: {e}"))
    })?;
    let mut names: Vec<&'static str> = map.keys().copied().collect();
    names.sort_unstable();
    Ok(names)
}

/// Names of the backends enabled in `config`.
pub fn requested_backends(config: &SocConfig) -> Vec<&'static str> {
    let mut requested = Vec::new();
    if config.with_pcie {
        requested.push("pcie");
    }
    if config.with_ethernet {
        requested.push("ethernet");
    }
    requested
}

fn construct(name: &str, config: &SocConfig) -> Result<Box<dyn Backend>, SdrgwError> {
    let constructor = {
        let registry = BACKEND_REGISTRY
            .get()
            .ok_or(SdrgwError::Internal("BACKEND_REGISTRY not initialized".into()))?;
        let map = registry.lock().map_err(|e| {
            SdrgwError::Internal(format!("Failed to acquire lock on BACKEND_REGISTRY: {e}"))
        })?;
        *map.get(name).ok_or_else(|| {
            SdrgwError::Config(format!("Backend {name} is not built into this daemon"))
        })?
    };
    constructor(config)
}

/// Decide which backend the SoC carries.
///
/// Fails with [`SdrgwError::BackendConflict`] when more than one is requested.
pub fn select_backend(config: &SocConfig) -> Result<Option<Box<dyn Backend>>, SdrgwError> {
    let requested = requested_backends(config);
    if requested.len() > 1 {
        return Err(SdrgwError::BackendConflict(
            requested.into_iter().map(String::from).collect(),
        ));
    }
    match requested.first() {
        None => {
            info!("No host communication backend requested");
            Ok(None)
        }
        Some(name) => {
            let backend = construct(name, config)?;
            info!("Selected {} backend", backend.mode());
            Ok(Some(backend))
        }
    }
}
