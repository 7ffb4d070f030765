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

//! Clock domains and domain-tagged signals.
//!
//! A [`ClockDomain`] is a named clock/reset pair with a nominal frequency. Domains are
//! created by the [`DomainGraph`](crate::gateware::graph::DomainGraph), which hands out
//! [`DomainId`]s; no other code mints ids. A [`Signal`] always carries the id of the
//! domain it is registered in, so wiring it into logic of another domain without a
//! synchronizer can be rejected at composition time.

use std::fmt;

/// Upper bound on domains per SoC, fixed by the width of [`DomainSet`].
pub const MAX_DOMAINS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub(crate) u8);

impl DomainId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain#{}", self.0)
    }
}

/// A set of domains, used to report which clocks edge at a given instant and which
/// resets are asserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomainSet(u64);

impl DomainSet {
    pub fn empty() -> Self {
        DomainSet(0)
    }

    pub fn single(id: DomainId) -> Self {
        DomainSet(1 << id.0)
    }

    pub fn insert(&mut self, id: DomainId) {
        self.0 |= 1 << id.0;
    }

    pub fn remove(&mut self, id: DomainId) {
        self.0 &= !(1 << id.0);
    }

    pub fn contains(self, id: DomainId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: DomainSet) -> DomainSet {
        DomainSet(self.0 | other.0)
    }

    pub fn intersect(self, other: DomainSet) -> DomainSet {
        DomainSet(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = DomainId> {
        (0..MAX_DOMAINS as u8)
            .filter(move |i| self.0 & (1 << i) != 0)
            .map(DomainId)
    }
}

impl FromIterator<DomainId> for DomainSet {
    fn from_iter<I: IntoIterator<Item = DomainId>>(iter: I) -> Self {
        let mut set = DomainSet::empty();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Where a domain's clock comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainOrigin {
    /// Output of an on-chip PLL.
    Pll { pll: String },
    /// A clock pin driven by the board, e.g. an SI5351 output.
    ExternalInput { pin: String },
    /// Recovered or generated by a hard PHY (PCIe, transceiver, JTAG).
    Phy { name: String },
    /// Generated from a counter bit in `parent`.
    Divided { parent: DomainId, divider: u32 },
}

/// What holds a domain in reset.
#[derive(Clone, Debug, PartialEq)]
pub enum ResetSource {
    /// Held until the PLL producing the clock reports lock.
    PllLock { pll: String },
    /// Another domain's reset, brought in through an asynchronous reset synchronizer.
    Domain(DomainId),
    /// Reset driven synchronously by the parent of a divided clock.
    Derived { parent: DomainId },
    /// Provided by a hard PHY together with its clock.
    Phy { name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClockDomain {
    pub id: DomainId,
    pub name: String,
    pub clock_signal: String,
    pub reset_signal: String,
    pub nominal_frequency_hz: u64,
    pub origin: DomainOrigin,
    pub reset_source: Option<ResetSource>,
}

impl ClockDomain {
    pub fn period_ns(&self) -> f64 {
        1e9 / self.nominal_frequency_hz as f64
    }
}

/// A named value of `width` bits registered in `domain`.
///
/// Width 0 is reserved for pure events (strobes) that carry no data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub width: u8,
    pub domain: DomainId,
}

impl Signal {
    pub fn new(name: impl Into<String>, width: u8, domain: DomainId) -> Self {
        Signal {
            name: name.into(),
            width,
            domain,
        }
    }
}
