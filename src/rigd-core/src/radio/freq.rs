// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::{Deserialize, Serialize};

/// Frequency wrapper (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Freq {
    pub hz: u64,
}

impl Freq {
    #[must_use]
    pub fn new(hz: u64) -> Self {
        Self { hz }
    }

    #[must_use]
    pub fn from_khz(khz: u64) -> Self {
        Self { hz: khz * 1_000 }
    }

    /// Split into MHz, kHz and Hz groups the way a rig front panel shows it.
    pub fn groups(&self) -> (u64, u64, u64) {
        (
            self.hz / 1_000_000,
            (self.hz / 1_000) % 1_000,
            self.hz % 1_000,
        )
    }
}

impl From<u64> for Freq {
    fn from(hz: u64) -> Self {
        Self { hz }
    }
}

/// Renders as `14.200.000` (MHz.kHz.Hz).
impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mhz, khz, hz) = self.groups();
        write!(f, "{}.{:03}.{:03}", mhz, khz, hz)
    }
}
