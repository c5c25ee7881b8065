// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mode, passband and AGC values plus their selector mappings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mode supported by the rig.
///
/// Known modes map onto single bits of the hamlib mode mask, in the order
/// below (`AM` is bit 0, `FAX` is bit 15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RigMode {
    AM,
    CW,
    USB,
    LSB,
    RTTY,
    FMNarrow,
    FMWide,
    CWR,
    RTTYR,
    AMSync,
    PktLSB,
    PktUSB,
    PktFM,
    DataUSB,
    DataLSB,
    FAX,
    Unknown,
}

impl RigMode {
    /// Known modes in selector order.
    pub const KNOWN: [RigMode; 16] = [
        RigMode::AM,
        RigMode::CW,
        RigMode::USB,
        RigMode::LSB,
        RigMode::RTTY,
        RigMode::FMNarrow,
        RigMode::FMWide,
        RigMode::CWR,
        RigMode::RTTYR,
        RigMode::AMSync,
        RigMode::PktLSB,
        RigMode::PktUSB,
        RigMode::PktFM,
        RigMode::DataUSB,
        RigMode::DataLSB,
        RigMode::FAX,
    ];

    /// Position in the mode selector; `None` for `Unknown`.
    pub fn selector_index(self) -> Option<usize> {
        Self::KNOWN.iter().position(|m| *m == self)
    }

    pub fn from_selector_index(index: usize) -> RigMode {
        Self::KNOWN.get(index).copied().unwrap_or(RigMode::Unknown)
    }

    /// Single-bit hamlib mode mask, 0 for `Unknown`.
    pub fn bits(self) -> u32 {
        self.selector_index().map(|i| 1u32 << i).unwrap_or(0)
    }

    /// Decode a hamlib mode mask. Anything other than exactly one known bit
    /// is `Unknown`.
    pub fn from_bits(bits: u32) -> RigMode {
        if bits.count_ones() != 1 {
            return RigMode::Unknown;
        }
        Self::from_selector_index(bits.trailing_zeros() as usize)
    }

    pub fn label(self) -> &'static str {
        match self {
            RigMode::AM => "AM",
            RigMode::CW => "CW",
            RigMode::USB => "USB",
            RigMode::LSB => "LSB",
            RigMode::RTTY => "RTTY",
            RigMode::FMNarrow => "FM Narrow",
            RigMode::FMWide => "FM Wide",
            RigMode::CWR => "CW Rev",
            RigMode::RTTYR => "RTTY Rev",
            RigMode::AMSync => "AM Synch",
            RigMode::PktLSB => "Packet (LSB)",
            RigMode::PktUSB => "Packet (USB)",
            RigMode::PktFM => "Packet (FM)",
            RigMode::DataUSB => "ECUSB",
            RigMode::DataLSB => "ECLSB",
            RigMode::FAX => "FAX",
            RigMode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receiver passband category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passband {
    Wide,
    Normal,
    Narrow,
    /// Explicit width in Hz.
    User(u32),
}

impl Passband {
    pub fn selector_index(self) -> usize {
        match self {
            Passband::Wide => 0,
            Passband::Normal => 1,
            Passband::Narrow => 2,
            Passband::User(_) => 3,
        }
    }

    /// The selector cannot produce a user width, so anything past
    /// `Narrow` folds back to `Normal`.
    pub fn from_selector_index(index: usize) -> Passband {
        match index {
            0 => Passband::Wide,
            2 => Passband::Narrow,
            _ => Passband::Normal,
        }
    }
}

impl fmt::Display for Passband {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Passband::Wide => f.write_str("Wide"),
            Passband::Normal => f.write_str("Normal"),
            Passband::Narrow => f.write_str("Narrow"),
            Passband::User(hz) => write!(f, "{} Hz", hz),
        }
    }
}

/// Automatic gain control setting.
///
/// Ordering follows the protocol level, where `Medium` was appended after
/// `Slow`: off < super-fast < fast < slow < medium. `Unsupported` does not
/// compare with anything but itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agc {
    Off,
    SuperFast,
    Fast,
    Slow,
    Medium,
    Unsupported,
}

impl Agc {
    /// Selector order, which is not the level order.
    pub const SELECTOR: [Agc; 5] = [Agc::Off, Agc::SuperFast, Agc::Fast, Agc::Medium, Agc::Slow];

    /// Protocol level. Level 4 is the backend-specific "user" setting,
    /// which this crate reports as `Unsupported`.
    pub fn level(self) -> Option<u8> {
        match self {
            Agc::Off => Some(0),
            Agc::SuperFast => Some(1),
            Agc::Fast => Some(2),
            Agc::Slow => Some(3),
            Agc::Medium => Some(5),
            Agc::Unsupported => None,
        }
    }

    pub fn from_level(level: u8) -> Agc {
        match level {
            0 => Agc::Off,
            1 => Agc::SuperFast,
            2 => Agc::Fast,
            3 => Agc::Slow,
            5 => Agc::Medium,
            _ => Agc::Unsupported,
        }
    }

    pub fn selector_index(self) -> Option<usize> {
        Self::SELECTOR.iter().position(|a| *a == self)
    }

    pub fn from_selector_index(index: usize) -> Option<Agc> {
        Self::SELECTOR.get(index).copied()
    }
}

impl PartialOrd for Agc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self.level(), other.level()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

impl fmt::Display for Agc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Agc::Off => "AGC OFF",
            Agc::SuperFast => "Super Fast",
            Agc::Fast => "Fast",
            Agc::Slow => "Slow",
            Agc::Medium => "Medium",
            Agc::Unsupported => "Unsupported",
        };
        f.write_str(label)
    }
}
