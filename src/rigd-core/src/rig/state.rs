// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::radio::freq::Freq;
use crate::rig::field::{FieldSet, FieldValue, RigField};
use crate::rig::mode::{Agc, Passband, RigMode};

/// Strength published while transmitting, a quiet receiver.
pub const TX_SIGNAL_SENTINEL_DB: i32 = -54;

/// When a cached field was last confirmed from the rig.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStamp {
    /// Publish sequence, 0 if the field was never published.
    pub seq: u64,
    #[serde(skip)]
    pub at: Option<Instant>,
}

impl FieldStamp {
    pub fn is_set(&self) -> bool {
        self.seq != 0
    }
}

/// Last-known rig parameters held by the state cache.
///
/// A field is `None` until it has been read from the rig, and stays `None`
/// for the lifetime of the daemon when it is not in `readable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigState {
    pub frequency: Option<Freq>,
    pub mode: Option<RigMode>,
    pub passband: Option<Passband>,
    pub agc: Option<Agc>,
    pub ptt: Option<bool>,
    pub signal_strength: Option<i32>,
    /// Fields the bound transport can read back.
    pub readable: FieldSet,
    /// Fields the bound transport accepts writes for.
    pub writable: FieldSet,
    pub freshness: [FieldStamp; RigField::COUNT],
}

impl RigState {
    pub fn has_capability(&self, field: RigField) -> bool {
        self.readable.contains(field)
    }

    pub fn stamp(&self, field: RigField) -> FieldStamp {
        self.freshness[field.index()]
    }

    /// Time since the field was last published, `None` if never.
    pub fn age(&self, field: RigField) -> Option<Duration> {
        self.stamp(field).at.map(|at| at.elapsed())
    }

    pub fn get(&self, field: RigField) -> Option<FieldValue> {
        match field {
            RigField::Frequency => self.frequency.map(FieldValue::Frequency),
            RigField::Mode => self.mode.map(FieldValue::Mode),
            RigField::Passband => self.passband.map(FieldValue::Passband),
            RigField::Agc => self.agc.map(FieldValue::Agc),
            RigField::Ptt => self.ptt.map(FieldValue::Ptt),
            RigField::SignalStrength => self.signal_strength.map(FieldValue::SignalStrength),
        }
    }

    /// True while the cached PTT says the rig is transmitting.
    pub fn transmitting(&self) -> bool {
        self.ptt.unwrap_or(false)
    }

    pub(crate) fn apply(&mut self, value: FieldValue, stamp: FieldStamp) {
        let field = value.field();
        match value {
            FieldValue::Frequency(v) => self.frequency = Some(v),
            FieldValue::Mode(v) => self.mode = Some(v),
            FieldValue::Passband(v) => self.passband = Some(v),
            FieldValue::Agc(v) => self.agc = Some(v),
            FieldValue::Ptt(v) => self.ptt = Some(v),
            FieldValue::SignalStrength(v) => self.signal_strength = Some(v),
        }
        self.freshness[field.index()] = stamp;
    }

    /// Reset every field not in `readable` to unknown.
    pub(crate) fn clear_unreadable(&mut self) {
        for field in RigField::ALL {
            if self.readable.contains(field) {
                continue;
            }
            match field {
                RigField::Frequency => self.frequency = None,
                RigField::Mode => self.mode = None,
                RigField::Passband => self.passband = None,
                RigField::Agc => self.agc = None,
                RigField::Ptt => self.ptt = None,
                RigField::SignalStrength => self.signal_strength = None,
            }
            self.freshness[field.index()] = FieldStamp::default();
        }
    }
}
