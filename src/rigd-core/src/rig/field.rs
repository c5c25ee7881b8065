// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Addressable rig parameters and their values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::radio::freq::Freq;
use crate::rig::mode::{Agc, Passband, RigMode};

/// A single parameter the daemon can read from or write to the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigField {
    Frequency,
    Mode,
    Passband,
    Agc,
    Ptt,
    SignalStrength,
}

impl RigField {
    pub const COUNT: usize = 6;

    /// All fields in polling order. PTT precedes signal strength so the
    /// strength read can see the transmit state of the same cycle.
    pub const ALL: [RigField; RigField::COUNT] = [
        RigField::Frequency,
        RigField::Mode,
        RigField::Passband,
        RigField::Agc,
        RigField::Ptt,
        RigField::SignalStrength,
    ];

    pub fn index(self) -> usize {
        match self {
            RigField::Frequency => 0,
            RigField::Mode => 1,
            RigField::Passband => 2,
            RigField::Agc => 3,
            RigField::Ptt => 4,
            RigField::SignalStrength => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RigField::Frequency => "frequency",
            RigField::Mode => "mode",
            RigField::Passband => "passband",
            RigField::Agc => "agc",
            RigField::Ptt => "ptt",
            RigField::SignalStrength => "signal_strength",
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for RigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compact set of [`RigField`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<RigField>", from = "Vec<RigField>")]
pub struct FieldSet(u8);

impl FieldSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        RigField::ALL.into_iter().collect()
    }

    pub fn of(fields: &[RigField]) -> Self {
        fields.iter().copied().collect()
    }

    pub fn contains(&self, field: RigField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn insert(&mut self, field: RigField) {
        self.0 |= field.bit();
    }

    pub fn remove(&mut self, field: RigField) {
        self.0 &= !field.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 | other.0)
    }

    pub fn intersection(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 & other.0)
    }

    /// Members in [`RigField::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = RigField> + '_ {
        RigField::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<RigField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = RigField>>(iter: I) -> Self {
        let mut set = FieldSet::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl From<Vec<RigField>> for FieldSet {
    fn from(fields: Vec<RigField>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<FieldSet> for Vec<RigField> {
    fn from(set: FieldSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A typed value for one [`RigField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Frequency(Freq),
    Mode(RigMode),
    Passband(Passband),
    Agc(Agc),
    Ptt(bool),
    /// dB relative to S9.
    SignalStrength(i32),
}

impl FieldValue {
    pub fn field(&self) -> RigField {
        match self {
            FieldValue::Frequency(_) => RigField::Frequency,
            FieldValue::Mode(_) => RigField::Mode,
            FieldValue::Passband(_) => RigField::Passband,
            FieldValue::Agc(_) => RigField::Agc,
            FieldValue::Ptt(_) => RigField::Ptt,
            FieldValue::SignalStrength(_) => RigField::SignalStrength,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Frequency(freq) => write!(f, "frequency={}", freq),
            FieldValue::Mode(mode) => write!(f, "mode={}", mode),
            FieldValue::Passband(pb) => write!(f, "passband={}", pb),
            FieldValue::Agc(agc) => write!(f, "agc={}", agc),
            FieldValue::Ptt(ptt) => write!(f, "ptt={}", if *ptt { "on" } else { "off" }),
            FieldValue::SignalStrength(db) => write!(f, "signal_strength={}dB", db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_indices_are_dense() {
        for (i, field) in RigField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_field_set_ops() {
        let mut set = FieldSet::of(&[RigField::Frequency, RigField::Ptt]);
        assert!(set.contains(RigField::Frequency));
        assert!(!set.contains(RigField::Mode));
        assert_eq!(set.len(), 2);

        set.insert(RigField::Mode);
        set.remove(RigField::Frequency);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![RigField::Mode, RigField::Ptt]
        );

        let other = FieldSet::of(&[RigField::Ptt, RigField::Agc]);
        assert_eq!(set.intersection(other), FieldSet::of(&[RigField::Ptt]));
        assert_eq!(set.union(other).len(), 3);
        assert!(FieldSet::empty().is_empty());
        assert_eq!(FieldSet::all().len(), RigField::COUNT);
    }

    #[test]
    fn test_value_knows_its_field() {
        assert_eq!(
            FieldValue::Frequency(Freq::new(1)).field(),
            RigField::Frequency
        );
        assert_eq!(FieldValue::Agc(Agc::Slow).field(), RigField::Agc);
        assert_eq!(
            FieldValue::SignalStrength(-3).field(),
            RigField::SignalStrength
        );
    }

    #[test]
    fn test_field_set_serializes_as_list() {
        let set = FieldSet::of(&[RigField::Ptt, RigField::Frequency]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["frequency","ptt"]"#);
        let back: FieldSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
