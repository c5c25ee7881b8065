// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-control bindings used by consumers.
//!
//! A control is synchronised from the cache with [`FieldControl::refresh`],
//! which only changes what is shown. Writes to the rig happen only through
//! [`FieldControl::on_user_change`].

use std::time::Duration;

use crate::channel::{RequestSink, Submitted};
use crate::rig::error::{RigError, RigResult};
use crate::rig::field::{FieldValue, RigField};
use crate::rig::state::RigState;

/// Binding between one displayed control and one rig field.
#[derive(Debug, Clone)]
pub struct FieldControl {
    field: RigField,
    shown: Option<FieldValue>,
    seen_seq: u64,
}

impl FieldControl {
    pub fn new(field: RigField) -> Self {
        Self {
            field,
            shown: None,
            seen_seq: 0,
        }
    }

    pub fn field(&self) -> RigField {
        self.field
    }

    /// Value the control currently displays.
    pub fn shown(&self) -> Option<&FieldValue> {
        self.shown.as_ref()
    }

    /// Synchronise the control from a cache snapshot.
    ///
    /// Returns the value to render when a newer publish differs from what
    /// is shown. Never submits anything.
    pub fn refresh(&mut self, state: &RigState) -> Option<&FieldValue> {
        if !state.has_capability(self.field) {
            return None;
        }
        let stamp = state.stamp(self.field);
        if stamp.seq <= self.seen_seq {
            return None;
        }
        self.seen_seq = stamp.seq;

        let value = state.get(self.field)?;
        if self.shown.as_ref() == Some(&value) {
            return None;
        }
        self.shown = Some(value);
        self.shown.as_ref()
    }

    /// Handle an edit made by the user on this control.
    ///
    /// The control shows the edit only once the sink has accepted it.
    pub fn on_user_change(
        &mut self,
        value: FieldValue,
        sink: &dyn RequestSink,
    ) -> RigResult<Submitted> {
        if value.field() != self.field {
            return Err(RigError::UnsupportedField(value.field()));
        }
        let outcome = sink.submit(value.clone())?;
        if outcome != Submitted::Discarded {
            self.shown = Some(value);
        }
        Ok(outcome)
    }

    /// True when the field has not been confirmed within `max_age`.
    pub fn is_stale(&self, state: &RigState, max_age: Duration) -> bool {
        state.age(self.field).map_or(true, |age| age > max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    use crate::radio::freq::Freq;
    use crate::rig::field::FieldSet;
    use crate::rig::mode::RigMode;
    use crate::rig::state::FieldStamp;

    #[derive(Default)]
    struct RecordingSink {
        submitted: Mutex<Vec<FieldValue>>,
    }

    impl RequestSink for RecordingSink {
        fn submit(&self, value: FieldValue) -> RigResult<Submitted> {
            self.submitted.lock().unwrap().push(value);
            Ok(Submitted::Queued)
        }
    }

    struct StoppedSink;

    impl RequestSink for StoppedSink {
        fn submit(&self, _value: FieldValue) -> RigResult<Submitted> {
            Ok(Submitted::Discarded)
        }
    }

    fn state_with(value: FieldValue, seq: u64) -> RigState {
        let mut state = RigState {
            readable: FieldSet::all(),
            writable: FieldSet::all(),
            ..Default::default()
        };
        state.apply(
            value,
            FieldStamp {
                seq,
                at: Some(Instant::now()),
            },
        );
        state
    }

    #[test]
    fn test_refresh_never_enqueues() {
        let sink = RecordingSink::default();
        let mut control = FieldControl::new(RigField::Mode);

        for (seq, mode) in [(1, RigMode::USB), (2, RigMode::LSB), (3, RigMode::CW)] {
            let state = state_with(FieldValue::Mode(mode), seq);
            assert_eq!(control.refresh(&state), Some(&FieldValue::Mode(mode)));
        }
        assert!(sink.submitted.lock().unwrap().is_empty());

        control
            .on_user_change(FieldValue::Mode(RigMode::AM), &sink)
            .unwrap();
        assert_eq!(
            *sink.submitted.lock().unwrap(),
            vec![FieldValue::Mode(RigMode::AM)]
        );
    }

    #[test]
    fn test_refresh_skips_unchanged_and_old() {
        let mut control = FieldControl::new(RigField::Frequency);
        let value = FieldValue::Frequency(Freq::new(3_573_000));

        assert!(control.refresh(&state_with(value.clone(), 1)).is_some());
        // Same publish seen twice
        assert!(control.refresh(&state_with(value.clone(), 1)).is_none());
        // Newer publish of the same value
        assert!(control.refresh(&state_with(value.clone(), 2)).is_none());
        assert_eq!(control.shown(), Some(&value));
    }

    #[test]
    fn test_refresh_ignores_unreadable_field() {
        let mut control = FieldControl::new(RigField::Ptt);
        let mut state = state_with(FieldValue::Ptt(true), 1);
        state.readable = FieldSet::empty();
        assert!(control.refresh(&state).is_none());
        assert!(control.shown().is_none());
    }

    #[test]
    fn test_user_change_for_other_field_rejected() {
        let sink = RecordingSink::default();
        let mut control = FieldControl::new(RigField::Agc);
        assert_eq!(
            control.on_user_change(FieldValue::Ptt(true), &sink),
            Err(RigError::UnsupportedField(RigField::Ptt))
        );
        assert!(sink.submitted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_discarded_change_keeps_confirmed_value() {
        let mut control = FieldControl::new(RigField::Mode);
        control.refresh(&state_with(FieldValue::Mode(RigMode::USB), 1));

        assert_eq!(
            control.on_user_change(FieldValue::Mode(RigMode::CW), &StoppedSink),
            Ok(Submitted::Discarded)
        );
        assert_eq!(control.shown(), Some(&FieldValue::Mode(RigMode::USB)));

        let sink = RecordingSink::default();
        control
            .on_user_change(FieldValue::Mode(RigMode::CW), &sink)
            .unwrap();
        assert_eq!(control.shown(), Some(&FieldValue::Mode(RigMode::CW)));
    }

    #[test]
    fn test_staleness() {
        let control = FieldControl::new(RigField::Mode);
        assert!(control.is_stale(&RigState::default(), Duration::from_secs(60)));
        let state = state_with(FieldValue::Mode(RigMode::USB), 1);
        assert!(!control.is_stale(&state, Duration::from_secs(60)));
    }
}
