// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Request channel between consumers and the daemon.
//!
//! At most one request per field is pending. A newer submission for the
//! same field replaces the older one and moves to the back of the queue,
//! so the queue is bounded by [`RigField::COUNT`](crate::RigField::COUNT)
//! and never blocks.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::rig::error::{RigError, RigResult};
use crate::rig::field::{FieldSet, FieldValue};
use crate::rig::request::RigRequest;

/// Outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Queued,
    /// Replaced a pending request for the same field.
    Coalesced,
    /// Arrived after shutdown began and was dropped.
    Discarded,
}

/// Anything a consumer can hand a write to.
pub trait RequestSink: Send + Sync {
    fn submit(&self, value: FieldValue) -> RigResult<Submitted>;
}

#[derive(Debug, Default)]
struct Pending {
    queue: VecDeque<RigRequest>,
    next_seq: u64,
    closed: bool,
}

#[derive(Debug)]
pub struct RequestChannel {
    writable: FieldSet,
    pending: Mutex<Pending>,
    notify: Notify,
}

impl RequestChannel {
    /// Channel accepting writes for the `writable` fields only.
    pub fn new(writable: FieldSet) -> Self {
        Self {
            writable,
            pending: Mutex::new(Pending::default()),
            notify: Notify::new(),
        }
    }

    pub fn writable(&self) -> FieldSet {
        self.writable
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a write without blocking.
    pub fn submit(&self, value: FieldValue) -> RigResult<Submitted> {
        let field = value.field();
        if !self.writable.contains(field) {
            return Err(RigError::UnsupportedField(field));
        }

        let outcome = {
            let mut pending = self.lock();
            if pending.closed {
                return Err(RigError::ShutdownInProgress);
            }
            let before = pending.queue.len();
            pending.queue.retain(|req| req.field() != field);
            let outcome = if pending.queue.len() < before {
                Submitted::Coalesced
            } else {
                Submitted::Queued
            };
            pending.next_seq += 1;
            let seq = pending.next_seq;
            pending.queue.push_back(RigRequest { value, seq });
            outcome
        };

        self.notify.notify_one();
        Ok(outcome)
    }

    /// Take every pending request in submission order.
    pub fn drain_all(&self) -> Vec<RigRequest> {
        self.lock().queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse further submissions. Requests already queued stay drainable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Resolves after the next submission or close. A wake-up that
    /// happened while nobody waited is kept for the next caller.
    pub async fn notified(&self) {
        self.notify.notified().await
    }
}

impl RequestSink for RequestChannel {
    fn submit(&self, value: FieldValue) -> RigResult<Submitted> {
        RequestChannel::submit(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::freq::Freq;
    use crate::rig::field::RigField;
    use crate::rig::mode::{Agc, RigMode};

    fn channel() -> RequestChannel {
        RequestChannel::new(FieldSet::all())
    }

    #[test]
    fn test_submit_and_drain_in_order() {
        let ch = channel();
        assert_eq!(
            ch.submit(FieldValue::Mode(RigMode::USB)),
            Ok(Submitted::Queued)
        );
        assert_eq!(ch.submit(FieldValue::Ptt(true)), Ok(Submitted::Queued));
        assert_eq!(ch.len(), 2);

        let drained = ch.drain_all();
        assert_eq!(
            drained.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
            vec![FieldValue::Mode(RigMode::USB), FieldValue::Ptt(true)]
        );
        assert!(drained[0].seq < drained[1].seq);
        assert!(ch.is_empty());
    }

    #[test]
    fn test_same_field_coalesces_to_latest() {
        let ch = channel();
        ch.submit(FieldValue::Frequency(Freq::new(7_000_000))).unwrap();
        ch.submit(FieldValue::Agc(Agc::Slow)).unwrap();
        assert_eq!(
            ch.submit(FieldValue::Frequency(Freq::new(7_010_000))),
            Ok(Submitted::Coalesced)
        );

        let drained = ch.drain_all();
        // The replacement moves behind the AGC request
        assert_eq!(
            drained.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
            vec![
                FieldValue::Agc(Agc::Slow),
                FieldValue::Frequency(Freq::new(7_010_000))
            ]
        );
    }

    #[test]
    fn test_unwritable_field_rejected() {
        let ch = RequestChannel::new(FieldSet::of(&[RigField::Frequency]));
        assert_eq!(
            ch.submit(FieldValue::SignalStrength(0)),
            Err(RigError::UnsupportedField(RigField::SignalStrength))
        );
        assert_eq!(
            ch.submit(FieldValue::Ptt(true)),
            Err(RigError::UnsupportedField(RigField::Ptt))
        );
        assert!(ch.is_empty());
    }

    #[test]
    fn test_drain_empty_is_noop() {
        let ch = channel();
        assert!(ch.drain_all().is_empty());
        assert!(ch.drain_all().is_empty());
    }

    #[test]
    fn test_closed_channel_refuses() {
        let ch = channel();
        ch.submit(FieldValue::Ptt(false)).unwrap();
        ch.close();
        assert!(ch.is_closed());
        assert_eq!(
            ch.submit(FieldValue::Ptt(true)),
            Err(RigError::ShutdownInProgress)
        );
        // Already-queued work is still handed out
        assert_eq!(ch.drain_all().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_wakes_waiter() {
        let ch = std::sync::Arc::new(channel());
        let waiter = {
            let ch = ch.clone();
            tokio::spawn(async move {
                ch.notified().await;
                ch.drain_all()
            })
        };
        tokio::task::yield_now().await;
        ch.submit(FieldValue::Mode(RigMode::CW)).unwrap();
        let drained = waiter.await.unwrap();
        assert_eq!(drained.len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn field_value() -> impl Strategy<Value = FieldValue> {
            prop_oneof![
                (0u64..30_000_000).prop_map(|hz| FieldValue::Frequency(Freq::new(hz))),
                (0usize..16).prop_map(|i| FieldValue::Mode(RigMode::from_selector_index(i))),
                (0usize..5).prop_map(|i| FieldValue::Agc(
                    Agc::from_selector_index(i).unwrap_or(Agc::Off)
                )),
                any::<bool>().prop_map(FieldValue::Ptt),
            ]
        }

        proptest! {
            #[test]
            fn last_submission_per_field_wins(values in prop::collection::vec(field_value(), 0..64)) {
                let ch = channel();
                for value in &values {
                    ch.submit(value.clone()).unwrap();
                }
                let drained = ch.drain_all();

                // One request per distinct field
                let fields: FieldSet = values.iter().map(FieldValue::field).collect();
                prop_assert_eq!(drained.len(), fields.len());
                prop_assert!(drained.len() <= RigField::COUNT);

                for req in &drained {
                    let last = values.iter().rev().find(|v| v.field() == req.field());
                    prop_assert_eq!(Some(&req.value), last);
                }

                // Across fields, order of each field's last submission is kept
                let mut expected: Vec<RigField> = Vec::new();
                for value in values.iter().rev() {
                    if !expected.contains(&value.field()) {
                        expected.push(value.field());
                    }
                }
                expected.reverse();
                prop_assert_eq!(drained.iter().map(RigRequest::field).collect::<Vec<_>>(), expected);
                prop_assert!(drained.windows(2).all(|w| w[0].seq < w[1].seq));
            }
        }
    }
}
