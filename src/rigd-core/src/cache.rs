// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Shared state cache.
//!
//! The daemon owns the only [`StateCache`] and publishes one field at a
//! time; any number of [`CacheReader`]s take snapshots without touching
//! the transport. Readers never wait on a hardware call: the watch lock
//! is held only for the copy of one field or one snapshot.

use std::time::Instant;

use tokio::sync::watch;

use crate::rig::field::{FieldValue, RigField};
use crate::rig::state::{FieldStamp, RigState};
use crate::rig::RigCapabilities;

/// Single writer side of the cache.
#[derive(Debug)]
pub struct StateCache {
    tx: watch::Sender<RigState>,
    seq: u64,
}

/// Cloneable read side of the cache.
#[derive(Debug, Clone)]
pub struct CacheReader {
    rx: watch::Receiver<RigState>,
}

impl StateCache {
    /// Create a cache holding the unknown state.
    pub fn new() -> (StateCache, CacheReader) {
        let (tx, rx) = watch::channel(RigState::default());
        (StateCache { tx, seq: 0 }, CacheReader { rx })
    }

    pub fn reader(&self) -> CacheReader {
        CacheReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Record the capability sets of the bound transport. Fields that are
    /// not readable are reset to unknown.
    pub fn set_capabilities(&self, caps: &RigCapabilities) {
        self.tx.send_modify(|state| {
            state.readable = caps.readable;
            state.writable = caps.writable;
            state.clear_unreadable();
        });
    }

    /// Publish one field and advance its freshness marker.
    ///
    /// Values for fields outside the readable set are dropped and `false`
    /// is returned.
    pub fn publish(&mut self, value: FieldValue) -> bool {
        let field = value.field();
        if !self.tx.borrow().readable.contains(field) {
            return false;
        }
        self.seq += 1;
        let stamp = FieldStamp {
            seq: self.seq,
            at: Some(Instant::now()),
        };
        self.tx.send_modify(|state| state.apply(value, stamp));
        true
    }

    pub fn current(&self) -> RigState {
        self.tx.borrow().clone()
    }

    /// Number of values published so far.
    pub fn publish_count(&self) -> u64 {
        self.seq
    }
}

impl CacheReader {
    /// Latest published snapshot.
    pub fn read(&self) -> RigState {
        self.rx.borrow().clone()
    }

    pub fn has_capability(&self, field: RigField) -> bool {
        self.rx.borrow().readable.contains(field)
    }

    pub fn get(&self, field: RigField) -> Option<FieldValue> {
        self.rx.borrow().get(field)
    }

    /// Wait for the next publish. Returns `false` once the cache has been
    /// dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
