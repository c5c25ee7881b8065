// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Scriptable transport for tests.
//!
//! The transport itself moves into the daemon; the paired [`MockHandle`]
//! stays with the test to inject failures and latency and to inspect the
//! calls that reached the "hardware".

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rigd_core::rig::{
    BackendStatus, RigCapabilities, RigInfo, RigTransport, TransportFuture,
};
use rigd_core::{FieldSet, FieldValue, RigField, TransportError};

pub const MOCK_MODEL_ID: u32 = 9999;

/// One call as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Get(RigField),
    Set(FieldValue),
    Close,
}

#[derive(Debug, Default)]
struct Script {
    values: [Option<FieldValue>; RigField::COUNT],
    fail_get: FieldSet,
    fail_set: FieldSet,
    latency: Duration,
    calls: Vec<MockCall>,
    close_count: usize,
    fail_close: bool,
    closed: bool,
}

/// Test-side controls for a [`MockTransport`].
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    script: Arc<Mutex<Script>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value the rig reports for its field from now on.
    pub fn set_value(&self, value: FieldValue) {
        let index = value.field().index();
        self.lock().values[index] = Some(value);
    }

    pub fn value(&self, field: RigField) -> Option<FieldValue> {
        self.lock().values[field.index()].clone()
    }

    pub fn fail_get(&self, field: RigField, fail: bool) {
        let mut script = self.lock();
        if fail {
            script.fail_get.insert(field);
        } else {
            script.fail_get.remove(field);
        }
    }

    pub fn fail_set(&self, field: RigField, fail: bool) {
        let mut script = self.lock();
        if fail {
            script.fail_set.insert(field);
        } else {
            script.fail_set.remove(field);
        }
    }

    /// Make `close` report an I/O error. The transport is closed either way.
    pub fn fail_close(&self, fail: bool) {
        self.lock().fail_close = fail;
    }

    /// Delay applied to every get and set.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Values written, in the order they reached the transport.
    pub fn sets(&self) -> Vec<FieldValue> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Set(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn get_count(&self, field: RigField) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == MockCall::Get(field))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }
}

pub struct MockTransport {
    info: RigInfo,
    handle: MockHandle,
}

impl MockTransport {
    pub fn new(capabilities: RigCapabilities) -> (MockTransport, MockHandle) {
        let handle = MockHandle::default();
        let transport = MockTransport {
            info: RigInfo {
                model_id: MOCK_MODEL_ID,
                manufacturer: "rigd".to_string(),
                model: "Mock".to_string(),
                version: "0.0".to_string(),
                status: BackendStatus::Untested,
                capabilities,
            },
            handle: handle.clone(),
        };
        (transport, handle)
    }

    /// Mock with every field readable and everything but strength writable.
    pub fn full() -> (MockTransport, MockHandle) {
        let mut writable = FieldSet::all();
        writable.remove(RigField::SignalStrength);
        Self::new(RigCapabilities::new(FieldSet::all(), writable))
    }
}

impl RigTransport for MockTransport {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn get<'a>(&'a mut self, field: RigField) -> TransportFuture<'a, FieldValue> {
        let (latency, result) = {
            let mut script = self.handle.lock();
            script.calls.push(MockCall::Get(field));
            let result = if script.closed {
                Err(TransportError::Closed)
            } else if !self.info.capabilities.can_read(field) {
                Err(TransportError::Unsupported(field))
            } else if script.fail_get.contains(field) {
                Err(TransportError::Io(format!("injected get failure on {}", field)))
            } else {
                script.values[field.index()]
                    .clone()
                    .ok_or_else(|| TransportError::Protocol(format!("no value for {}", field)))
            };
            (script.latency, result)
        };
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        })
    }

    fn set<'a>(&'a mut self, value: FieldValue) -> TransportFuture<'a, ()> {
        let field = value.field();
        let (latency, result) = {
            let mut script = self.handle.lock();
            script.calls.push(MockCall::Set(value.clone()));
            let result = if script.closed {
                Err(TransportError::Closed)
            } else if !self.info.capabilities.can_write(field) {
                Err(TransportError::Unsupported(field))
            } else if script.fail_set.contains(field) {
                Err(TransportError::Io(format!("injected set failure on {}", field)))
            } else {
                script.values[field.index()] = Some(value);
                Ok(())
            };
            (script.latency, result)
        };
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        })
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        let result = {
            let mut script = self.handle.lock();
            script.calls.push(MockCall::Close);
            script.close_count += 1;
            script.closed = true;
            if script.fail_close {
                Err(TransportError::Io("injected close failure".to_string()))
            } else {
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}
