// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Executor that bounds and times every call into a RigTransport.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::rig::error::{TransportError, TransportResult};
use crate::rig::field::{FieldValue, RigField};
use crate::rig::RigTransport;

/// Executor that delegates to a RigTransport under a per-call timeout.
pub struct TransportExecutor<'a> {
    transport: &'a mut dyn RigTransport,
    call_timeout: Duration,
}

impl<'a> TransportExecutor<'a> {
    pub fn new(transport: &'a mut dyn RigTransport, call_timeout: Duration) -> Self {
        Self {
            transport,
            call_timeout,
        }
    }

    pub async fn get(&mut self, field: RigField) -> TransportResult<FieldValue> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, self.transport.get(field))
            .await
            .unwrap_or(Err(TransportError::Timeout(self.call_timeout)));
        self.log_timing("get", field, started.elapsed());
        match result {
            Ok(value) if value.field() != field => Err(TransportError::Protocol(format!(
                "asked for {}, got {}",
                field, value
            ))),
            other => other,
        }
    }

    pub async fn set(&mut self, value: FieldValue) -> TransportResult<()> {
        let field = value.field();
        let started = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, self.transport.set(value))
            .await
            .unwrap_or(Err(TransportError::Timeout(self.call_timeout)));
        self.log_timing("set", field, started.elapsed());
        result
    }

    pub async fn close(&mut self) -> TransportResult<()> {
        tokio::time::timeout(self.call_timeout, self.transport.close())
            .await
            .unwrap_or(Err(TransportError::Timeout(self.call_timeout)))
    }

    fn log_timing(&self, op: &str, field: RigField, elapsed: Duration) {
        if elapsed > self.call_timeout / 2 {
            warn!("Transport {} {} took {:?}", op, field, elapsed);
        } else {
            debug!("Transport {} {} completed in {:?}", op, field, elapsed);
        }
    }
}
