// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::rig::error::TransportResult;
use crate::rig::field::{FieldSet, FieldValue, RigField};

pub mod controller;
pub mod error;
pub mod field;
pub mod mode;
pub mod request;
pub mod state;

/// Alias to reduce type complexity in RigTransport.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Maturity of a backend, shown in the backend listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    Alpha,
    Untested,
    Beta,
    Stable,
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendStatus::Alpha => "Alpha",
            BackendStatus::Untested => "Untested",
            BackendStatus::Beta => "Beta",
            BackendStatus::Stable => "Stable",
        };
        f.write_str(label)
    }
}

/// Which fields a bound transport supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigCapabilities {
    /// Fields the daemon may poll.
    pub readable: FieldSet,
    /// Fields consumers may submit writes for.
    pub writable: FieldSet,
}

impl RigCapabilities {
    pub fn new(readable: FieldSet, writable: FieldSet) -> Self {
        Self { readable, writable }
    }

    pub fn can_read(&self, field: RigField) -> bool {
        self.readable.contains(field)
    }

    pub fn can_write(&self, field: RigField) -> bool {
        self.writable.contains(field)
    }
}

/// Static info describing a rig backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigInfo {
    pub model_id: u32,
    pub manufacturer: String,
    pub model: String,
    pub version: String,
    pub status: BackendStatus,
    pub capabilities: RigCapabilities,
}

/// Parameters used to bind a transport to a physical rig.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenParams {
    pub model_id: u32,
    /// Device path; `None` lets the backend pick its default.
    pub port: Option<String>,
    pub speed: Option<u32>,
    /// CI-V address, only meaningful for ICOM backends.
    pub civ_address: Option<u8>,
}

impl fmt::Display for OpenParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.model_id)?;
        if let Some(port) = &self.port {
            write!(f, " on {}", port)?;
        }
        if let Some(speed) = self.speed {
            write!(f, " @ {} baud", speed)?;
        }
        if let Some(addr) = self.civ_address {
            write!(f, " civ 0x{:02x}", addr)?;
        }
        Ok(())
    }
}

/// Exclusive handle to one physical rig.
///
/// A transport serves one call at a time; the daemon is its only caller.
/// Opening is the job of the backend registry, so the trait starts at an
/// already bound handle.
pub trait RigTransport: Send {
    fn info(&self) -> &RigInfo;

    fn get<'a>(&'a mut self, field: RigField) -> TransportFuture<'a, FieldValue>;

    fn set<'a>(&'a mut self, value: FieldValue) -> TransportFuture<'a, ()>;

    /// Release the device. Called once by the daemon at shutdown.
    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()>;

    fn capabilities(&self) -> RigCapabilities {
        self.info().capabilities
    }
}
