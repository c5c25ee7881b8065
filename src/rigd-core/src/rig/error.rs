// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::Duration;

use thiserror::Error;

use crate::rig::field::RigField;

/// Failure of a single Device Transport call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} is not supported by this backend")]
    Unsupported(RigField),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unknown rig model: {0}")]
    UnknownModel(String),

    #[error("transport closed")]
    Closed,
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced by the daemon and its consumer API.
///
/// Only [`RigError::FatalStartup`] ever reaches the owning process; the
/// remaining variants are contained by the daemon or the submit path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RigError {
    #[error("cannot bind rig model {model}: {reason}")]
    FatalStartup { model: String, reason: String },

    #[error("{field}: {source}")]
    TransientIo {
        field: RigField,
        #[source]
        source: TransportError,
    },

    #[error("{0} is not supported by the bound rig")]
    UnsupportedField(RigField),

    #[error("daemon is shutting down")]
    ShutdownInProgress,
}

pub type RigResult<T> = Result<T, RigError>;

impl RigError {
    pub fn fatal_startup(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::FatalStartup {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transient(field: RigField, source: TransportError) -> Self {
        Self::TransientIo { field, source }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalStartup { .. })
    }
}
