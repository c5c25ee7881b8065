// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod cache;
pub mod channel;
pub mod consumer;
pub mod meter;
pub mod radio;
pub mod rig;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use cache::{CacheReader, StateCache};
pub use channel::{RequestChannel, RequestSink, Submitted};
pub use consumer::FieldControl;
pub use meter::{MeterCurve, NeedleSmoother, SignalMeter};
pub use radio::freq::Freq;
pub use rig::error::{RigError, RigResult, TransportError, TransportResult};
pub use rig::field::{FieldSet, FieldValue, RigField};
pub use rig::mode::{Agc, Passband, RigMode};
pub use rig::request::RigRequest;
pub use rig::state::{FieldStamp, RigState, TX_SIGNAL_SENTINEL_DB};
pub use rig::{BackendStatus, OpenParams, RigCapabilities, RigInfo, RigTransport, TransportFuture};
