// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Daemon controller components.
//!
//! This module contains the phase machine driving the daemon loop, the
//! policies deciding which fields are polled on each tick, and the timed
//! executor wrapping every transport call.

pub mod executor;
pub mod machine;
pub mod policies;

pub use executor::TransportExecutor;
pub use machine::{DaemonEvent, DaemonMachine, DaemonPhase};
pub use policies::{FixedPolling, PollingPolicy, RotatingPolling};
