// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Daemon phase machine.
//!
//! This module provides an explicit state machine for the daemon loop,
//! making phase transitions clear and rejecting out-of-order events.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Events that can trigger phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonEvent {
    /// Transport bound and initial poll published
    Opened,
    /// Transport could not be bound
    OpenFailed,
    /// Tick elapsed or a request arrived
    Woke,
    /// Pending requests applied
    Drained,
    /// Due fields read back
    Polled,
    /// External stop signal observed
    StopRequested,
    /// Transport closed
    Closed,
}

/// The current phase of the daemon loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonPhase {
    #[default]
    Starting,
    Idle,
    Draining,
    Polling,
    Stopping,
    Stopped,
}

impl DaemonPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// True once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl fmt::Display for DaemonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Idle => write!(f, "Idle"),
            Self::Draining => write!(f, "Draining"),
            Self::Polling => write!(f, "Polling"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// The phase machine that manages daemon transitions.
#[derive(Debug, Clone)]
pub struct DaemonMachine {
    phase: DaemonPhase,
    transition_count: u64,
    last_transition: Option<Instant>,
}

impl Default for DaemonMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonMachine {
    /// Create a new machine in the Starting phase.
    pub fn new() -> Self {
        Self {
            phase: DaemonPhase::Starting,
            transition_count: 0,
            last_transition: None,
        }
    }

    pub fn phase(&self) -> DaemonPhase {
        self.phase
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Get the time since the last transition.
    pub fn time_in_state(&self) -> Option<Duration> {
        self.last_transition.map(|t| t.elapsed())
    }

    /// Process an event and potentially transition to a new phase.
    /// Returns true if a transition occurred.
    pub fn process_event(&mut self, event: DaemonEvent) -> bool {
        match self.next_phase(event) {
            Some(phase) => {
                self.phase = phase;
                self.transition_count += 1;
                self.last_transition = Some(Instant::now());
                true
            }
            None => false,
        }
    }

    fn next_phase(&self, event: DaemonEvent) -> Option<DaemonPhase> {
        use DaemonEvent as E;
        use DaemonPhase as P;

        match (self.phase, event) {
            (P::Starting, E::Opened) => Some(P::Idle),
            (P::Starting, E::OpenFailed) => Some(P::Stopped),

            (P::Idle, E::Woke) => Some(P::Draining),
            (P::Draining, E::Drained) => Some(P::Polling),
            (P::Polling, E::Polled) => Some(P::Idle),

            // Stop from any live phase
            (P::Stopping | P::Stopped, E::StopRequested) => None,
            (_, E::StopRequested) => Some(P::Stopping),

            (P::Stopping, E::Closed) => Some(P::Stopped),

            _ => None,
        }
    }
}
