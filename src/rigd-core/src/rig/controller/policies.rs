// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Polling policies.
//!
//! A policy decides how long the daemon idles between cycles and which
//! readable fields are refreshed on a given tick, bounding the hardware
//! time spent in each Polling phase.

use std::time::Duration;

use crate::rig::field::{FieldSet, RigField};

/// Policy for polling the rig for status updates.
pub trait PollingPolicy: Send + Sync {
    /// Get the interval between polls.
    fn tick_interval(&self) -> Duration;

    /// Fields to read back on tick number `tick`, limited to `readable`.
    fn fields_due(&self, tick: u64, readable: FieldSet) -> FieldSet;
}

/// Rotating polling policy.
///
/// Each field is read every `period` ticks. Cheap, fast-changing fields
/// run every tick; frequency and mode less often.
#[derive(Debug, Clone)]
pub struct RotatingPolling {
    interval: Duration,
    periods: [u32; RigField::COUNT],
}

impl RotatingPolling {
    pub fn new(interval: Duration) -> Self {
        let mut periods = [1; RigField::COUNT];
        periods[RigField::Frequency.index()] = 2;
        periods[RigField::Mode.index()] = 4;
        periods[RigField::Passband.index()] = 4;
        periods[RigField::Agc.index()] = 8;
        periods[RigField::Ptt.index()] = 1;
        periods[RigField::SignalStrength.index()] = 1;
        Self { interval, periods }
    }

    /// Set how many ticks pass between reads of `field`. Zero is treated
    /// as one.
    pub fn with_period(mut self, field: RigField, ticks: u32) -> Self {
        self.periods[field.index()] = ticks.max(1);
        self
    }

    pub fn period(&self, field: RigField) -> u32 {
        self.periods[field.index()]
    }
}

impl Default for RotatingPolling {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl PollingPolicy for RotatingPolling {
    fn tick_interval(&self) -> Duration {
        self.interval
    }

    fn fields_due(&self, tick: u64, readable: FieldSet) -> FieldSet {
        readable
            .iter()
            .filter(|f| tick % u64::from(self.period(*f)) == 0)
            .collect()
    }
}

/// Fixed polling policy.
///
/// Reads every readable field on every tick.
#[derive(Debug, Clone)]
pub struct FixedPolling {
    interval: Duration,
}

impl FixedPolling {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl PollingPolicy for FixedPolling {
    fn tick_interval(&self) -> Duration {
        self.interval
    }

    fn fields_due(&self, _tick: u64, readable: FieldSet) -> FieldSet {
        readable
    }
}
