// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Signal meter needle.
//!
//! Strength in dB relative to S9 is mapped to a needle angle between 0 and
//! 90 degrees and the displayed angle is moved towards it at a bounded
//! rate, one step per meter tick.

use serde::{Deserialize, Serialize};

use crate::rig::field::RigField;
use crate::rig::state::{RigState, TX_SIGNAL_SENTINEL_DB};

/// Lowest strength on the scale (S0).
pub const METER_MIN_DB: i32 = -54;
/// Highest strength on the scale (S9+60).
pub const METER_MAX_DB: i32 = 60;
pub const METER_MAX_ANGLE: f32 = 90.0;

/// Changes at or below this many degrees are not drawn.
const MIN_VISIBLE_DELTA: f32 = 0.1;

/// dB to angle mapping. S9 sits at mid-scale for both curves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterCurve {
    /// Two straight segments meeting at S9.
    Linear,
    /// Quadratic through S0, S9 and S9+60.
    #[default]
    Poly,
}

impl MeterCurve {
    pub fn angle(self, db: i32) -> f32 {
        let d = db.clamp(METER_MIN_DB, METER_MAX_DB) as f32;
        let half = METER_MAX_ANGLE / 2.0;
        let angle = match self {
            MeterCurve::Linear if d <= 0.0 => half * (d - METER_MIN_DB as f32) / -(METER_MIN_DB as f32),
            MeterCurve::Linear => half + half * d / METER_MAX_DB as f32,
            MeterCurve::Poly => {
                const A: f32 = -5.0 / 6840.0;
                const B: f32 = 0.75 + 300.0 / 6840.0;
                A * d * d + B * d + half
            }
        };
        angle.clamp(0.0, METER_MAX_ANGLE)
    }
}

/// Rate-limited needle position.
#[derive(Debug, Clone)]
pub struct NeedleSmoother {
    current: f32,
    /// Degrees per second.
    falloff: f32,
    tval_ms: u32,
}

impl NeedleSmoother {
    pub fn new(initial: f32, falloff: f32, tval_ms: u32) -> Self {
        Self {
            current: initial,
            falloff,
            tval_ms,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Largest move allowed in one tick.
    pub fn max_delta(&self) -> f32 {
        self.falloff * self.tval_ms as f32 / 1000.0
    }

    /// Move towards `target`. Returns the new angle when the needle moved.
    pub fn step(&mut self, target: f32) -> Option<f32> {
        let delta = (target - self.current).abs();
        if delta <= MIN_VISIBLE_DELTA {
            return None;
        }
        let max_delta = self.max_delta();
        if delta < max_delta {
            self.current = target;
        } else if target > self.current {
            self.current += max_delta;
        } else {
            self.current -= max_delta;
        }
        Some(self.current)
    }
}

/// Signal strength consumer driving one needle.
#[derive(Debug, Clone)]
pub struct SignalMeter {
    curve: MeterCurve,
    needle: NeedleSmoother,
}

impl SignalMeter {
    pub fn new(curve: MeterCurve, falloff: f32, tval_ms: u32) -> Self {
        let rest = curve.angle(TX_SIGNAL_SENTINEL_DB);
        Self {
            curve,
            needle: NeedleSmoother::new(rest, falloff, tval_ms),
        }
    }

    /// A meter only runs when the rig reports signal strength.
    pub fn is_active(state: &RigState) -> bool {
        state.has_capability(RigField::SignalStrength)
    }

    pub fn angle(&self) -> f32 {
        self.needle.current()
    }

    /// One meter tick against the latest snapshot.
    pub fn tick(&mut self, state: &RigState) -> Option<f32> {
        if !Self::is_active(state) {
            return None;
        }
        let db = if state.transmitting() {
            TX_SIGNAL_SENTINEL_DB
        } else {
            state.signal_strength?
        };
        self.needle.step(self.curve.angle(db))
    }
}
