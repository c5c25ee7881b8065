// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for rigd.
//!
//! Config is loaded from the `[rigd]` section of `rigd.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./rigd.toml`
//! 3. `~/.config/rigd/rigd.toml`
//! 4. `/etc/rigd/rigd.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rigd_app::ConfigFile;
use rigd_core::meter::MeterCurve;
use rigd_core::rig::controller::RotatingPolling;
use rigd_core::RigField;

/// Top-level daemon configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub general: GeneralConfig,
    pub rig: RigConfig,
    pub polling: PollingConfig,
    pub meter: MeterConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error, off)
    pub log_level: Option<String>,
}

/// Which rig to bind and how to reach it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Numeric model id or backend name; the dummy backend when unset.
    pub model: Option<String>,
    /// Device path (e.g. "/dev/ttyS0")
    pub port: Option<String>,
    /// Serial speed override
    pub speed: Option<u32>,
    /// ICOM CI-V address
    pub civaddr: Option<u8>,
}

/// Daemon cycle timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub tick_ms: u64,
    pub call_timeout_ms: u64,
    /// Ticks between reads, per field.
    pub frequency_every: u32,
    pub mode_every: u32,
    pub passband_every: u32,
    pub agc_every: u32,
    pub ptt_every: u32,
    pub strength_every: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            call_timeout_ms: 200,
            frequency_every: 2,
            mode_every: 4,
            passband_every: 4,
            agc_every: 8,
            ptt_every: 1,
            strength_every: 1,
        }
    }
}

impl PollingConfig {
    fn periods(&self) -> [(RigField, u32, &'static str); RigField::COUNT] {
        [
            (RigField::Frequency, self.frequency_every, "frequency_every"),
            (RigField::Mode, self.mode_every, "mode_every"),
            (RigField::Passband, self.passband_every, "passband_every"),
            (RigField::Agc, self.agc_every, "agc_every"),
            (RigField::Ptt, self.ptt_every, "ptt_every"),
            (RigField::SignalStrength, self.strength_every, "strength_every"),
        ]
    }

    pub fn policy(&self) -> RotatingPolling {
        self.periods()
            .into_iter()
            .fold(
                RotatingPolling::new(Duration::from_millis(self.tick_ms)),
                |policy, (field, every, _)| policy.with_period(field, every),
            )
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Signal meter consumer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Meter refresh interval (ms)
    pub tval_ms: u32,
    /// Maximum needle speed (degrees per second)
    pub falloff_deg_per_s: f32,
    pub curve: MeterCurve,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            tval_ms: 100,
            falloff_deg_per_s: 100.0,
            curve: MeterCurve::Poly,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if let Some(model) = &self.rig.model {
            if model.trim().is_empty() {
                return Err("[rig].model must not be empty".to_string());
            }
        }
        if self.rig.speed == Some(0) {
            return Err("[rig].speed must be > 0".to_string());
        }

        if self.polling.tick_ms == 0 {
            return Err("[polling].tick_ms must be > 0".to_string());
        }
        if self.polling.call_timeout_ms == 0 {
            return Err("[polling].call_timeout_ms must be > 0".to_string());
        }
        for (_, every, key) in self.polling.periods() {
            if every == 0 {
                return Err(format!("[polling].{} must be > 0", key));
            }
        }

        if self.meter.tval_ms == 0 {
            return Err("[meter].tval_ms must be > 0".to_string());
        }
        let falloff = self.meter.falloff_deg_per_s;
        if falloff.is_nan() || falloff <= 0.0 {
            return Err("[meter].falloff_deg_per_s must be > 0".to_string());
        }
        Ok(())
    }

    /// Generate an example configuration wrapped under the `[rigd]`
    /// section header.
    pub fn example_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            rigd: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            rig: RigConfig {
                model: Some("dummy".to_string()),
                port: Some("/dev/ttyUSB0".to_string()),
                speed: Some(9600),
                civaddr: None,
            },
            polling: PollingConfig::default(),
            meter: MeterConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { rigd: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error, off)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "rigd"
    }
}
