// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated rig with full readback and serial-like latency.

use std::time::Duration;

use rigd_core::rig::{
    BackendStatus, OpenParams, RigCapabilities, RigInfo, RigTransport, TransportFuture,
};
use rigd_core::{
    Agc, FieldSet, FieldValue, Freq, Passband, RigField, RigMode, TransportError,
    TransportResult,
};

pub const SIM_MODEL_ID: u32 = 2;

/// Round trip of a short CAT exchange at 9600 baud.
const DEFAULT_LATENCY: Duration = Duration::from_millis(8);

pub(crate) fn info() -> RigInfo {
    let mut writable = FieldSet::all();
    writable.remove(RigField::SignalStrength);

    RigInfo {
        model_id: SIM_MODEL_ID,
        manufacturer: "rigd".to_string(),
        model: "Simulator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: BackendStatus::Alpha,
        capabilities: RigCapabilities::new(FieldSet::all(), writable),
    }
}

pub struct SimRig {
    info: RigInfo,
    latency: Duration,
    freq: Freq,
    /// Mode register, held as the hamlib mode mask a real rig reports.
    mode_bits: u32,
    passband: Passband,
    agc: Agc,
    ptt: bool,
    closed: bool,
}

impl SimRig {
    pub fn new() -> Self {
        Self {
            info: info(),
            latency: DEFAULT_LATENCY,
            freq: Freq { hz: 14_200_000 },
            mode_bits: RigMode::USB.bits(),
            passband: Passband::Normal,
            agc: Agc::Slow,
            ptt: false,
            closed: false,
        }
    }

    /// The simulator has no device, but a port that was asked for must at
    /// least look like one.
    pub fn open(params: &OpenParams) -> TransportResult<Self> {
        if let Some(port) = &params.port {
            if port.is_empty() {
                return Err(TransportError::Io("empty device path".into()));
            }
        }
        let mut rig = Self::new();
        // Slower links answer proportionally slower.
        if let Some(speed) = params.speed.filter(|s| *s > 0) {
            rig.latency = DEFAULT_LATENCY * 9600 / speed.max(1200);
        }
        Ok(rig)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    fn strength(&self) -> i32 {
        // Fluctuate between S7 and S9+10 using low-order time bits
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        -12 + (nanos % 23) as i32
    }
}

impl Default for SimRig {
    fn default() -> Self {
        Self::new()
    }
}

impl RigTransport for SimRig {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn get<'a>(&'a mut self, field: RigField) -> TransportFuture<'a, FieldValue> {
        let value = match field {
            RigField::Frequency => FieldValue::Frequency(self.freq),
            RigField::Mode => FieldValue::Mode(RigMode::from_bits(self.mode_bits)),
            RigField::Passband => FieldValue::Passband(self.passband),
            RigField::Agc => FieldValue::Agc(self.agc),
            RigField::Ptt => FieldValue::Ptt(self.ptt),
            RigField::SignalStrength => FieldValue::SignalStrength(self.strength()),
        };
        let latency = self.latency;
        let closed = self.closed;
        Box::pin(async move {
            if closed {
                return Err(TransportError::Closed);
            }
            tokio::time::sleep(latency).await;
            Ok(value)
        })
    }

    fn set<'a>(&'a mut self, value: FieldValue) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            if self.closed {
                return Err(TransportError::Closed);
            }
            tokio::time::sleep(self.latency).await;
            match value {
                FieldValue::Frequency(freq) => self.freq = freq,
                FieldValue::Mode(RigMode::Unknown) => {
                    return Err(TransportError::Protocol("cannot select an unknown mode".into()))
                }
                FieldValue::Mode(mode) => self.mode_bits = mode.bits(),
                FieldValue::Passband(passband) => self.passband = passband,
                FieldValue::Agc(Agc::Unsupported) => {
                    return Err(TransportError::Protocol("AGC level not available".into()))
                }
                FieldValue::Agc(agc) => self.agc = agc,
                FieldValue::Ptt(ptt) => self.ptt = ptt,
                FieldValue::SignalStrength(_) => {
                    return Err(TransportError::Unsupported(RigField::SignalStrength))
                }
            }
            Ok(())
        })
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        self.closed = true;
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_roundtrip_costs_latency() {
        let mut rig = SimRig::new().with_latency(Duration::from_millis(20));
        let started = tokio::time::Instant::now();
        rig.set(FieldValue::Ptt(true)).await.unwrap();
        assert_eq!(rig.get(RigField::Ptt).await, Ok(FieldValue::Ptt(true)));
        assert_eq!(started.elapsed(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_register_roundtrip() {
        let mut rig = SimRig::new();
        assert_eq!(rig.get(RigField::Mode).await, Ok(FieldValue::Mode(RigMode::USB)));
        rig.set(FieldValue::Mode(RigMode::PktFM)).await.unwrap();
        assert_eq!(rig.mode_bits, 1 << 12);
        assert_eq!(
            rig.get(RigField::Mode).await,
            Ok(FieldValue::Mode(RigMode::PktFM))
        );

        // A register holding several bits is not a mode the rig can name
        rig.mode_bits = RigMode::USB.bits() | RigMode::LSB.bits();
        assert_eq!(
            rig.get(RigField::Mode).await,
            Ok(FieldValue::Mode(RigMode::Unknown))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_after_close_fail() {
        let mut rig = SimRig::new();
        rig.close().await.unwrap();
        assert_eq!(rig.get(RigField::Frequency).await, Err(TransportError::Closed));
        assert_eq!(
            rig.set(FieldValue::Ptt(true)).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_strength_in_range() {
        let mut rig = SimRig::new();
        for _ in 0..20 {
            match rig.get(RigField::SignalStrength).await {
                Ok(FieldValue::SignalStrength(db)) => assert!((-12..=10).contains(&db)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_open_scales_latency_with_speed() {
        let params = OpenParams {
            model_id: SIM_MODEL_ID,
            port: Some("/dev/ttyUSB0".into()),
            speed: Some(4800),
            civ_address: None,
        };
        let rig = SimRig::open(&params).unwrap();
        assert_eq!(rig.latency(), DEFAULT_LATENCY * 2);

        let params = OpenParams {
            port: Some(String::new()),
            ..params
        };
        assert!(matches!(SimRig::open(&params), Err(TransportError::Io(_))));
    }
}
