// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dummy rig backend for development and testing.
//!
//! Holds rig state in memory and responds to all calls immediately.
//! No hardware or serial port required. Like a rig without a receive
//! meter or transmit sense line, it accepts PTT but cannot report it, and
//! has no signal strength at all.

use rigd_core::rig::{BackendStatus, RigCapabilities, RigInfo, RigTransport, TransportFuture};
use rigd_core::{Agc, FieldSet, FieldValue, Freq, Passband, RigField, RigMode, TransportError};

pub const DUMMY_MODEL_ID: u32 = 1;

pub(crate) fn info() -> RigInfo {
    let readable = FieldSet::of(&[
        RigField::Frequency,
        RigField::Mode,
        RigField::Passband,
        RigField::Agc,
    ]);
    let mut writable = readable;
    writable.insert(RigField::Ptt);

    RigInfo {
        model_id: DUMMY_MODEL_ID,
        manufacturer: "Hamlib".to_string(),
        model: "Dummy".to_string(),
        version: "0.5".to_string(),
        status: BackendStatus::Beta,
        capabilities: RigCapabilities::new(readable, writable),
    }
}

pub struct DummyRig {
    info: RigInfo,
    freq: Freq,
    mode: RigMode,
    passband: Passband,
    agc: Agc,
    ptt: bool,
    closed: bool,
}

impl DummyRig {
    pub fn new() -> Self {
        Self {
            info: info(),
            freq: Freq { hz: 145_000_000 },
            mode: RigMode::FMNarrow,
            passband: Passband::Normal,
            agc: Agc::Fast,
            ptt: false,
            closed: false,
        }
    }

    /// Last PTT written; there is no way to read it back over the transport.
    pub fn ptt(&self) -> bool {
        self.ptt
    }
}

impl Default for DummyRig {
    fn default() -> Self {
        Self::new()
    }
}

impl RigTransport for DummyRig {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn get<'a>(&'a mut self, field: RigField) -> TransportFuture<'a, FieldValue> {
        if self.closed {
            return Box::pin(async { Err(TransportError::Closed) });
        }
        let result = match field {
            RigField::Frequency => Ok(FieldValue::Frequency(self.freq)),
            RigField::Mode => Ok(FieldValue::Mode(self.mode)),
            RigField::Passband => Ok(FieldValue::Passband(self.passband)),
            RigField::Agc => Ok(FieldValue::Agc(self.agc)),
            RigField::Ptt | RigField::SignalStrength => Err(TransportError::Unsupported(field)),
        };
        Box::pin(async move { result })
    }

    fn set<'a>(&'a mut self, value: FieldValue) -> TransportFuture<'a, ()> {
        if self.closed {
            return Box::pin(async { Err(TransportError::Closed) });
        }
        let result = match value {
            FieldValue::Frequency(freq) => {
                self.freq = freq;
                Ok(())
            }
            FieldValue::Mode(RigMode::Unknown) => {
                Err(TransportError::Protocol("cannot select an unknown mode".into()))
            }
            FieldValue::Mode(mode) => {
                self.mode = mode;
                Ok(())
            }
            FieldValue::Passband(passband) => {
                self.passband = passband;
                Ok(())
            }
            FieldValue::Agc(Agc::Unsupported) => {
                Err(TransportError::Protocol("AGC level not available".into()))
            }
            FieldValue::Agc(agc) => {
                self.agc = agc;
                Ok(())
            }
            FieldValue::Ptt(ptt) => {
                self.ptt = ptt;
                Ok(())
            }
            FieldValue::SignalStrength(_) => {
                Err(TransportError::Unsupported(RigField::SignalStrength))
            }
        };
        Box::pin(async move { result })
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        self.closed = true;
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let mut rig = DummyRig::new();
        rig.set(FieldValue::Frequency(Freq::new(7_074_000)))
            .await
            .unwrap();
        rig.set(FieldValue::Agc(Agc::Medium)).await.unwrap();
        assert_eq!(
            rig.get(RigField::Frequency).await,
            Ok(FieldValue::Frequency(Freq::new(7_074_000)))
        );
        assert_eq!(rig.get(RigField::Agc).await, Ok(FieldValue::Agc(Agc::Medium)));
    }

    #[tokio::test]
    async fn test_no_live_readback() {
        let mut rig = DummyRig::new();
        rig.set(FieldValue::Ptt(true)).await.unwrap();
        assert!(rig.ptt());
        assert_eq!(
            rig.get(RigField::Ptt).await,
            Err(TransportError::Unsupported(RigField::Ptt))
        );
        assert_eq!(
            rig.get(RigField::SignalStrength).await,
            Err(TransportError::Unsupported(RigField::SignalStrength))
        );
        let caps = rig.capabilities();
        assert!(!caps.can_read(RigField::Ptt));
        assert!(caps.can_write(RigField::Ptt));
        assert!(!caps.can_write(RigField::SignalStrength));
    }

    #[tokio::test]
    async fn test_closed_rig_refuses_calls() {
        let mut rig = DummyRig::new();
        rig.close().await.unwrap();
        assert_eq!(rig.get(RigField::Mode).await, Err(TransportError::Closed));
        assert_eq!(
            rig.set(FieldValue::Frequency(Freq::new(7_074_000))).await,
            Err(TransportError::Closed)
        );
        assert_eq!(rig.freq, Freq::new(145_000_000));
    }

    #[tokio::test]
    async fn test_rejects_unknown_mode() {
        let mut rig = DummyRig::new();
        assert!(matches!(
            rig.set(FieldValue::Mode(RigMode::Unknown)).await,
            Err(TransportError::Protocol(_))
        ));
        assert_eq!(
            rig.get(RigField::Mode).await,
            Ok(FieldValue::Mode(RigMode::FMNarrow))
        );
    }
}
