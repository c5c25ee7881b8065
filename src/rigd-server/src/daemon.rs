// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Daemon loop: the only code that ever calls the rig transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use rigd_backend::TransportRegistry;
use rigd_core::rig::controller::{
    DaemonEvent, DaemonMachine, DaemonPhase, PollingPolicy, RotatingPolling, TransportExecutor,
};
use rigd_core::rig::{OpenParams, RigInfo, RigTransport};
use rigd_core::{
    CacheReader, FieldSet, FieldValue, RequestChannel, RigError, RigField, RigResult, StateCache,
    TX_SIGNAL_SENTINEL_DB,
};

/// Configuration for the daemon.
pub struct DaemonConfig {
    pub registry: Arc<TransportRegistry>,
    pub open: OpenParams,
    pub polling: Box<dyn PollingPolicy>,
    /// Upper bound on any single transport call.
    pub call_timeout: Duration,
    /// Already bound transport to use instead of opening one from the
    /// registry.
    pub prebuilt_transport: Option<Box<dyn RigTransport>>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            registry: Arc::new(TransportRegistry::with_builtin_backends()),
            open: OpenParams::default(),
            polling: Box::new(RotatingPolling::default()),
            call_timeout: Duration::from_millis(200),
            prebuilt_transport: None,
        }
    }
}

/// Why the daemon left Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Tick,
    Request,
    Stop,
}

pub struct DaemonLoop {
    transport: Box<dyn RigTransport>,
    info: RigInfo,
    cache: StateCache,
    requests: Arc<RequestChannel>,
    polling: Box<dyn PollingPolicy>,
    call_timeout: Duration,
    machine: DaemonMachine,
    phase_tx: watch::Sender<DaemonPhase>,
    tick: u64,
}

impl DaemonLoop {
    /// Bind the transport and publish one full poll.
    ///
    /// Failing to bind the transport is the only error that leaves the
    /// daemon; the phase goes straight to Stopped.
    pub async fn start(config: DaemonConfig) -> RigResult<DaemonLoop> {
        let mut machine = DaemonMachine::new();
        let (phase_tx, _) = watch::channel(machine.phase());

        let transport = match config.prebuilt_transport {
            Some(transport) => transport,
            None => {
                info!("Opening rig {}", config.open);
                match config.registry.open(&config.open) {
                    Ok(transport) => transport,
                    Err(e) => {
                        machine.process_event(DaemonEvent::OpenFailed);
                        phase_tx.send_replace(machine.phase());
                        return Err(RigError::fatal_startup(config.open.model_id.to_string(), e));
                    }
                }
            }
        };

        let info = transport.info().clone();
        let caps = info.capabilities;
        info!(
            "Rig info: {} {} {} ({})",
            info.manufacturer, info.model, info.version, info.status
        );
        info!(
            "Capabilities: readable {:?}, writable {:?}",
            caps.readable, caps.writable
        );

        let (cache, _) = StateCache::new();
        cache.set_capabilities(&caps);

        let mut daemon = DaemonLoop {
            transport,
            info,
            cache,
            requests: Arc::new(RequestChannel::new(caps.writable)),
            polling: config.polling,
            call_timeout: config.call_timeout,
            machine,
            phase_tx,
            tick: 0,
        };

        daemon.poll_phase(caps.readable).await;
        daemon.transition(DaemonEvent::Opened);
        info!("Rig ready");
        Ok(daemon)
    }

    pub fn info(&self) -> &RigInfo {
        &self.info
    }

    pub fn reader(&self) -> CacheReader {
        self.cache.reader()
    }

    pub fn requests(&self) -> Arc<RequestChannel> {
        self.requests.clone()
    }

    pub fn phase(&self) -> DaemonPhase {
        self.machine.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<DaemonPhase> {
        self.phase_tx.subscribe()
    }

    fn transition(&mut self, event: DaemonEvent) {
        let from = self.machine.phase();
        let spent = self.machine.time_in_state();
        if self.machine.process_event(event) {
            let phase = self.machine.phase();
            match spent {
                Some(spent) => debug!("Daemon phase {} -> {} after {:?}", from, phase, spent),
                None => debug!("Daemon phase {} -> {}", from, phase),
            }
            self.phase_tx.send_replace(phase);
        }
    }

    /// Apply every pending request, one set call each, in submission
    /// order. Returns the fields the transport accepted.
    ///
    /// A failed set is logged and dropped; the cache is never touched
    /// here, only a later read can confirm a write.
    pub async fn drain_phase(&mut self) -> FieldSet {
        let mut written = FieldSet::empty();
        let requests = self.requests.drain_all();
        if requests.is_empty() {
            return written;
        }

        let mut exec = TransportExecutor::new(self.transport.as_mut(), self.call_timeout);
        for req in requests {
            let field = req.field();
            match exec.set(req.value.clone()).await {
                Ok(()) => {
                    debug!("Applied {} (request #{})", req.value, req.seq);
                    written.insert(field);
                }
                Err(e) => {
                    warn!("Dropping request #{}: {}", req.seq, RigError::transient(field, e));
                }
            }
        }
        written
    }

    /// Read back `due` (limited to readable fields) and publish each value
    /// that arrives. A failed read leaves that field stale.
    ///
    /// While transmitting, signal strength always holds the sentinel, due
    /// or not.
    pub async fn poll_phase(&mut self, due: FieldSet) {
        let readable = self.info.capabilities.readable;
        let due = due.intersection(readable);
        let mut exec = TransportExecutor::new(self.transport.as_mut(), self.call_timeout);

        // ALL order puts PTT before strength, so the skip below sees this
        // cycle's PTT.
        for field in due.iter() {
            if field == RigField::SignalStrength && self.cache.current().transmitting() {
                continue;
            }
            match exec.get(field).await {
                Ok(value) => {
                    self.cache.publish(value);
                }
                Err(e) => warn!("Poll failed: {}", RigError::transient(field, e)),
            }
        }

        if readable.contains(RigField::SignalStrength) {
            let state = self.cache.current();
            let stale = state.signal_strength != Some(TX_SIGNAL_SENTINEL_DB);
            if state.transmitting() && (stale || due.contains(RigField::SignalStrength)) {
                self.cache
                    .publish(FieldValue::SignalStrength(TX_SIGNAL_SENTINEL_DB));
            }
        }
    }

    /// One Draining + Polling pass. A timer tick advances the polling
    /// rotation; a request-only wake reads back just what was written.
    ///
    /// Stop is checked after each phase. Returns `false` once it has been
    /// observed, leaving the machine in the phase that just completed.
    pub async fn cycle(&mut self, timer_tick: bool, stop_rx: &watch::Receiver<bool>) -> bool {
        self.transition(DaemonEvent::Woke);
        let written = self.drain_phase().await;
        if stop_requested(stop_rx) {
            return false;
        }
        self.transition(DaemonEvent::Drained);

        let due = self.fields_due(written, timer_tick);
        self.poll_phase(due).await;
        if stop_requested(stop_rx) {
            return false;
        }
        self.transition(DaemonEvent::Polled);
        true
    }

    fn fields_due(&mut self, written: FieldSet, timer_tick: bool) -> FieldSet {
        if !timer_tick {
            return written;
        }
        self.tick += 1;
        let readable = self.info.capabilities.readable;
        written.union(self.polling.fields_due(self.tick, readable))
    }

    /// Run until the stop signal is observed, then close the transport.
    pub async fn run(mut self, mut stop_rx: watch::Receiver<bool>) {
        let interval = self.polling.tick_interval();
        let mut next_tick = Instant::now() + interval;
        let requests = self.requests.clone();

        loop {
            let wake = idle(&requests, next_tick, &mut stop_rx).await;
            if wake == Wake::Stop {
                break;
            }

            let timer_tick = wake == Wake::Tick;
            if timer_tick {
                next_tick += interval;
                let now = Instant::now();
                if next_tick < now {
                    // Cycles overran the tick; do not try to catch up.
                    next_tick = now + interval;
                }
            }

            if !self.cycle(timer_tick, &stop_rx).await {
                break;
            }
        }

        self.shutdown().await;
    }

    /// Refuse new requests and close the transport once, best effort.
    pub async fn shutdown(mut self) {
        self.transition(DaemonEvent::StopRequested);
        info!("Daemon stopping");
        self.requests.close();
        let dropped = self.requests.drain_all();
        if !dropped.is_empty() {
            debug!("Discarding {} pending request(s)", dropped.len());
        }

        let mut exec = TransportExecutor::new(self.transport.as_mut(), self.call_timeout);
        if let Err(e) = exec.close().await {
            warn!("Closing transport failed: {}", e);
        }
        self.transition(DaemonEvent::Closed);
        info!("Daemon stopped");
    }
}

async fn idle(
    requests: &RequestChannel,
    deadline: Instant,
    stop_rx: &mut watch::Receiver<bool>,
) -> Wake {
    if stop_requested(stop_rx) {
        return Wake::Stop;
    }
    tokio::select! {
        _ = time::sleep_until(deadline) => Wake::Tick,
        _ = requests.notified() => Wake::Request,
        _ = stop_rx.changed() => Wake::Stop,
    }
}

fn stop_requested(stop_rx: &watch::Receiver<bool>) -> bool {
    // A dropped sender means the owner is gone.
    *stop_rx.borrow() || stop_rx.has_changed().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigd_backend::{MockCall, MockHandle, MockTransport};
    use rigd_core::rig::controller::FixedPolling;
    use rigd_core::rig::RigCapabilities;
    use rigd_core::{Agc, Freq, RigMode};

    fn config_with(transport: MockTransport) -> DaemonConfig {
        DaemonConfig {
            polling: Box::new(FixedPolling::new(Duration::from_millis(100))),
            prebuilt_transport: Some(Box::new(transport)),
            ..Default::default()
        }
    }

    fn scripted() -> (MockTransport, MockHandle) {
        let (transport, handle) = MockTransport::full();
        handle.set_value(FieldValue::Frequency(Freq::new(14_074_000)));
        handle.set_value(FieldValue::Mode(RigMode::USB));
        handle.set_value(FieldValue::Passband(rigd_core::Passband::Normal));
        handle.set_value(FieldValue::Agc(Agc::Fast));
        handle.set_value(FieldValue::Ptt(false));
        handle.set_value(FieldValue::SignalStrength(-6));
        (transport, handle)
    }

    #[tokio::test]
    async fn test_start_publishes_full_poll() {
        let (transport, handle) = scripted();
        let daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        assert_eq!(daemon.phase(), DaemonPhase::Idle);

        let state = daemon.reader().read();
        assert_eq!(state.frequency, Some(Freq::new(14_074_000)));
        assert_eq!(state.mode, Some(RigMode::USB));
        assert_eq!(state.agc, Some(Agc::Fast));
        assert_eq!(state.signal_strength, Some(-6));
        for field in RigField::ALL {
            assert_eq!(handle.get_count(field), 1);
            assert!(state.stamp(field).is_set());
        }
    }

    #[tokio::test]
    async fn test_start_fails_for_unknown_model() {
        let config = DaemonConfig {
            open: OpenParams {
                model_id: 31337,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = DaemonLoop::start(config).await.err().unwrap();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreadable_fields_stay_unknown() {
        let caps = RigCapabilities::new(
            FieldSet::of(&[RigField::Frequency]),
            FieldSet::of(&[RigField::Frequency, RigField::Ptt]),
        );
        let (transport, handle) = MockTransport::new(caps);
        handle.set_value(FieldValue::Frequency(Freq::new(3_573_000)));
        handle.set_value(FieldValue::Ptt(true));

        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        daemon.cycle(true, &stop_rx).await;

        let state = daemon.reader().read();
        assert_eq!(state.frequency, Some(Freq::new(3_573_000)));
        assert_eq!(state.ptt, None);
        assert_eq!(handle.get_count(RigField::Ptt), 0);
    }

    #[tokio::test]
    async fn test_coalesced_requests_reach_transport_once() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let requests = daemon.requests();

        for khz in [7_000, 7_010, 7_020] {
            requests
                .submit(FieldValue::Frequency(Freq::from_khz(khz)))
                .unwrap();
        }
        requests.submit(FieldValue::Mode(RigMode::CW)).unwrap();

        let written = daemon.drain_phase().await;
        assert_eq!(written, FieldSet::of(&[RigField::Frequency, RigField::Mode]));
        assert_eq!(
            handle.sets(),
            vec![
                FieldValue::Frequency(Freq::from_khz(7_020)),
                FieldValue::Mode(RigMode::CW)
            ]
        );
    }

    #[tokio::test]
    async fn test_write_then_readback_same_cycle() {
        let (transport, handle) = scripted();
        let policy = RotatingPolling::new(Duration::from_millis(100))
            .with_period(RigField::Mode, 1000);
        let mut daemon = DaemonLoop::start(DaemonConfig {
            polling: Box::new(policy),
            prebuilt_transport: Some(Box::new(transport)),
            ..Default::default()
        })
        .await
        .unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);

        daemon
            .requests()
            .submit(FieldValue::Mode(RigMode::LSB))
            .unwrap();
        // Before the readback the cache still holds the confirmed value
        assert_eq!(daemon.reader().read().mode, Some(RigMode::USB));

        daemon.cycle(true, &stop_rx).await;
        assert_eq!(daemon.reader().read().mode, Some(RigMode::LSB));
        assert_eq!(handle.get_count(RigField::Mode), 2);
    }

    #[tokio::test]
    async fn test_empty_drain_keeps_freshness() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let before = daemon.reader().read();

        assert!(daemon.drain_phase().await.is_empty());
        assert_eq!(daemon.reader().read(), before);
        assert!(handle.sets().is_empty());
    }

    #[tokio::test]
    async fn test_failed_set_does_not_block_other_polls() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let old_mode_seq = daemon.reader().read().stamp(RigField::Mode).seq;

        handle.fail_set(RigField::Mode, true);
        handle.set_value(FieldValue::Frequency(Freq::new(21_074_000)));
        daemon
            .requests()
            .submit(FieldValue::Mode(RigMode::AM))
            .unwrap();
        daemon.cycle(true, &stop_rx).await;

        let state = daemon.reader().read();
        // Mode write was lost; the cache reports what the rig still says
        assert_eq!(state.mode, Some(RigMode::USB));
        assert!(state.stamp(RigField::Mode).seq > old_mode_seq);
        assert_eq!(state.frequency, Some(Freq::new(21_074_000)));
        // Not retried
        assert_eq!(handle.sets(), vec![FieldValue::Mode(RigMode::AM)]);
    }

    #[tokio::test]
    async fn test_failed_get_leaves_field_stale() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let before = daemon.reader().read();

        handle.fail_get(RigField::Agc, true);
        handle.set_value(FieldValue::Agc(Agc::Slow));
        daemon.cycle(true, &stop_rx).await;

        let after = daemon.reader().read();
        assert_eq!(after.agc, Some(Agc::Fast));
        assert_eq!(after.stamp(RigField::Agc), before.stamp(RigField::Agc));
        assert!(after.stamp(RigField::Ptt).seq > before.stamp(RigField::Ptt).seq);
    }

    #[tokio::test]
    async fn test_strength_sentinel_while_transmitting() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        handle.clear_calls();

        handle.set_value(FieldValue::Ptt(true));
        handle.set_value(FieldValue::SignalStrength(20));
        daemon.cycle(true, &stop_rx).await;

        let state = daemon.reader().read();
        assert_eq!(state.ptt, Some(true));
        assert_eq!(state.signal_strength, Some(TX_SIGNAL_SENTINEL_DB));
        assert_eq!(handle.get_count(RigField::SignalStrength), 0);
    }

    #[tokio::test]
    async fn test_sentinel_after_ptt_write_without_tick() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);

        daemon.requests().submit(FieldValue::Ptt(true)).unwrap();
        assert!(daemon.cycle(false, &stop_rx).await);

        let state = daemon.reader().read();
        assert_eq!(state.ptt, Some(true));
        assert_eq!(state.signal_strength, Some(TX_SIGNAL_SENTINEL_DB));
        // Only the startup poll read strength
        assert_eq!(handle.get_count(RigField::SignalStrength), 1);
    }

    #[tokio::test]
    async fn test_sentinel_when_strength_not_due() {
        let (transport, handle) = scripted();
        let policy = RotatingPolling::new(Duration::from_millis(100))
            .with_period(RigField::SignalStrength, 4);
        let mut daemon = DaemonLoop::start(DaemonConfig {
            polling: Box::new(policy),
            prebuilt_transport: Some(Box::new(transport)),
            ..Default::default()
        })
        .await
        .unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        assert_eq!(daemon.reader().read().signal_strength, Some(-6));

        handle.set_value(FieldValue::Ptt(true));
        assert!(daemon.cycle(true, &stop_rx).await);

        let state = daemon.reader().read();
        assert_eq!(state.ptt, Some(true));
        assert_eq!(state.signal_strength, Some(TX_SIGNAL_SENTINEL_DB));
        let seq = state.stamp(RigField::SignalStrength).seq;

        // Already showing the sentinel; a tick without strength due leaves it
        assert!(daemon.cycle(true, &stop_rx).await);
        let state = daemon.reader().read();
        assert_eq!(state.signal_strength, Some(TX_SIGNAL_SENTINEL_DB));
        assert_eq!(state.stamp(RigField::SignalStrength).seq, seq);
    }

    #[tokio::test]
    async fn test_cycle_stops_after_drain() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (stop_tx, stop_rx) = watch::channel(false);
        handle.clear_calls();

        daemon.requests().submit(FieldValue::Agc(Agc::Slow)).unwrap();
        stop_tx.send_replace(true);
        assert!(!daemon.cycle(true, &stop_rx).await);

        // The drain in progress completed, polling never started
        assert_eq!(daemon.phase(), DaemonPhase::Draining);
        assert_eq!(handle.calls(), vec![MockCall::Set(FieldValue::Agc(Agc::Slow))]);
    }

    #[tokio::test]
    async fn test_cycle_stops_when_owner_gone() {
        let (transport, handle) = scripted();
        let mut daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let (stop_tx, stop_rx) = watch::channel(false);
        handle.clear_calls();

        drop(stop_tx);
        assert!(!daemon.cycle(true, &stop_rx).await);
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_once_and_refuses_requests() {
        let (transport, handle) = scripted();
        let daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let requests = daemon.requests();
        let phase = daemon.subscribe_phase();
        requests.submit(FieldValue::Ptt(true)).unwrap();

        daemon.shutdown().await;

        assert_eq!(*phase.borrow(), DaemonPhase::Stopped);
        assert_eq!(handle.close_count(), 1);
        assert!(!handle.calls().contains(&MockCall::Set(FieldValue::Ptt(true))));
        assert_eq!(
            requests.submit(FieldValue::Ptt(false)),
            Err(RigError::ShutdownInProgress)
        );
    }

    #[tokio::test]
    async fn test_failed_close_still_stops() {
        let (transport, handle) = scripted();
        let daemon = DaemonLoop::start(config_with(transport)).await.unwrap();
        let phase = daemon.subscribe_phase();
        handle.fail_close(true);

        daemon.shutdown().await;

        assert_eq!(*phase.borrow(), DaemonPhase::Stopped);
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_wakes_on_request_and_stops() {
        let (transport, handle) = scripted();
        let daemon = DaemonLoop::start(DaemonConfig {
            polling: Box::new(FixedPolling::new(Duration::from_secs(3600))),
            prebuilt_transport: Some(Box::new(transport)),
            ..Default::default()
        })
        .await
        .unwrap();
        let requests = daemon.requests();
        let reader = daemon.reader();
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(daemon.run(stop_rx));

        requests.submit(FieldValue::Agc(Agc::Medium)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        // No tick has elapsed, yet the write was applied and read back
        assert_eq!(reader.read().agc, Some(Agc::Medium));
        assert_eq!(handle.get_count(RigField::Frequency), 1);

        stop_tx.send_replace(true);
        task.await.unwrap();
        assert_eq!(handle.close_count(), 1);
    }
}
