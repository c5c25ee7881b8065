// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Consumer-side handle to a daemon running on its own thread.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::watch;
use tracing::{error, warn};

use rigd_core::rig::controller::DaemonPhase;
use rigd_core::rig::RigInfo;
use rigd_core::{
    CacheReader, FieldValue, RequestChannel, RequestSink, RigError, RigField, RigResult, RigState,
    Submitted,
};

use crate::daemon::{DaemonConfig, DaemonLoop};

/// What the daemon thread hands back once the rig is bound.
struct Started {
    info: RigInfo,
    reader: CacheReader,
    requests: Arc<RequestChannel>,
    phase_rx: watch::Receiver<DaemonPhase>,
}

/// A handle to the running daemon.
///
/// Reads never block on the rig; submissions only enqueue. Dropping the
/// handle stops the daemon.
pub struct RigHandle {
    info: RigInfo,
    reader: CacheReader,
    requests: Arc<RequestChannel>,
    phase_rx: watch::Receiver<DaemonPhase>,
    stop_tx: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

impl RigHandle {
    /// Spawn the daemon thread and wait until the rig is bound and the
    /// first full poll is published.
    pub fn start(config: DaemonConfig) -> RigResult<RigHandle> {
        let model = config.open.model_id.to_string();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);

        let thread = std::thread::Builder::new()
            .name("rigd-daemon".to_string())
            .spawn(move || daemon_thread(config, stop_rx, ready_tx))
            .map_err(|e| RigError::fatal_startup(model.clone(), e))?;

        let started = match ready_rx.recv() {
            Ok(Ok(started)) => started,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(RigError::fatal_startup(
                    model,
                    "daemon thread exited during startup",
                ));
            }
        };

        Ok(RigHandle {
            info: started.info,
            reader: started.reader,
            requests: started.requests,
            phase_rx: started.phase_rx,
            stop_tx,
            thread: Some(thread),
        })
    }

    pub fn info(&self) -> &RigInfo {
        &self.info
    }

    /// Latest published snapshot.
    pub fn read_state(&self) -> RigState {
        self.reader.read()
    }

    /// A cloneable reader for consumers that outlive a borrow of the
    /// handle.
    pub fn reader(&self) -> CacheReader {
        self.reader.clone()
    }

    /// Enqueue a write. After `stop` the request is silently discarded.
    pub fn submit_request(&self, value: FieldValue) -> RigResult<Submitted> {
        match self.requests.submit(value) {
            Err(RigError::ShutdownInProgress) => Ok(Submitted::Discarded),
            other => other,
        }
    }

    /// Whether the bound rig can report `field`.
    pub fn has_capability(&self, field: RigField) -> bool {
        self.reader.has_capability(field)
    }

    pub fn can_write(&self, field: RigField) -> bool {
        self.requests.writable().contains(field)
    }

    pub fn phase(&self) -> DaemonPhase {
        *self.phase_rx.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<DaemonPhase> {
        self.phase_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some() && !self.phase().is_shutting_down()
    }

    /// Stop the daemon and wait for it to close the transport.
    ///
    /// Blocks the calling thread for at most one daemon phase plus the
    /// close call. Calling it again is a no-op.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.requests.close();
        self.stop_tx.send_replace(true);
        if thread.join().is_err() {
            error!("Daemon thread panicked");
        }
    }
}

impl RequestSink for RigHandle {
    fn submit(&self, value: FieldValue) -> RigResult<Submitted> {
        self.submit_request(value)
    }
}

impl Drop for RigHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn daemon_thread(
    config: DaemonConfig,
    stop_rx: watch::Receiver<bool>,
    ready_tx: std_mpsc::SyncSender<RigResult<Started>>,
) {
    let model = config.open.model_id.to_string();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready_tx.send(Err(RigError::fatal_startup(model, e)));
            return;
        }
    };

    runtime.block_on(async move {
        let daemon = match DaemonLoop::start(config).await {
            Ok(daemon) => daemon,
            Err(e) => {
                error!("{}", e);
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        let started = Started {
            info: daemon.info().clone(),
            reader: daemon.reader(),
            requests: daemon.requests(),
            phase_rx: daemon.subscribe_phase(),
        };
        if ready_tx.send(Ok(started)).is_err() {
            warn!("Handle went away during startup");
            daemon.shutdown().await;
            return;
        }
        daemon.run(stop_rx).await;
    });
}
