//! Queue-backed beacon.
//!
//! [`QueuedBeacon`] accepts payloads without blocking and hands them to a
//! worker thread that owns a ureq `Agent`. Closing the beacon (explicitly or
//! on drop) drains everything still queued. Nothing drains the queue when
//! the process exits on its own, so the beacon reports that it does not
//! survive unload.

use std::{
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use log::{debug, warn};
use parking_lot::Mutex;
use ureq::Agent;

use crate::diagnostics::LOG_TARGET;
use crate::rate_limited_warner::RateLimitedWarner;

use super::config::TransportConfig;
use super::mechanism::{Beacon, BeaconPayload, DeliveryOutcome, TransportError, classify_status};

/// Commands processed by the beacon worker.
#[derive(Debug)]
enum BeaconCommand {
    Send { url: String, payload: BeaconPayload },
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Non-blocking beacon backed by a bounded queue and one worker thread.
pub struct QueuedBeacon {
    tx: Mutex<Option<Sender<BeaconCommand>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    warner: RateLimitedWarner,
    flush_timeout: Duration,
}

impl QueuedBeacon {
    /// Spawn the worker and return the beacon feeding it.
    pub fn with_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let (tx, rx) = bounded(config.beacon_capacity);
        let agent = config.agent();
        let handle = thread::Builder::new()
            .name("femtoreport-beacon".into())
            .spawn(move || Worker { agent }.run(rx))
            .map_err(TransportError::Spawn)?;
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            warner: RateLimitedWarner::new(config.warn_interval),
            flush_timeout: config.write_timeout,
        })
    }

    /// Wait until every payload queued so far has been processed.
    ///
    /// Returns `false` if the beacon is closed or the deadline passes first.
    pub fn flush(&self) -> bool {
        let Some(tx) = self.sender() else {
            return false;
        };
        if let Some(count) = self.warner.take_pending() {
            warn!(target: LOG_TARGET, "beacon queue full; declined {count} reports");
        }
        let deadline = Instant::now() + self.flush_timeout;
        let (ack_tx, ack_rx) = bounded(1);
        if tx
            .send_timeout(BeaconCommand::Flush(ack_tx), self.flush_timeout)
            .is_err()
        {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        ack_rx.recv_timeout(remaining).is_ok()
    }

    /// Drain the queue and stop the worker.
    pub fn close(&self) {
        self.request_shutdown();
        self.join_worker();
    }

    fn sender(&self) -> Option<Sender<BeaconCommand>> {
        self.tx.lock().as_ref().cloned()
    }

    fn request_shutdown(&self) {
        let Some(tx) = self.tx.lock().take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(BeaconCommand::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv_timeout(self.flush_timeout);
    }

    fn join_worker(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!(target: LOG_TARGET, "beacon worker thread panicked");
        }
    }
}

impl Beacon for QueuedBeacon {
    fn send_beacon(&self, url: &str, payload: BeaconPayload) -> Result<bool, TransportError> {
        let Some(tx) = self.sender() else {
            return Err(TransportError::Closed);
        };
        let command = BeaconCommand::Send {
            url: url.to_owned(),
            payload,
        };
        match tx.try_send(command) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                if let Some(count) = self.warner.record_drop() {
                    warn!(target: LOG_TARGET, "beacon queue full; declined {count} reports");
                }
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(TransportError::Closed),
        }
    }

    fn survives_unload(&self) -> bool {
        false
    }
}

impl Drop for QueuedBeacon {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for QueuedBeacon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedBeacon")
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}

struct Worker {
    agent: Agent,
}

impl Worker {
    fn deliver(&self, url: &str, payload: &BeaconPayload) -> DeliveryOutcome {
        let outcome = match self
            .agent
            .post(url)
            .set("Content-Type", payload.content_type())
            .send_bytes(payload.bytes())
        {
            Ok(response) => classify_status(response.status()),
            Err(ureq::Error::Status(code, _)) => classify_status(code),
            Err(ureq::Error::Transport(err)) => DeliveryOutcome::Failed(err.to_string()),
        };
        match &outcome {
            DeliveryOutcome::Accepted(status) => {
                debug!(target: LOG_TARGET, "beacon to {url} accepted with status {status}");
            }
            DeliveryOutcome::Rejected(status) => {
                warn!(target: LOG_TARGET, "beacon to {url} rejected with status {status}");
            }
            DeliveryOutcome::Failed(reason) => {
                warn!(target: LOG_TARGET, "beacon to {url} failed: {reason}");
            }
        }
        outcome
    }

    fn handle(&self, command: BeaconCommand) {
        match command {
            BeaconCommand::Send { url, payload } => {
                self.deliver(&url, &payload);
            }
            // Ignore send errors: if the receiver has dropped there is
            // nothing left to acknowledge.
            BeaconCommand::Flush(ack) | BeaconCommand::Shutdown(ack) => {
                let _ = ack.send(());
            }
        }
    }

    fn drain_pending(&self, rx: &Receiver<BeaconCommand>) {
        loop {
            match rx.try_recv() {
                Ok(command) => self.handle(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn run(self, rx: Receiver<BeaconCommand>) {
        loop {
            match rx.recv() {
                Ok(BeaconCommand::Shutdown(ack)) => {
                    self.drain_pending(&rx);
                    let _ = ack.send(());
                    break;
                }
                Ok(command) => self.handle(command),
                Err(_) => {
                    self.drain_pending(&rx);
                    break;
                }
            }
        }
    }
}
