//! # Provider Service
//!
//! `ProviderPipeline` owns the dispatch queue, the worker thread and the
//! shutdown sequence. The directory and spool handles are shared with the
//! worker; only `halt` ever closes them.
//!
//! ## Shutdown
//!
//! 1. Take the queue sender under the write lock. `on_packet` holds the read
//!    lock while it counts and sends, so nothing slips in afterwards.
//! 2. Wait for the in-flight count to reach zero.
//! 3. Join the worker (it exits once the queue is closed and empty).
//! 4. Close the spool, then the directory.

mod dispatch;
mod in_flight;
mod queue;


use std::sync::{Arc, Once, Weak};
use std::thread::{self, JoinHandle};

use mx_01_user_db::UserDirectoryApi;
use mx_02_spool::Spool;
use parking_lot::{Mutex, RwLock};
use shared_types::{to_print_string, Packet, PeerCredentials};

use crate::domain::config::ProviderConfig;
use crate::domain::errors::ProviderError;
use crate::domain::stats::{ProviderStats, StatsSnapshot};
use crate::ports::inbound::ProviderApi;
use crate::ports::outbound::{PacketScheduler, SurbAckFactory};

use dispatch::Dispatcher;
pub use in_flight::InFlight;
use queue::{QueueReceiver, QueueSender};

/// The provider packet pipeline.
pub struct ProviderPipeline {
    directory: Arc<dyn UserDirectoryApi>,
    spool: Arc<dyn Spool>,
    sender: RwLock<Option<QueueSender>>,
    in_flight: Arc<InFlight>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<ProviderStats>,
    halt_once: Once,
}

impl ProviderPipeline {
    /// Start the worker over already opened storage.
    ///
    /// The pipeline takes over closing `directory` and `spool`. `scheduler`
    /// is held weakly; acks produced after it is dropped are discarded.
    pub fn start(
        directory: Arc<dyn UserDirectoryApi>,
        spool: Arc<dyn Spool>,
        ack_factory: Arc<dyn SurbAckFactory>,
        scheduler: Weak<dyn PacketScheduler>,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let (tx, rx) = queue::channel(config.queue_policy);
        let stats = Arc::new(ProviderStats::default());
        let in_flight = Arc::new(InFlight::new());

        let dispatcher = Dispatcher {
            directory: Arc::clone(&directory),
            spool: Arc::clone(&spool),
            ack_factory,
            scheduler,
            stats: Arc::clone(&stats),
        };

        let worker = {
            let in_flight = Arc::clone(&in_flight);
            thread::Builder::new()
                .name(config.worker_name.clone())
                .spawn(move || worker_loop(rx, dispatcher, in_flight))
                .map_err(|e| ProviderError::Spawn(e.to_string()))?
        };

        tracing::info!(
            "[provider] Started worker '{}' ({:?} queue)",
            config.worker_name,
            config.queue_policy
        );

        Ok(Self {
            directory,
            spool,
            sender: RwLock::new(Some(tx)),
            in_flight,
            worker: Mutex::new(Some(worker)),
            stats,
            halt_once: Once::new(),
        })
    }

    /// Packets accepted but not yet disposed.
    pub fn pending(&self) -> usize {
        self.in_flight.current()
    }

    fn teardown(&self) {
        tracing::debug!("[provider] Halting");

        drop(self.sender.write().take());
        self.in_flight.wait_drained();

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("[provider] Worker panicked");
            }
        }

        self.spool.close();
        self.directory.close();
        tracing::info!("[provider] Halted");
    }
}

fn worker_loop(mut rx: QueueReceiver, dispatcher: Dispatcher, in_flight: Arc<InFlight>) {
    let _guard = WorkerGuard;
    while let Some(pkt) = rx.blocking_recv() {
        dispatcher.dispatch(pkt);
        in_flight.exit();
    }
    tracing::debug!("[provider] Worker exiting");
}

/// A panicking worker means an invariant broke mid-packet (a `BUG:` in the
/// directory or spool). The rest of the node must not keep serving from that
/// state, and `halt` could never drain, so the process aborts.
struct WorkerGuard;

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("[provider] Worker panicked, aborting");
            std::process::abort();
        }
    }
}

impl ProviderApi for ProviderPipeline {
    fn on_packet(&self, pkt: Packet) -> Result<(), ProviderError> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            ProviderStats::bump(&self.stats.rejected);
            return Err(ProviderError::Halted);
        };

        self.in_flight.enter();
        match sender.send(pkt) {
            Ok(()) => {
                ProviderStats::bump(&self.stats.received);
                Ok(())
            }
            Err(e) => {
                self.in_flight.exit();
                ProviderStats::bump(&self.stats.rejected);
                tracing::debug!("[provider] Rejected packet: {}", e);
                Err(e)
            }
        }
    }

    fn authenticate_client(&self, creds: &PeerCredentials) -> bool {
        let is_valid = self
            .directory
            .is_valid(&creds.additional_data, &creds.public_key);
        if !is_valid {
            tracing::debug!(
                "[provider] Authentication failed: '{}'",
                to_print_string(&creds.additional_data)
            );
        }
        is_valid
    }

    fn halt(&self) {
        self.halt_once.call_once(|| self.teardown());
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for ProviderPipeline {
    fn drop(&mut self) {
        self.halt();
    }
}
