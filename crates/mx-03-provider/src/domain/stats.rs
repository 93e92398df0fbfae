//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by the worker and by `on_packet`.
#[derive(Debug, Default)]
pub struct ProviderStats {
    pub(crate) received: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) dropped_recipient: AtomicU64,
    pub(crate) dropped_malformed: AtomicU64,
    pub(crate) stored_messages: AtomicU64,
    pub(crate) stored_surb_replies: AtomicU64,
    pub(crate) store_failures: AtomicU64,
    pub(crate) acks_scheduled: AtomicU64,
    pub(crate) ack_failures: AtomicU64,
}

/// Point-in-time copy of [`ProviderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub rejected: u64,
    pub dropped_recipient: u64,
    pub dropped_malformed: u64,
    pub stored_messages: u64,
    pub stored_surb_replies: u64,
    pub store_failures: u64,
    pub acks_scheduled: u64,
    pub ack_failures: u64,
}

impl ProviderStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            received: load(&self.received),
            rejected: load(&self.rejected),
            dropped_recipient: load(&self.dropped_recipient),
            dropped_malformed: load(&self.dropped_malformed),
            stored_messages: load(&self.stored_messages),
            stored_surb_replies: load(&self.stored_surb_replies),
            store_failures: load(&self.store_failures),
            acks_scheduled: load(&self.acks_scheduled),
            ack_failures: load(&self.ack_failures),
        }
    }
}
