//! Dispatch queue halves for both queue policies.

use shared_types::Packet;
use tokio::sync::mpsc;

use crate::domain::config::QueuePolicy;
use crate::domain::errors::ProviderError;

pub(crate) enum QueueSender {
    Unbounded(mpsc::UnboundedSender<Packet>),
    Bounded {
        tx: mpsc::Sender<Packet>,
        capacity: usize,
    },
}

pub(crate) enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<Packet>),
    Bounded(mpsc::Receiver<Packet>),
}

pub(crate) fn channel(policy: QueuePolicy) -> (QueueSender, QueueReceiver) {
    match policy {
        QueuePolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
        QueuePolicy::Bounded { capacity } => {
            let capacity = capacity.max(1);
            let (tx, rx) = mpsc::channel(capacity);
            (
                QueueSender::Bounded { tx, capacity },
                QueueReceiver::Bounded(rx),
            )
        }
    }
}

impl QueueSender {
    /// Never blocks. On error the packet is dropped.
    pub(crate) fn send(&self, pkt: Packet) -> Result<(), ProviderError> {
        match self {
            QueueSender::Unbounded(tx) => tx.send(pkt).map_err(|_| ProviderError::Halted),
            QueueSender::Bounded { tx, capacity } => tx.try_send(pkt).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ProviderError::QueueFull {
                    capacity: *capacity,
                },
                mpsc::error::TrySendError::Closed(_) => ProviderError::Halted,
            }),
        }
    }
}

impl QueueReceiver {
    /// Block the calling (non-async) thread for the next packet. `None` once
    /// every sender is gone and the queue is empty.
    pub(crate) fn blocking_recv(&mut self) -> Option<Packet> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.blocking_recv(),
            QueueReceiver::Bounded(rx) => rx.blocking_recv(),
        }
    }
}
