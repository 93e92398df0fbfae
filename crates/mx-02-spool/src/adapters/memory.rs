use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use shared_types::SurbId;

use crate::domain::entities::{SpoolEntry, SpoolMessage};
use crate::domain::errors::SpoolError;
use crate::domain::keys::validate_user;
use crate::ports::inbound::Spool;

/// In-memory spool. Contents are lost when the process exits.
pub struct MemorySpool {
    queues: Mutex<Option<HashMap<Vec<u8>, VecDeque<SpoolEntry>>>>,
}

impl Default for MemorySpool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySpool {
    /// An open, empty spool. `close` moves it to the closed state.
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(Some(HashMap::new())),
        }
    }

    fn append(&self, user: &[u8], entry: SpoolEntry) -> Result<(), SpoolError> {
        validate_user(user)?;
        let mut guard = self.queues.lock();
        let queues = guard.as_mut().ok_or(SpoolError::Closed)?;
        queues.entry(user.to_vec()).or_default().push_back(entry);
        Ok(())
    }

    /// Number of entries queued for `user`.
    pub fn len(&self, user: &[u8]) -> usize {
        self.queues
            .lock()
            .as_ref()
            .and_then(|q| q.get(user))
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

impl Spool for MemorySpool {
    fn store_message(&self, user: &[u8], msg: &[u8]) -> Result<(), SpoolError> {
        self.append(user, SpoolEntry::Message(msg.to_vec()))
    }

    fn store_surb_reply(&self, user: &[u8], id: &SurbId, msg: &[u8]) -> Result<(), SpoolError> {
        self.append(
            user,
            SpoolEntry::SurbReply {
                id: *id,
                payload: msg.to_vec(),
            },
        )
    }

    fn get(&self, user: &[u8], advance: bool) -> Result<Option<SpoolMessage>, SpoolError> {
        validate_user(user)?;
        let mut guard = self.queues.lock();
        let queues = guard.as_mut().ok_or(SpoolError::Closed)?;
        let Some(queue) = queues.get_mut(user) else {
            return Ok(None);
        };
        if advance {
            queue.pop_front();
        }
        let head = queue.front().cloned().map(SpoolMessage::from);
        if queue.is_empty() {
            queues.remove(user);
        }
        Ok(head)
    }

    fn close(&self) {
        self.queues.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_with_advance() {
        let spool = MemorySpool::new();
        spool.store_message(b"alice", b"one").unwrap();
        spool.store_message(b"alice", b"two").unwrap();

        let head = spool.get(b"alice", false).unwrap().unwrap();
        assert_eq!(head.payload, b"one");
        assert_eq!(head.surb_id, None);

        let next = spool.get(b"alice", true).unwrap().unwrap();
        assert_eq!(next.payload, b"two");

        assert_eq!(spool.get(b"alice", true).unwrap(), None);
        assert_eq!(spool.len(b"alice"), 0);
    }

    #[test]
    fn test_surb_reply_carries_id() {
        let spool = MemorySpool::new();
        let id = SurbId([3; 16]);
        spool.store_surb_reply(b"bob", &id, b"reply").unwrap();

        let head = spool.get(b"bob", false).unwrap().unwrap();
        assert_eq!(head.surb_id, Some(id));
        assert_eq!(head.payload, b"reply");
    }

    #[test]
    fn test_users_are_independent() {
        let spool = MemorySpool::new();
        spool.store_message(b"alice", b"a").unwrap();
        spool.store_message(b"bob", b"b").unwrap();

        assert_eq!(spool.get(b"alice", true).unwrap(), None);
        assert_eq!(spool.get(b"bob", false).unwrap().unwrap().payload, b"b");
    }

    #[test]
    fn test_default_spool_is_open() {
        let spool = MemorySpool::default();
        spool.store_message(b"alice", b"m").unwrap();
        assert_eq!(spool.get(b"alice", false).unwrap().unwrap().payload, b"m");
    }

    #[test]
    fn test_closed_spool() {
        let spool = MemorySpool::new();
        spool.close();
        spool.close();
        assert_eq!(spool.store_message(b"a", b"m"), Err(SpoolError::Closed));
    }
}
