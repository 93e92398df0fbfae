//! Pipeline configuration.

/// How the dispatch queue behaves when the worker falls behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    /// Never refuse a packet. Memory grows if the worker stalls.
    #[default]
    Unbounded,
    /// Refuse packets once `capacity` are waiting.
    Bounded { capacity: usize },
}

impl QueuePolicy {
    /// `None` maps to the unbounded queue.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => QueuePolicy::Bounded { capacity },
            None => QueuePolicy::Unbounded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub queue_policy: QueuePolicy,
    /// Name of the worker thread.
    pub worker_name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            queue_policy: QueuePolicy::Unbounded,
            worker_name: "provider-worker".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn with_queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }
}
