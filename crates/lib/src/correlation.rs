//! Reply correlation: chat message id -> mesh device id.
//!
//! Outbound: after the chat gateway accepts a send, the returned message id is bound to the
//! mesh device that asked for it. Inbound: a chat reply quoting that id is routed back to
//! the device.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Store consulted by the router to route quoted replies.
pub trait ReplyCorrelator: Send + Sync {
    /// Bind a sent message id to the originating device. Last write wins for a repeated id.
    fn record(&self, message_id: &str, device_id: &str);
    /// Resolve the device for a quoted message id. Does not remove the entry.
    fn lookup(&self, message_id: &str) -> Option<String>;
}

/// In-memory correlation table bounded to `capacity` entries. Recording or resolving an id
/// marks it as recently used; the least recently used entry is evicted first.
pub struct ReplyTable {
    inner: Mutex<LruCache<String, String>>,
}

impl ReplyTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplyCorrelator for ReplyTable {
    fn record(&self, message_id: &str, device_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(message_id.to_string(), device_id.to_string());
    }

    fn lookup(&self, message_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(message_id)
            .cloned()
    }
}
