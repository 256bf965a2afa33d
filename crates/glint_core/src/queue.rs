//! Cross-thread FIFOs
//!
//! [`UpdateQueue`] carries requests from the controller thread to the render
//! thread; [`NotificationQueue`] carries results back. Both are plain
//! mutex-guarded deques: every operation is a short critical section and
//! never waits on the other thread.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifier assigned to a request when it is enqueued
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Controller → render FIFO
pub struct UpdateQueue<T> {
    pending: Arc<Mutex<VecDeque<(RequestId, T)>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> UpdateQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Append a request, returning its id
    pub fn enqueue(&self, request: T) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pending.lock().push_back((id, request));
        id
    }

    /// Take the whole pending batch in enqueue order
    pub fn drain(&self) -> Vec<(RequestId, T)> {
        let mut pending = self.pending.lock();
        pending.drain(..).collect()
    }

    /// Remove a request that has not been drained yet
    ///
    /// Returns `None` once the request is gone (already drained or cancelled).
    /// The returned request is the caller's to drop, which releases whatever
    /// it retained.
    pub fn cancel(&self, id: RequestId) -> Option<T> {
        let mut pending = self.pending.lock();
        let pos = pending.iter().position(|(queued, _)| *queued == id)?;
        pending.remove(pos).map(|(_, request)| request)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl<T> Clone for UpdateQueue<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for UpdateQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for UpdateQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Render → controller FIFO
pub struct NotificationQueue<T> {
    ready: Arc<Mutex<VecDeque<T>>>,
}

impl<T> NotificationQueue<T> {
    pub fn new() -> Self {
        Self {
            ready: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, notification: T) {
        self.ready.lock().push_back(notification);
    }

    pub fn extend(&self, notifications: impl IntoIterator<Item = T>) {
        self.ready.lock().extend(notifications);
    }

    /// Take everything delivered so far, oldest first
    pub fn take_all(&self) -> Vec<T> {
        self.ready.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.ready.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.lock().is_empty()
    }
}

impl<T> Clone for NotificationQueue<T> {
    fn clone(&self) -> Self {
        Self {
            ready: Arc::clone(&self.ready),
        }
    }
}

impl<T> Default for NotificationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NotificationQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("ready", &self.len())
            .finish()
    }
}
