//! Request buffer between the orchestration listener and the worker.
//!
//! Unbounded FIFO: producers never block, the single consumer either blocks
//! for the first request of a cycle or drains whatever is buffered.

use crossbeam::channel::{self, Receiver, Sender};

use crate::core::MessageId;

/// A pending request for one build cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecompileRequest {
    pub message_id: MessageId,
}

impl RecompileRequest {
    /// Request with a freshly generated id.
    pub fn new() -> Self {
        Self::with_id(MessageId::generate())
    }

    pub fn with_id(message_id: MessageId) -> Self {
        Self { message_id }
    }
}

impl Default for RecompileRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Multi-producer request buffer. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    tx: Sender<RecompileRequest>,
    rx: Receiver<RecompileRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// Buffer seeded with one generated request when `warmup` is set.
    ///
    /// In continuous mode the seed starts the long-lived build, otherwise it
    /// warms up the build tool before the first real change.
    pub fn with_warmup(warmup: bool) -> Self {
        let queue = Self::new();
        if warmup {
            queue.enqueue(RecompileRequest::new());
        }
        queue
    }

    /// Append a request. Never blocks.
    pub fn enqueue(&self, request: RecompileRequest) {
        // The queue owns a receiver, so the channel can never be disconnected
        let _ = self.tx.send(request);
    }

    /// Number of buffered requests.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take the next batch: everything buffered, or block for one request.
    ///
    /// Returns `None` once `shutdown` is disconnected, leaving buffered
    /// requests untouched.
    pub fn take_batch(&self, shutdown: &Receiver<()>) -> Option<Vec<RecompileRequest>> {
        if is_disconnected(shutdown) {
            return None;
        }

        let mut batch = self.drain();
        if batch.is_empty() {
            channel::select! {
                recv(self.rx) -> request => batch.extend(request.ok()),
                recv(shutdown) -> _ => return None,
            }
            batch.extend(self.drain());
        }
        Some(batch)
    }

    fn drain(&self) -> Vec<RecompileRequest> {
        self.rx.try_iter().collect()
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown is signaled by dropping the sender.
pub(super) fn is_disconnected(shutdown: &Receiver<()>) -> bool {
    matches!(shutdown.try_recv(), Err(channel::TryRecvError::Disconnected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn request(id: &str) -> RecompileRequest {
        RecompileRequest::with_id(MessageId::new(id))
    }

    fn ids(batch: &[RecompileRequest]) -> Vec<&str> {
        batch.iter().map(|r| r.message_id.as_str()).collect()
    }

    #[test]
    fn test_batch_drains_everything_in_order() {
        let (_keep, shutdown) = channel::unbounded::<()>();
        let queue = RequestQueue::new();
        for id in ["a", "b", "c"] {
            queue.enqueue(request(id));
        }

        let batch = queue.take_batch(&shutdown).unwrap();
        assert_eq!(ids(&batch), ["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_batch_blocks_for_first_request() {
        let (_keep, shutdown) = channel::unbounded::<()>();
        let queue = RequestQueue::new();
        let producer = queue.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            producer.enqueue(request("late"));
        });

        let batch = queue.take_batch(&shutdown).unwrap();
        assert_eq!(ids(&batch), ["late"]);
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_unblocks_idle_wait() {
        let (stop, shutdown) = channel::unbounded::<()>();
        let queue = RequestQueue::new();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(stop);
        });

        let start = Instant::now();
        assert!(queue.take_batch(&shutdown).is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_leaves_buffer_untouched() {
        let (stop, shutdown) = channel::unbounded::<()>();
        let queue = RequestQueue::new();
        queue.enqueue(request("a"));
        drop(stop);

        assert!(queue.take_batch(&shutdown).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_warmup_seeds_one_request() {
        assert_eq!(RequestQueue::with_warmup(true).len(), 1);
        assert!(RequestQueue::with_warmup(false).is_empty());
    }
}
