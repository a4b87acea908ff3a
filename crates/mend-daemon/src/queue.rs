//! Pending-path queue with in-flight tracking

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use dashmap::DashSet;
use parking_lot::Mutex;

/// Queue of candidate paths awaiting a heal attempt.
///
/// A path is handed to at most one worker at a time: concurrent heals of
/// the same path could race on changelog clears and read an inconsistent
/// matrix. Distinct paths are healed concurrently.
pub struct HealQueue {
    pending: Mutex<VecDeque<PathBuf>>,
    in_flight: DashSet<PathBuf>,
}

impl HealQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            in_flight: DashSet::new(),
        }
    }

    /// Add a path. Duplicates of pending or in-flight work are dropped;
    /// returns whether the path was queued.
    pub fn push(&self, path: PathBuf) -> bool {
        let mut pending = self.pending.lock();
        if self.in_flight.contains(&path) || pending.iter().any(|p| p == &path) {
            return false;
        }
        pending.push_back(path);
        true
    }

    /// Take the next path, marking it in flight.
    pub fn pop(&self) -> Option<PathBuf> {
        let mut pending = self.pending.lock();
        let path = pending.pop_front()?;
        self.in_flight.insert(path.clone());
        Some(path)
    }

    /// Release a path after its heal attempt finished.
    pub fn complete(&self, path: &Path) {
        self.in_flight.remove(path);
    }

    /// Whether no work is pending or in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty() && self.in_flight.is_empty()
    }

    /// Number of paths waiting for a worker.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of paths currently being healed.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

impl Default for HealQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = HealQueue::new();
        assert!(queue.push(PathBuf::from("a")));
        assert!(queue.push(PathBuf::from("b")));

        assert_eq!(queue.pop(), Some(PathBuf::from("a")));
        assert_eq!(queue.pop(), Some(PathBuf::from("b")));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pending_duplicates_are_dropped() {
        let queue = HealQueue::new();
        assert!(queue.push(PathBuf::from("a")));
        assert!(!queue.push(PathBuf::from("a")));
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_in_flight_path_cannot_be_requeued() {
        let queue = HealQueue::new();
        queue.push(PathBuf::from("a"));
        let popped = queue.pop().unwrap();
        assert_eq!(queue.in_flight_len(), 1);

        // Still in flight: the same path must not reach a second worker.
        assert!(!queue.push(PathBuf::from("a")));
        assert_eq!(queue.pop(), None);

        queue.complete(&popped);
        assert!(queue.is_empty());
        assert!(queue.push(PathBuf::from("a")));
    }

    #[test]
    fn test_is_empty_counts_in_flight_work() {
        let queue = HealQueue::new();
        queue.push(PathBuf::from("a"));
        let popped = queue.pop().unwrap();
        assert!(!queue.is_empty());
        queue.complete(&popped);
        assert!(queue.is_empty());
    }
}
