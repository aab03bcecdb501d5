//! Bounded in-process history
//!
//! Append-only ring buffer shared between a writer (the policy component
//! that produces records) and readers (stats and health reporting).
//! Oldest entries are evicted once capacity is reached.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Bounded ring buffer, cheap to clone (clones share storage)
#[derive(Debug)]
pub struct BoundedHistory<T> {
    entries: Arc<RwLock<VecDeque<T>>>,
    capacity: usize,
}

impl<T> Clone for BoundedHistory<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Create a history holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&self, entry: T) {
        let mut entries = self.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copy of all entries, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }

    /// Last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<T> {
        let entries = self.read();
        let start = entries.len().saturating_sub(n);
        entries.iter().skip(start).cloned().collect()
    }

    /// Entries matching a predicate, oldest first
    pub fn filtered<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.read().iter().filter(|e| predicate(e)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // A poisoned lock only means a writer panicked mid-push; the deque is still valid.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<T>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<T>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
