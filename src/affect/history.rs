//! 最近状态历史
//!
//! 新到标签仅在与最新一条不同时插入队首（游程去重），长度上限为 capacity，
//! 超出时丢弃最旧的记录。

use std::collections::VecDeque;

use chrono::Utc;

use crate::affect::types::{HistoryEntry, ObservedState};

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns `true` when the entry was recorded, `false` for a repeat of the newest label.
    pub fn push(&mut self, state: ObservedState) -> bool {
        if self.newest() == Some(state) {
            return false;
        }

        self.entries.push_front(HistoryEntry {
            state,
            observed_at: Utc::now(),
        });
        self.entries.truncate(self.capacity);
        true
    }

    pub fn newest(&self) -> Option<ObservedState> {
        self.entries.front().map(|entry| entry.state)
    }

    /// Newest-first copy of the entries.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn states(&self) -> Vec<ObservedState> {
        self.entries.iter().map(|entry| entry.state).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
