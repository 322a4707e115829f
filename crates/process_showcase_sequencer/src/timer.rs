// SPDX-License-Identifier: MIT OR Apache-2.0
//! Virtual-clock timer queue.
//!
//! All scheduled work runs on one logical thread. Tasks fire by ascending
//! due time and, for equal due times, in the order they were scheduled.
//! The clock only moves when the owner drains the queue or advances it.

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A task waiting for its due time
#[derive(Debug, Clone)]
pub struct ScheduledTask<T> {
    /// Task handle
    pub id: TimerId,
    /// Virtual time at which the task fires
    pub due_at: u64,
    /// Scheduling sequence number, breaks ties between equal due times
    order: u64,
    /// Task payload
    pub task: T,
}

/// Pending tasks plus the virtual clock they are measured against
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    tasks: Vec<ScheduledTask<T>>,
    now_ms: u64,
    next_id: u64,
    next_order: u64,
}

impl<T> TimerQueue<T> {
    /// Create an empty queue with the clock at zero
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            now_ms: 0,
            next_id: 1,
            next_order: 0,
        }
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` to fire `delay_ms` after the current time
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let order = self.next_order;
        self.next_order += 1;

        self.tasks.push(ScheduledTask {
            id,
            due_at: self.now_ms.saturating_add(delay_ms),
            order,
            task,
        });
        id
    }

    /// Cancel one task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every pending task, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.due_at).min()
    }

    /// Remove the next task due at or before `until_ms`, moving the clock to its due time
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTask<T>> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= until_ms)
            .min_by_key(|(_, t)| (t.due_at, t.order))
            .map(|(index, _)| index)?;

        let task = self.tasks.remove(index);
        self.now_ms = self.now_ms.max(task.due_at);
        Some(task)
    }

    /// Move the clock forward to `target_ms` without firing anything.
    ///
    /// The clock never moves backwards.
    pub fn advance_to(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate pending tasks in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask<T>> {
        self.tasks.iter()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
