//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! A small binary-heap-backed deferred-task scheduler.
//!
//! Generalizes the read/idle-timeout handling already done ad hoc with
//! `tokio::time::{sleep, timeout}` in `worker.rs` into one `next_deadline()`
//! query the event loop can use to size its single wait (§4.7 steps 2-3).
//! The 5 s deferred-close timer for a socket with output still draining
//! (§5, scenario S7) is just one more scheduled task, not a separate
//! mechanism.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tokio::time::Instant;

/// Identifies a scheduled task for cancellation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

struct Entry {
    deadline: Instant,
    id: TaskId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline).then(self.id.cmp(&other.id))
    }
}

/// A deferred-task scheduler: `schedule` a closure for a future instant,
/// and `run_due` fires every closure whose deadline has passed.
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    tasks: std::collections::HashMap<TaskId, Box<dyn FnOnce() + Send>>,
    next_id: u64,
}

impl Scheduler {
    /// Build an empty scheduler.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            tasks: std::collections::HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to run at or after `deadline`. Returns an id that
    /// can be used to cancel it before it fires.
    pub fn schedule(&mut self, deadline: Instant, task: impl FnOnce() + Send + 'static) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry { deadline, id }));
        self.tasks.insert(id, Box::new(task));
        id
    }

    /// Cancel a previously scheduled task. No-op if it already fired or
    /// the id is unknown.
    pub fn cancel(&mut self, id: TaskId) {
        self.tasks.remove(&id);
    }

    /// The deadline of the earliest still-pending task, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap
            .iter()
            .find(|Reverse(entry)| self.tasks.contains_key(&entry.id))
            .map(|Reverse(entry)| entry.deadline)
    }

    /// Run every task due at or before `now`, in deadline order.
    pub fn run_due(&mut self, now: Instant) {
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            let Reverse(entry) = self.heap.pop().unwrap();
            if let Some(task) = self.tasks.remove(&entry.id) {
                task();
            }
        }
    }

    /// Whether any task is still pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
