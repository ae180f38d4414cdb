//! Motor events and the thread-safe scheduled-event queue.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::motor::{Direction, Motor};

/// An immutable directive to set a motor's speed and/or run direction.
///
/// Both fields may be present; application order is speed, then run. An
/// event with neither field set applies as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorEvent {
    pub motor: Motor,
    pub speed: Option<u8>,
    pub run: Option<Direction>,
}

impl MotorEvent {
    pub fn speed(motor: Motor, speed: u8) -> Self {
        Self {
            motor,
            speed: Some(speed),
            run: None,
        }
    }

    pub fn run(motor: Motor, dir: Direction) -> Self {
        Self {
            motor,
            speed: None,
            run: Some(dir),
        }
    }

    pub fn speed_and_run(motor: Motor, speed: u8, dir: Direction) -> Self {
        Self {
            motor,
            speed: Some(speed),
            run: Some(dir),
        }
    }
}

/// A motor event bound to the instant it becomes due.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledEvent {
    pub at: Instant,
    pub event: MotorEvent,
}

// Heap entry; the sequence number preserves insertion order among entries
// scheduled for the same instant.
struct Entry {
    at: Instant,
    seq: u64,
    event: MotorEvent,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

struct QueueInner {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

/// Min-priority queue of scheduled events, keyed by instant.
///
/// Any thread may push; exactly one consumer is expected to call
/// [`EventQueue::pop_due`]. An inserted event is delivered at most once.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Inserts an event due at `at`. Never blocks beyond the internal
    /// lock; the queue is unbounded.
    pub fn push(&self, at: Instant, event: MotorEvent) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Reverse(Entry { at, seq, event }));
    }

    /// Inserts a batch under one lock hold, preserving its order for
    /// same-instant entries.
    pub fn push_all(&self, events: impl IntoIterator<Item = ScheduledEvent>) {
        let mut inner = self.inner.lock();
        for scheduled in events {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(Reverse(Entry {
                at: scheduled.at,
                seq,
                event: scheduled.event,
            }));
        }
    }

    /// Removes and returns the minimum-instant event if it is due at
    /// `now`; leaves the queue untouched otherwise. Peek-then-pop, so a
    /// not-yet-due event is never popped and re-pushed.
    pub fn pop_due(&self, now: Instant) -> Option<MotorEvent> {
        let mut inner = self.inner.lock();
        let due = matches!(inner.heap.peek(), Some(Reverse(entry)) if entry.at <= now);
        if due {
            inner.heap.pop().map(|Reverse(entry)| entry.event)
        } else {
            None
        }
    }

    /// Drops every pending event.
    pub fn clear(&self) {
        self.inner.lock().heap.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
