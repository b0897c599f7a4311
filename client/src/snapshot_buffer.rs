//! Bounded, arrival-ordered history of world snapshots

use crate::clock::Timestamp;
use crate::config::MIN_BUFFER_CAPACITY;
use crate::interpolation::InterpolationError;
use log::{trace, warn};
use shared::WorldSnapshot;
use std::collections::VecDeque;

/// A world snapshot stamped with its local arrival time. Never mutated once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSnapshot {
    pub arrival_time: Timestamp,
    pub data: WorldSnapshot,
}

impl TimedSnapshot {
    pub fn tick(&self) -> u64 {
        self.data.tick
    }
}

/// Two buffered snapshots straddling a render instant.
///
/// `from` and `to` are the same entry when the render instant is past the
/// newest snapshot (`frozen`); the frame then shows the newest state as-is.
#[derive(Debug, Clone, Copy)]
pub struct Bracket<'a> {
    pub from: &'a TimedSnapshot,
    pub to: &'a TimedSnapshot,
    pub frozen: bool,
}

impl Bracket<'_> {
    /// True when both ends are the same buffered entry.
    pub fn is_degenerate(&self) -> bool {
        std::ptr::eq(self.from, self.to)
    }
}

/// FIFO snapshot store with a fixed capacity.
///
/// Entries are kept in insertion order, which is also arrival order, and the
/// oldest entry is evicted once the capacity is reached.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    entries: VecDeque<TimedSnapshot>,
    capacity: usize,
}

impl SnapshotBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a snapshot received at `arrival_time`.
    ///
    /// An arrival stamp older than the newest entry (or not finite) is raised
    /// to the newest entry's stamp so arrival times never decrease.
    pub fn push(&mut self, data: WorldSnapshot, arrival_time: Timestamp) {
        let arrival_time = match self.entries.back() {
            Some(newest) if !arrival_time.is_finite() || arrival_time < newest.arrival_time => {
                warn!(
                    "Snapshot {} stamped {:.1}ms, before newest {:.1}ms; keeping arrival order",
                    data.tick, arrival_time, newest.arrival_time
                );
                newest.arrival_time
            }
            None if !arrival_time.is_finite() => 0.0,
            _ => arrival_time,
        };

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        trace!("Buffered snapshot {} at {:.1}ms", data.tick, arrival_time);
        self.entries.push_back(TimedSnapshot { arrival_time, data });
    }

    pub fn latest(&self) -> Option<&TimedSnapshot> {
        self.entries.back()
    }

    /// Finds the snapshots surrounding `render_time`.
    ///
    /// Scans from the oldest entry for the first adjacent pair with
    /// `from.arrival_time <= render_time <= to.arrival_time`. Past the newest
    /// entry both ends are the newest entry. Before the oldest entry the oldest
    /// pair is returned. Fails with `InsufficientData` below two entries.
    pub fn bracket(&self, render_time: Timestamp) -> Result<Bracket<'_>, InterpolationError> {
        if self.entries.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                buffered: self.entries.len(),
            });
        }

        let newest = &self.entries[self.entries.len() - 1];
        if render_time > newest.arrival_time {
            return Ok(Bracket {
                from: newest,
                to: newest,
                frozen: true,
            });
        }

        let (from, to) = self
            .entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .find(|(from, to)| from.arrival_time <= render_time && render_time <= to.arrival_time)
            .unwrap_or((&self.entries[0], &self.entries[1]));

        Ok(Bracket {
            from,
            to,
            frozen: false,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedSnapshot> {
        self.entries.iter()
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

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
