use std::collections::VecDeque;

use crate::state::Reading;

/// Default number of readings kept in the window.
pub const DEFAULT_CAPACITY: usize = 20;

/// Fixed-capacity store of the most recent readings, newest first.
#[derive(Debug, Clone)]
pub struct BoundedWindow {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl Default for BoundedWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl BoundedWindow {
    /// # Panics
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            readings: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert `reading` at the front, evicting the oldest one if at capacity,
    /// and return a copy of the resulting window.
    pub fn push(&mut self, reading: Reading) -> Vec<Reading> {
        self.readings.push_front(reading);
        self.readings.truncate(self.capacity);
        debug_assert!(self.readings.len() <= self.capacity);
        self.snapshot()
    }

    /// Copy of the current contents, newest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn newest(&self) -> Option<&Reading> {
        self.readings.front()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
