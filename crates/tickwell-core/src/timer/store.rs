//! Ordered timer collection.
//!
//! Only the engine holds a mutable store; everyone else reads snapshots.

use std::collections::HashSet;

use super::model::{Timer, TimerId};

#[derive(Debug, Clone, Default)]
pub struct TimerStore {
    timers: Vec<Timer>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Timer] {
        &self.timers
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn get(&self, id: &TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| &t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &TimerId) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| &t.id == id)
    }

    pub(crate) fn push(&mut self, timer: Timer) {
        self.timers.push(timer);
    }

    pub(crate) fn remove(&mut self, id: &TimerId) -> Option<Timer> {
        let idx = self.timers.iter().position(|t| &t.id == id)?;
        Some(self.timers.remove(idx))
    }

    /// Replace the contents, keeping the first timer for any repeated id.
    /// Returns how many duplicates were dropped.
    pub(crate) fn replace(&mut self, timers: Vec<Timer>) -> usize {
        let mut seen = HashSet::new();
        let before = timers.len();
        self.timers = timers
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        before - self.timers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
    }
}
