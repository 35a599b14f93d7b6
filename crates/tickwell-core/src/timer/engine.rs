//! Timer engine implementation.
//!
//! The engine owns the timer store and the map from timer id to its tick
//! driver. It is the only mutator of either. Drivers call back through
//! [`TimerEngine::tick`]; everything runs on one logical thread.
//!
//! ## State Transitions
//!
//! ```text
//! created -> Running <-> Paused
//!            Running -> Completed (remaining == 0, terminal)
//! any state -> deleted
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::manual(SystemClock);
//! let tea = engine.create(NewTimer::countdown("Tea", 300))?;
//! // Once per second:
//! engine.tick_all();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::driver::{Driver, DriverHandle, DriverTicket, ManualDriver};
use super::model::{NewTimer, Timer, TimerId};
use super::store::TimerStore;
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{Completion, CompletionNotifier};

/// Core timer engine.
pub struct TimerEngine {
    store: TimerStore,
    drivers: HashMap<TimerId, DriverHandle>,
    next_generation: u64,
    driver: Box<dyn Driver>,
    clock: Arc<dyn Clock>,
    notifiers: Vec<Box<dyn CompletionNotifier>>,
}

impl TimerEngine {
    pub fn new(driver: impl Driver + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            store: TimerStore::new(),
            drivers: HashMap::new(),
            next_generation: 0,
            driver: Box::new(driver),
            clock: Arc::new(clock),
            notifiers: Vec::new(),
        }
    }

    /// Engine whose ticks are fired by the caller.
    pub fn manual(clock: impl Clock + 'static) -> Self {
        Self::new(ManualDriver, clock)
    }

    /// Register a completion subscriber.
    pub fn subscribe(&mut self, notifier: impl CompletionNotifier + 'static) {
        self.notifiers.push(Box::new(notifier));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timers(&self) -> &[Timer] {
        self.store.all()
    }

    pub fn get(&self, id: &TimerId) -> Option<&Timer> {
        self.store.get(id)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Tickets of every live driver, in store order.
    pub fn active_drivers(&self) -> Vec<DriverTicket> {
        self.store
            .all()
            .iter()
            .filter_map(|t| self.drivers.get(&t.id).map(|h| h.ticket().clone()))
            .collect()
    }

    pub fn has_driver(&self, id: &TimerId) -> bool {
        self.drivers.contains_key(id)
    }

    /// Mean progress over all timers, 0.0 when there are none.
    pub fn average_progress(&self) -> f64 {
        let timers = self.store.all();
        if timers.is_empty() {
            return 0.0;
        }
        timers.iter().map(Timer::progress).sum::<f64>() / timers.len() as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate, insert and immediately start a new timer.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] and leaves the store untouched if the
    /// title is empty or too long, or the duration is not positive.
    pub fn create(&mut self, request: NewTimer) -> Result<Timer, ValidationError> {
        let mut timer = Timer::new(request, self.clock.now_ms())?;
        let id = timer.id.clone();
        info!(timer_id = %id, title = %timer.title, mode = ?timer.mode, duration = timer.duration, "timer created");
        self.store.push(timer.clone());
        self.start(&id);
        timer.is_running = self.has_driver(&id);
        Ok(timer)
    }

    pub fn start(&mut self, id: &TimerId) -> Option<Event> {
        let now = self.clock.now_ms();
        let timer = self.store.get_mut(id)?;
        if timer.remaining_time == 0 {
            return None;
        }
        if let Some(remaining) = timer.remaining_at(now) {
            // A passed target is left for the first tick to complete.
            if remaining > 0 {
                timer.remaining_time = remaining.min(timer.duration);
            }
        }

        if let Some(old) = self.drivers.remove(id) {
            old.cancel();
        }
        self.next_generation += 1;
        let ticket = DriverTicket {
            timer_id: id.clone(),
            generation: self.next_generation,
        };
        let handle = self.driver.spawn(ticket);
        self.drivers.insert(id.clone(), handle);
        timer.is_running = true;

        debug!(timer_id = %id, remaining = timer.remaining_time, generation = self.next_generation, "timer started");
        Some(Event::TimerStarted {
            timer_id: id.clone(),
            remaining_secs: timer.remaining_time,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self, id: &TimerId) -> Option<Event> {
        self.cancel_driver(id);
        let timer = self.store.get_mut(id)?;
        if !timer.is_running {
            return None;
        }
        timer.is_running = false;
        debug!(timer_id = %id, remaining = timer.remaining_time, "timer paused");
        Some(Event::TimerPaused {
            timer_id: id.clone(),
            remaining_secs: timer.remaining_time,
            at: Utc::now(),
        })
    }

    pub fn delete(&mut self, id: &TimerId) -> Option<Event> {
        self.cancel_driver(id);
        self.store.remove(id)?;
        debug!(timer_id = %id, "timer deleted");
        Some(Event::TimerDeleted {
            timer_id: id.clone(),
            at: Utc::now(),
        })
    }

    /// Driver entry point, invoked once per tick interval.
    ///
    /// Tickets from a cancelled or replaced driver are ignored. Returns
    /// `Some(Event::TimerCompleted)` on the tick that finishes the timer.
    pub fn tick(&mut self, ticket: &DriverTicket) -> Option<Event> {
        let id = &ticket.timer_id;
        let live = self.drivers.get(id).map(|h| h.ticket().generation);
        if live != Some(ticket.generation) {
            return None;
        }

        let now = self.clock.now_ms();
        let next = match self.store.get(id) {
            Some(timer) if timer.is_running => timer
                .remaining_at(now)
                .unwrap_or_else(|| timer.remaining_time.saturating_sub(1)),
            _ => {
                // Paused or deleted between scheduling and firing.
                self.cancel_driver(id);
                return None;
            }
        };

        if next == 0 {
            return self.complete(id);
        }
        if let Some(timer) = self.store.get_mut(id) {
            timer.remaining_time = next.min(timer.duration);
        }
        None
    }

    /// Fire one tick for every live driver. For use with [`ManualDriver`].
    pub fn tick_all(&mut self) -> Vec<Event> {
        self.active_drivers()
            .iter()
            .filter_map(|ticket| self.tick(ticket))
            .collect()
    }

    /// Install a new collection with every timer stopped.
    ///
    /// No driver survives a replace; nothing is resumed implicitly.
    pub fn replace_all(&mut self, timers: Vec<Timer>) -> Event {
        self.cancel_all();
        let timers: Vec<Timer> = timers
            .into_iter()
            .map(|mut t| {
                t.normalize();
                t
            })
            .collect();
        let dropped = self.store.replace(timers);
        if dropped > 0 {
            warn!(dropped, "dropped timers with repeated ids");
        }
        debug!(count = self.store.len(), "timers replaced");
        Event::TimersReplaced {
            count: self.store.len(),
            at: Utc::now(),
        }
    }

    pub fn clear(&mut self) -> Event {
        self.cancel_all();
        self.store.clear();
        Event::TimersReplaced {
            count: 0,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Running -> Completed. Idempotent: a timer that is not running is left
    /// alone and nobody is notified.
    fn complete(&mut self, id: &TimerId) -> Option<Event> {
        self.cancel_driver(id);
        let timer = self.store.get_mut(id)?;
        if !timer.is_running {
            return None;
        }
        let completion = Completion::from(&*timer);
        timer.remaining_time = 0;
        timer.is_running = false;

        info!(timer_id = %id, title = %completion.title, "timer completed");
        for notifier in &self.notifiers {
            notifier.notify(&completion);
        }
        Some(Event::TimerCompleted {
            timer_id: completion.timer_id,
            title: completion.title,
            duration_secs: completion.duration,
            at: Utc::now(),
        })
    }

    fn cancel_driver(&mut self, id: &TimerId) {
        if let Some(handle) = self.drivers.remove(id) {
            handle.cancel();
        }
    }

    fn cancel_all(&mut self) {
        for (_, handle) in self.drivers.drain() {
            handle.cancel();
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
