//! Per-timer tick drivers.
//!
//! A driver emits one [`DriverTicket`] per tick interval for a single timer.
//! The engine keeps exactly one live driver per running timer and tags each
//! with a generation, so a ticket that was already queued when its driver
//! was cancelled can be told apart from the driver that replaced it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use super::model::TimerId;

/// Interval between ticks. Each tick takes one second off a countdown, so
/// this is fixed.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one driver instance for one timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverTicket {
    pub timer_id: TimerId,
    pub generation: u64,
}

/// Owned handle for a live driver.
#[derive(Debug)]
pub struct DriverHandle {
    ticket: DriverTicket,
    task: Option<AbortHandle>,
}

impl DriverHandle {
    /// A handle with no background task behind it.
    pub fn detached(ticket: DriverTicket) -> Self {
        Self { ticket, task: None }
    }

    pub fn from_task(ticket: DriverTicket, task: AbortHandle) -> Self {
        Self {
            ticket,
            task: Some(task),
        }
    }

    pub fn ticket(&self) -> &DriverTicket {
        &self.ticket
    }

    /// Stop the driver. Takes effect before returning; a ticket already in
    /// flight is rejected by the engine's generation check.
    pub fn cancel(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

/// Spawns tick drivers.
pub trait Driver: Send {
    fn spawn(&mut self, ticket: DriverTicket) -> DriverHandle;
}

/// Spawns nothing. The caller fires ticks by hand through
/// [`TimerEngine::tick`](super::TimerEngine::tick).
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualDriver;

impl Driver for ManualDriver {
    fn spawn(&mut self, ticket: DriverTicket) -> DriverHandle {
        DriverHandle::detached(ticket)
    }
}

/// One tokio task per driver, each sending its ticket into a shared channel.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioDriver {
    tx: mpsc::UnboundedSender<DriverTicket>,
}

impl TokioDriver {
    pub fn new(tx: mpsc::UnboundedSender<DriverTicket>) -> Self {
        Self { tx }
    }
}

impl Driver for TokioDriver {
    fn spawn(&mut self, ticket: DriverTicket) -> DriverHandle {
        let tx = self.tx.clone();
        let period = TICK_INTERVAL;
        let sent = ticket.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            // Missed ticks are not replayed; scheduled timers recompute from the wall clock.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(sent.clone()).is_err() {
                    break;
                }
            }
        });
        DriverHandle::from_task(ticket, task.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: &str, generation: u64) -> DriverTicket {
        DriverTicket {
            timer_id: TimerId::from(id),
            generation,
        }
    }

    #[test]
    fn manual_driver_hands_back_ticket() {
        let mut driver = ManualDriver;
        let handle = driver.spawn(ticket("a", 7));
        assert_eq!(handle.ticket(), &ticket("a", 7));
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_driver_sends_once_per_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut driver = TokioDriver::new(tx);
        let handle = driver.spawn(ticket("a", 1));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let mut received = 0;
        while let Ok(t) = rx.try_recv() {
            assert_eq!(t, ticket("a", 1));
            received += 1;
        }
        assert_eq!(received, 3);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
