use std::time::Duration;

use tint_tap_core::{Event, Level, Scheduler, TaskHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CountdownTask {
    Tick,
    Expire,
}

/// Per-level bonus clock reporting the remaining time at a fixed rate.
///
/// Expiry is informational only; it never ends the level.
#[derive(Debug)]
pub(crate) struct Countdown {
    scheduler: Scheduler<CountdownTask>,
    budget: Duration,
    period: Duration,
    started_at: Duration,
    tick: Option<TaskHandle>,
    expiry: Option<TaskHandle>,
    expired: bool,
}

impl Countdown {
    pub(crate) fn new(budget: Duration, tick_hz: u32) -> Self {
        Self {
            scheduler: Scheduler::new(),
            budget,
            period: Duration::from_secs(1) / tick_hz.max(1),
            started_at: Duration::ZERO,
            tick: None,
            expiry: None,
            expired: false,
        }
    }

    pub(crate) fn budget(&self) -> Duration {
        self.budget
    }

    /// Starts a fresh countdown, cancelling whatever was running.
    pub(crate) fn start(&mut self, now: Duration) {
        self.cancel();
        self.started_at = now;
        self.expired = false;
        self.tick = Some(
            self.scheduler
                .schedule_repeating(now, self.period, CountdownTask::Tick),
        );
        self.expiry = Some(
            self.scheduler
                .schedule_once(now, self.budget, CountdownTask::Expire),
        );
    }

    pub(crate) fn cancel(&mut self) {
        for handle in [self.tick.take(), self.expiry.take()].into_iter().flatten() {
            let _ = self.scheduler.cancel(handle);
        }
    }

    pub(crate) fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    pub(crate) fn remaining(&self, now: Duration) -> Duration {
        self.budget.saturating_sub(self.elapsed(now))
    }

    pub(crate) fn is_running(&self) -> bool {
        self.tick.is_some() || self.expiry.is_some()
    }

    pub(crate) fn advance(&mut self, now: Duration, level: Level, out: &mut Vec<Event>) {
        while let Some((_, task)) = self.scheduler.pop_due(now) {
            match task {
                CountdownTask::Tick => out.push(Event::CountdownTicked {
                    remaining: self.remaining(now),
                }),
                CountdownTask::Expire => {
                    self.expiry = None;
                    if let Some(tick) = self.tick.take() {
                        let _ = self.scheduler.cancel(tick);
                    }
                    if !self.expired {
                        self.expired = true;
                        tracing::debug!(level = level.get(), "bonus clock expired");
                        out.push(Event::CountdownTicked {
                            remaining: Duration::ZERO,
                        });
                        out.push(Event::CountdownExpired { level });
                    }
                }
            }
        }
    }
}
