//! Cooperative periodic scheduling.
//!
//! Nothing here owns a thread or a timer. The host drives [`Scheduler::poll`]
//! with explicit clock values and acts on what came due, so the tick and
//! autosave handlers can never overlap and tests control time completely.
//!
//! RULE: starting an already-started interval is a programmer error and
//! fails immediately. Stopping a stopped interval is a no-op.

use crate::error::{GameError, GameResult};
use crate::types::TimeMs;

pub struct Interval {
    name: &'static str,
    period_ms: u64,
    next_fire: Option<TimeMs>,
}

impl Interval {
    pub fn new(name: &'static str, period_ms: u64) -> Self {
        Self {
            name,
            period_ms,
            next_fire: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn start(&mut self, now: TimeMs) -> GameResult<()> {
        if self.is_started() {
            return Err(GameError::IntervalAlreadyStarted(self.name));
        }
        self.next_fire = Some(now + self.period_ms);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.next_fire = None;
    }

    pub fn restart(&mut self, now: TimeMs) {
        self.stop();
        // Cannot fail: the interval was just stopped.
        let _ = self.start(now);
    }

    /// Repoints the next fire when the period changes mid-run (the update
    /// rate is player-configurable).
    pub fn set_period(&mut self, now: TimeMs, period_ms: u64) {
        self.period_ms = period_ms;
        if self.is_started() {
            self.restart(now);
        }
    }

    /// True when the interval is running and due at `now`; schedules the
    /// next fire from `now` rather than accumulating a backlog.
    pub fn poll(&mut self, now: TimeMs) -> bool {
        match self.next_fire {
            Some(due) if now >= due => {
                self.next_fire = Some(now + self.period_ms);
                true
            }
            _ => false,
        }
    }
}

/// Which scheduled tasks came due in one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fired {
    pub tick: bool,
    pub autosave: bool,
}

/// The game's two periodic tasks: the update tick and autosave.
pub struct Scheduler {
    tick: Interval,
    autosave: Interval,
}

pub const AUTOSAVE_PERIOD_MS: u64 = 30_000;

impl Scheduler {
    pub fn new(update_rate_ms: u64) -> Self {
        Self {
            tick: Interval::new("game-tick", update_rate_ms),
            autosave: Interval::new("autosave", AUTOSAVE_PERIOD_MS),
        }
    }

    pub fn tick_interval(&mut self) -> &mut Interval {
        &mut self.tick
    }

    pub fn autosave_interval(&mut self) -> &mut Interval {
        &mut self.autosave
    }

    pub fn start_all(&mut self, now: TimeMs) -> GameResult<()> {
        self.tick.start(now)?;
        self.autosave.start(now)?;
        Ok(())
    }

    pub fn stop_all(&mut self) {
        self.tick.stop();
        self.autosave.stop();
    }

    pub fn restart_all(&mut self, now: TimeMs) {
        self.tick.restart(now);
        self.autosave.restart(now);
    }

    pub fn poll(&mut self, now: TimeMs) -> Fired {
        Fired {
            tick: self.tick.poll(now),
            autosave: self.autosave.poll(now),
        }
    }
}
