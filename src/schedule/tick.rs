//! Tick-based check scheduler with drift correction.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::ScheduleConfig;

/// Delay before the very first round, so it is never scheduled in the past.
const FIRST_TICK_DELAY: Duration = Duration::from_secs(1);

/// Computes when the next round of checks is due.
///
/// The fire time only moves forward. When a round overruns its slot, the
/// schedule restarts from "now" rather than firing a backlog of missed ticks.
#[derive(Debug)]
pub struct TickScheduler {
    interval: Duration,
    check_timeout: Duration,
    retry_budget: u32,
    last_fire: Option<Instant>,
}

impl TickScheduler {
    pub fn new(interval: Duration, check_timeout: Duration, retry_budget: u32) -> Self {
        Self {
            interval,
            check_timeout,
            retry_budget,
            last_fire: None,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.interval(), config.timeout(), config.retry)
    }

    /// Advance the schedule and return the instant of the next round.
    pub fn next_check_time(&mut self) -> Instant {
        let now = Instant::now();
        let next = match self.last_fire {
            None => now + FIRST_TICK_DELAY,
            Some(last) => {
                let advanced = last + self.interval;
                if advanced < now {
                    tracing::warn!(
                        behind_secs = (now - advanced).as_secs_f64(),
                        "Previous round overran its slot, skipping missed rounds"
                    );
                    now
                } else {
                    advanced
                }
            }
        };
        self.last_fire = Some(next);
        next
    }

    /// Wall-clock budget of a single check attempt.
    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    /// Maximum consecutive failed attempts before giving up on a server.
    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
    }
}
