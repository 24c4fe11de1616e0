//! Network tick clock
//!
//! Fires at the configured network rate regardless of how fast physics runs
//! or how often commands arrive. Each firing advances the server tick that
//! snapshots are tagged with.

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

pub struct ServerClock {
    interval: Interval,
    period: Duration,
    tick: u32,
}

impl ServerClock {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            interval,
            period,
            tick: 0,
        }
    }

    /// Waits for the next network tick and returns its number.
    pub async fn tick(&mut self) -> u32 {
        self.interval.tick().await;
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn tick_rate(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_clock_starts_at_zero() {
        let clock = ServerClock::new(Duration::from_millis(50));
        assert_eq!(clock.current_tick(), 0);
        assert_eq!(clock.period(), Duration::from_millis(50));
        assert_approx_eq!(clock.tick_rate(), 20.0, 0.0001);
    }

    #[tokio::test]
    async fn test_ticks_increment() {
        let mut clock = ServerClock::new(Duration::from_millis(5));

        assert_eq!(clock.tick().await, 1);
        assert_eq!(clock.tick().await, 2);
        assert_eq!(clock.tick().await, 3);
        assert_eq!(clock.current_tick(), 3);
    }

    #[tokio::test]
    async fn test_ticks_are_spaced_by_period() {
        let mut clock = ServerClock::new(Duration::from_millis(20));

        // First tick completes immediately
        clock.tick().await;
        let start = Instant::now();
        clock.tick().await;
        clock.tick().await;

        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
