// src/timer.rs

//! The animation timer: one repeating driver timeout, present only while the
//! engine has asked for ticks.

use log::{debug, warn};
use std::time::Duration;

use crate::platform::backends::{Driver, TimerId};

/// What the event loop should do with a timeout after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// The engine still wants ticks.
    Continue,
    /// The engine stopped the animation; the timeout is no longer wanted.
    Stop,
}

/// The handle is `Some` exactly while the timer is active.
#[derive(Debug, Clone)]
pub struct TimerDriver {
    handle: Option<TimerId>,
    period: Duration,
}

impl TimerDriver {
    pub fn new(period: Duration) -> Self {
        Self {
            handle: None,
            period,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<TimerId> {
        self.handle
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Elapsed time reported to the engine on each tick.
    pub fn interval_secs(&self) -> f32 {
        self.period.as_secs_f32()
    }

    /// Registers the timeout unless one is already running.
    pub fn activate<D: Driver + ?Sized>(&mut self, driver: &mut D) -> anyhow::Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let id = driver.add_timeout(self.period)?;
        debug!("Animation timer {:?} started ({:?})", id, self.period);
        self.handle = Some(id);
        Ok(())
    }

    /// Cancels the timeout if one is running.
    pub fn deactivate<D: Driver + ?Sized>(&mut self, driver: &mut D) {
        if let Some(id) = self.handle.take() {
            driver.remove_timeout(id);
            debug!("Animation timer {:?} stopped", id);
        }
    }

    /// True if `id` is the live timeout. Ticks from anything else are stale.
    pub fn accepts(&self, id: TimerId) -> bool {
        let live = self.handle == Some(id);
        if !live {
            warn!("Ignoring tick from stale timer {:?}", id);
        }
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::backends::headless::HeadlessDriver;

    #[test_log::test]
    fn activate_twice_registers_once() {
        let mut driver = HeadlessDriver::new();
        let mut timer = TimerDriver::new(Duration::from_millis(20));
        timer.activate(&mut driver).unwrap();
        let first = timer.handle();
        timer.activate(&mut driver).unwrap();
        assert_eq!(timer.handle(), first);
        assert_eq!(driver.timer_registrations(), 1);
        assert_eq!(driver.active_timers(), 1);
    }

    #[test_log::test]
    fn deactivate_when_inactive_is_a_no_op() {
        let mut driver = HeadlessDriver::new();
        let mut timer = TimerDriver::new(Duration::from_millis(20));
        timer.deactivate(&mut driver);
        assert!(!timer.is_active());
        assert_eq!(driver.active_timers(), 0);

        timer.activate(&mut driver).unwrap();
        timer.deactivate(&mut driver);
        timer.deactivate(&mut driver);
        assert!(!timer.is_active());
        assert_eq!(driver.active_timers(), 0);
    }

    #[test_log::test]
    fn stale_ids_are_rejected() {
        let mut driver = HeadlessDriver::new();
        let mut timer = TimerDriver::new(Duration::from_millis(20));
        timer.activate(&mut driver).unwrap();
        let old = timer.handle().unwrap();
        timer.deactivate(&mut driver);
        timer.activate(&mut driver).unwrap();
        assert!(!timer.accepts(old));
        assert!(timer.accepts(timer.handle().unwrap()));
    }

    #[test]
    fn default_period_reports_twenty_milliseconds() {
        let timer = TimerDriver::new(Duration::from_millis(20));
        assert!((timer.interval_secs() - 0.02).abs() < 1e-6);
    }
}
