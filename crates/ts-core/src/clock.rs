//! Monotonic timebase for the control loop.
//!
//! Every control tick reads the time and then sleeps for a fixed period.
//! Both go through [`Clock`] so the same loop can run against the wall
//! clock on the bench or a virtual clock in tests and simulations.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time plus a blocking wait.
pub trait Clock {
    /// Seconds since an arbitrary, fixed origin. Never decreases.
    fn now_s(&self) -> f64;

    /// Block the caller for `period`.
    fn sleep(&self, period: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }

    fn sleep(&self, period: Duration) {
        (**self).sleep(period)
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }

    fn sleep(&self, period: Duration) {
        (**self).sleep(period)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }

    fn sleep(&self, period: Duration) {
        (**self).sleep(period)
    }
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&self, period: Duration) {
        std::thread::sleep(period);
    }
}

/// Virtual clock: time only moves on `sleep` or `advance`.
///
/// Single-threaded by construction; share it with `Rc<ManualClock>`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_s: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_s: f64) -> Self {
        Self {
            now_s: Cell::new(start_s),
        }
    }

    /// Move time forward by `dt_s` seconds. Negative steps are ignored.
    pub fn advance(&self, dt_s: f64) {
        if dt_s > 0.0 {
            self.now_s.set(self.now_s.get() + dt_s);
        }
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        self.now_s.get()
    }

    fn sleep(&self, period: Duration) {
        self.advance(period.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_on_sleep() {
        let clock = ManualClock::new(10.0);
        assert_eq!(clock.now_s(), 10.0);
        clock.sleep(Duration::from_millis(500));
        assert!((clock.now_s() - 10.5).abs() < 1e-12);
        clock.advance(-3.0);
        assert!((clock.now_s() - 10.5).abs() < 1e-12);
    }

    #[test]
    fn shared_handles_see_the_same_time() {
        let clock = Rc::new(ManualClock::new(0.0));
        let other: Rc<dyn Clock> = clock.clone();
        clock.advance(2.0);
        assert_eq!(other.now_s(), 2.0);
        other.sleep(Duration::from_secs(1));
        assert_eq!(clock.now_s(), 3.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_s();
        let b = clock.now_s();
        assert!(b >= a);
    }
}
