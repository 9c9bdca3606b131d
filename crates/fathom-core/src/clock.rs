use std::cell::Cell;

/// A single server-synchronized time source shared by every role, so that
/// timestamp comparisons across roles are meaningful.
pub trait Clock {
    /// Current server time in seconds.
    fn now(&self) -> f32;
}

/// Manually advanced clock for tests and the deterministic session harness.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: Cell<f32>,
}

impl ManualClock {
    pub fn new(start: f32) -> Self {
        Self {
            time: Cell::new(start),
        }
    }

    pub fn set(&self, time: f32) {
        self.time.set(time);
    }

    pub fn advance(&self, dt: f32) {
        self.time.set(self.time.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f32 {
        self.time.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(5.0);
        assert_eq!(clock.now(), 5.0);
        clock.advance(0.25);
        assert_eq!(clock.now(), 5.25);
        clock.set(100.0);
        assert_eq!(clock.now(), 100.0);
    }
}
