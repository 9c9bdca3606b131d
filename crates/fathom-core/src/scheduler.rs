use smallvec::SmallVec;

/// Logical one-shot timers an actor may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPurpose {
    /// Restore movement tuning when a dash runs out.
    DashEnd,
    /// Deferred execution of a locked-in charged dash.
    ChargeExecute,
}

const SLOT_COUNT: usize = 2;

fn slot(purpose: TimerPurpose) -> usize {
    match purpose {
        TimerPurpose::DashEnd => 0,
        TimerPurpose::ChargeExecute => 1,
    }
}

fn purpose_of(slot: usize) -> TimerPurpose {
    match slot {
        0 => TimerPurpose::DashEnd,
        _ => TimerPurpose::ChargeExecute,
    }
}

/// Single-slot one-shot scheduler. Each purpose holds at most one pending
/// fire time; scheduling again silently replaces the outstanding entry.
/// Poll-based: the owning tick loop drains due timers once per step.
#[derive(Debug, Default)]
pub struct Scheduler {
    fire_at: [Option<f32>; SLOT_COUNT],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `purpose` to fire at the absolute time `fire_at`, replacing any
    /// pending entry for the same purpose.
    pub fn schedule_once(&mut self, purpose: TimerPurpose, fire_at: f32) {
        self.fire_at[slot(purpose)] = Some(fire_at);
    }

    pub fn cancel(&mut self, purpose: TimerPurpose) {
        self.fire_at[slot(purpose)] = None;
    }

    pub fn pending(&self, purpose: TimerPurpose) -> Option<f32> {
        self.fire_at[slot(purpose)]
    }

    /// Drain every timer due at or before `now`, in slot order.
    pub fn poll(&mut self, now: f32) -> SmallVec<[TimerPurpose; SLOT_COUNT]> {
        let mut due = SmallVec::new();
        for i in 0..SLOT_COUNT {
            if let Some(at) = self.fire_at[i]
                && at <= now
            {
                self.fire_at[i] = None;
                due.push(purpose_of(i));
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut sched = Scheduler::new();
        sched.schedule_once(TimerPurpose::DashEnd, 1.5);
        assert!(sched.poll(1.0).is_empty());
        assert_eq!(sched.poll(1.5).as_slice(), &[TimerPurpose::DashEnd]);
        assert!(sched.poll(2.0).is_empty(), "one-shot must not re-fire");
    }

    #[test]
    fn rescheduling_replaces_pending_entry() {
        let mut sched = Scheduler::new();
        sched.schedule_once(TimerPurpose::DashEnd, 1.0);
        sched.schedule_once(TimerPurpose::DashEnd, 3.0);
        assert!(sched.poll(1.0).is_empty(), "first deadline was replaced");
        assert_eq!(sched.poll(3.0).as_slice(), &[TimerPurpose::DashEnd]);
    }

    #[test]
    fn cancel_clears_slot() {
        let mut sched = Scheduler::new();
        sched.schedule_once(TimerPurpose::ChargeExecute, 0.5);
        sched.cancel(TimerPurpose::ChargeExecute);
        assert!(sched.poll(10.0).is_empty());
    }

    #[test]
    fn purposes_are_independent() {
        let mut sched = Scheduler::new();
        sched.schedule_once(TimerPurpose::DashEnd, 1.0);
        sched.schedule_once(TimerPurpose::ChargeExecute, 1.0);
        let due = sched.poll(1.0);
        assert_eq!(due.len(), 2);
    }
}
