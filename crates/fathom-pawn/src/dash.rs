use glam::Vec3;
use smallvec::SmallVec;

use fathom_core::scheduler::{Scheduler, TimerPurpose};

use crate::body::{Body, MoveTuning};
use crate::config::DashConfig;
use crate::pawn::PawnEvent;

/// Dash state machine phases. Dashing and Charging are mutually exclusive
/// with re-triggering until the cooldown elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashPhase {
    Idle,
    Dashing,
    Charging,
}

/// Cooldown- and charge-gated burst-movement ability. Runs purely on the
/// controlling side; the authority never validates it (recorded trust
/// decision carried over from the original design).
#[derive(Debug)]
pub struct DashEngine {
    cfg: DashConfig,
    phase: DashPhase,
    juggernaut: bool,
    current_cooldown: f32,
    time_last_dash_finished: f32,
    charge_started_at: f32,
    saved_tuning: Option<MoveTuning>,
}

impl DashEngine {
    pub fn new(cfg: DashConfig, now: f32) -> Self {
        Self {
            current_cooldown: cfg.dash_cooldown,
            cfg,
            phase: DashPhase::Idle,
            juggernaut: false,
            time_last_dash_finished: now,
            charge_started_at: 0.0,
            saved_tuning: None,
        }
    }

    pub fn phase(&self) -> DashPhase {
        self.phase
    }

    pub fn is_dashing(&self) -> bool {
        self.phase == DashPhase::Dashing
    }

    pub fn is_charging(&self) -> bool {
        self.phase == DashPhase::Charging
    }

    pub fn current_cooldown(&self) -> f32 {
        self.current_cooldown
    }

    /// Juggernaut promotion switches to the charge-then-release variant and
    /// its longer base cooldown.
    pub fn set_juggernaut(&mut self) {
        self.juggernaut = true;
        self.current_cooldown = self.cfg.juggernaut_dash_cooldown;
    }

    pub fn can_dash(&self, now: f32) -> bool {
        self.phase == DashPhase::Idle
            && now - self.time_last_dash_finished > self.current_cooldown
    }

    /// Handle a dash trigger edge. `pressed` distinguishes press from
    /// release; `strafe_dir` is the last known world-space strafe direction
    /// used as the standard dash impulse direction.
    pub fn handle_input(
        &mut self,
        now: f32,
        pressed: bool,
        strafe_dir: Vec3,
        body: &mut dyn Body,
        scheduler: &mut Scheduler,
    ) -> SmallVec<[PawnEvent; 1]> {
        if self.juggernaut {
            return self.handle_charge_input(now, pressed, body, scheduler);
        }
        // Standard dash triggers on press only
        if !pressed {
            return SmallVec::new();
        }
        if !self.can_dash(now) {
            tracing::debug!("in dash cooldown; can't dash");
            return SmallVec::new();
        }
        self.start_standard(now, strafe_dir, body, scheduler)
    }

    fn start_standard(
        &mut self,
        now: f32,
        strafe_dir: Vec3,
        body: &mut dyn Body,
        scheduler: &mut Scheduler,
    ) -> SmallVec<[PawnEvent; 1]> {
        self.phase = DashPhase::Dashing;

        let impulse = body.orientation() * (strafe_dir * self.cfg.dash_speed);
        body.set_velocity(body.velocity() + impulse);

        self.saved_tuning = Some(body.tuning());
        body.set_tuning(MoveTuning {
            max_speed: self.cfg.dash_speed,
            acceleration: self.cfg.dash_speed * 10.0,
            deceleration: self.cfg.dash_slowdown,
        });

        scheduler.schedule_once(TimerPurpose::DashEnd, now + self.cfg.dash_duration);
        // Broadcasts locally only: dash logic executes on the controlling side
        smallvec::smallvec![PawnEvent::DashStarted]
    }

    fn handle_charge_input(
        &mut self,
        now: f32,
        pressed: bool,
        body: &mut dyn Body,
        scheduler: &mut Scheduler,
    ) -> SmallVec<[PawnEvent; 1]> {
        let mut events = SmallVec::new();
        if pressed {
            if self.can_dash(now) {
                tracing::debug!("charging up juggernaut dash");
                self.phase = DashPhase::Charging;
                self.charge_started_at = now;
            }
            return events;
        }

        // Release edge
        if self.can_dash(now) || self.phase != DashPhase::Charging {
            tracing::warn!("got a dash release but no charge is in progress");
            return events;
        }
        let valid_charge_threshold = self.cfg.juggernaut_dash_charge_duration * 0.25;
        let charge_wait_threshold = self.cfg.juggernaut_dash_charge_duration * 0.5;
        let time_spent_charging = now - self.charge_started_at;
        if time_spent_charging < valid_charge_threshold {
            tracing::debug!("juggernaut dash cancelled");
            self.phase = DashPhase::Idle;
            events.push(PawnEvent::ChargeCancelled);
        } else if time_spent_charging < charge_wait_threshold {
            let remaining_wait = charge_wait_threshold - time_spent_charging;
            tracing::debug!(remaining_wait, "juggernaut dash locked in");
            scheduler.schedule_once(TimerPurpose::ChargeExecute, now + remaining_wait);
            events.push(PawnEvent::ChargeLockedIn);
        } else {
            return self.execute_charged(now, body, scheduler);
        }
        events
    }

    /// Execute a locked-in or fully charged juggernaut dash: velocity is set
    /// (not added) along the forward axis, deceleration drops to zero for the
    /// dash, and the duration scales with the fraction of charge achieved.
    pub fn execute_charged(
        &mut self,
        now: f32,
        body: &mut dyn Body,
        scheduler: &mut Scheduler,
    ) -> SmallVec<[PawnEvent; 1]> {
        tracing::debug!("doing juggernaut dash");
        self.phase = DashPhase::Dashing;

        let charge_ratio =
            (now - self.charge_started_at) / self.cfg.juggernaut_dash_charge_duration;

        self.saved_tuning = Some(body.tuning());
        body.set_tuning(MoveTuning {
            max_speed: self.cfg.juggernaut_dash_speed,
            acceleration: self.cfg.juggernaut_dash_speed * 10.0,
            deceleration: 0.0,
        });
        body.set_velocity(body.forward() * self.cfg.juggernaut_dash_speed);

        scheduler.schedule_once(
            TimerPurpose::DashEnd,
            now + charge_ratio * self.cfg.juggernaut_dash_duration,
        );
        smallvec::smallvec![PawnEvent::DashStarted]
    }

    /// Restore the pre-dash tuning and start the cooldown window.
    pub fn end_dash(&mut self, now: f32, body: &mut dyn Body) {
        self.phase = DashPhase::Idle;
        if let Some(tuning) = self.saved_tuning.take() {
            body.set_tuning(tuning);
        }
        self.current_cooldown = if self.juggernaut {
            self.cfg.juggernaut_dash_cooldown
        } else {
            self.cfg.dash_cooldown
        };
        self.time_last_dash_finished = now;
    }

    /// Dispatch a due one-shot timer to its transition.
    pub fn on_timer(
        &mut self,
        purpose: TimerPurpose,
        now: f32,
        body: &mut dyn Body,
        scheduler: &mut Scheduler,
    ) -> SmallVec<[PawnEvent; 1]> {
        match purpose {
            TimerPurpose::DashEnd => {
                self.end_dash(now, body);
                SmallVec::new()
            },
            TimerPurpose::ChargeExecute => self.execute_charged(now, body, scheduler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FloatingBody;
    use glam::Quat;

    const CHARGE_DURATION: f32 = 2.0; // default juggernaut_dash_charge_duration

    fn engine(now: f32) -> (DashEngine, FloatingBody, Scheduler) {
        // Start past the initial cooldown so the first dash is available
        (
            DashEngine::new(DashConfig::default(), now - 10.0),
            FloatingBody::default(),
            Scheduler::new(),
        )
    }

    fn drive_timers(
        engine: &mut DashEngine,
        now: f32,
        body: &mut FloatingBody,
        scheduler: &mut Scheduler,
    ) -> Vec<PawnEvent> {
        let mut events = Vec::new();
        for purpose in scheduler.poll(now) {
            events.extend(engine.on_timer(purpose, now, body, scheduler));
        }
        events
    }

    #[test]
    fn standard_dash_adds_impulse_and_overrides_tuning() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        let events = dash.handle_input(100.0, true, Vec3::X, &mut body, &mut sched);
        assert_eq!(events.as_slice(), &[PawnEvent::DashStarted]);
        assert!(dash.is_dashing());
        assert_eq!(body.velocity(), Vec3::X * 3000.0);
        assert_eq!(body.tuning().max_speed, 3000.0);
        assert_eq!(body.tuning().deceleration, 4000.0);
        assert_eq!(sched.pending(TimerPurpose::DashEnd), Some(100.75));
    }

    #[test]
    fn dash_end_restores_tuning_and_starts_cooldown() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.handle_input(100.0, true, Vec3::X, &mut body, &mut sched);
        let events = drive_timers(&mut dash, 100.75, &mut body, &mut sched);
        assert!(events.is_empty());

        assert!(!dash.is_dashing());
        assert_eq!(body.tuning(), MoveTuning::default());
        // Cooldown: can_dash is false until dash_cooldown (2s) elapses
        assert!(!dash.can_dash(100.76));
        assert!(!dash.can_dash(102.75), "boundary is strict");
        assert!(dash.can_dash(102.76));
    }

    #[test]
    fn cannot_dash_while_dashing() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.handle_input(100.0, true, Vec3::X, &mut body, &mut sched);
        let before = body.velocity();
        let events = dash.handle_input(100.1, true, Vec3::X, &mut body, &mut sched);
        assert!(events.is_empty());
        assert_eq!(body.velocity(), before);
    }

    #[test]
    fn short_charge_cancels() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        dash.handle_input(100.0, true, Vec3::ZERO, &mut body, &mut sched);
        assert!(dash.is_charging());

        // Released below 25% of the charge duration: cancel, no effect
        let t = 100.0 + CHARGE_DURATION * 0.25 - 0.01;
        let events = dash.handle_input(t, false, Vec3::ZERO, &mut body, &mut sched);
        assert_eq!(events.as_slice(), &[PawnEvent::ChargeCancelled]);
        assert_eq!(dash.phase(), DashPhase::Idle);
        assert_eq!(body.velocity(), Vec3::ZERO);
        assert!(sched.pending(TimerPurpose::ChargeExecute).is_none());
    }

    #[test]
    fn quarter_charge_boundary_locks_in() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        dash.handle_input(100.0, true, Vec3::ZERO, &mut body, &mut sched);

        // Exactly 25%: below-25% cancels, 25% proceeds to lock-in
        let t = 100.0 + CHARGE_DURATION * 0.25;
        let events = dash.handle_input(t, false, Vec3::ZERO, &mut body, &mut sched);
        assert_eq!(events.as_slice(), &[PawnEvent::ChargeLockedIn]);
        // Deferred execution lands exactly at the 50% mark
        assert_eq!(
            sched.pending(TimerPurpose::ChargeExecute),
            Some(100.0 + CHARGE_DURATION * 0.5)
        );
    }

    #[test]
    fn locked_in_charge_executes_at_half_mark() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        body.set_orientation(Quat::IDENTITY);
        dash.handle_input(100.0, true, Vec3::ZERO, &mut body, &mut sched);
        dash.handle_input(100.0 + CHARGE_DURATION * 0.3, false, Vec3::ZERO, &mut body, &mut sched);

        let execute_at = 100.0 + CHARGE_DURATION * 0.5;
        let events = drive_timers(&mut dash, execute_at, &mut body, &mut sched);
        assert_eq!(events.as_slice(), &[PawnEvent::DashStarted]);
        assert!(dash.is_dashing());
        // Velocity set along forward, not added
        assert_eq!(body.velocity(), Vec3::NEG_Z * 6000.0);
        assert_eq!(body.tuning().deceleration, 0.0);
        // Duration scales with the half charge achieved
        assert_eq!(
            sched.pending(TimerPurpose::DashEnd),
            Some(execute_at + 0.5 * 1.5)
        );
    }

    #[test]
    fn full_charge_executes_immediately_on_release() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        dash.handle_input(100.0, true, Vec3::ZERO, &mut body, &mut sched);

        let t = 100.0 + CHARGE_DURATION; // 100% charge
        let events = dash.handle_input(t, false, Vec3::ZERO, &mut body, &mut sched);
        assert_eq!(events.as_slice(), &[PawnEvent::DashStarted]);
        assert!(dash.is_dashing());
        assert_eq!(sched.pending(TimerPurpose::DashEnd), Some(t + 1.5));
    }

    #[test]
    fn spurious_release_is_ignored() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        let events = dash.handle_input(100.0, false, Vec3::ZERO, &mut body, &mut sched);
        assert!(events.is_empty());
        assert_eq!(dash.phase(), DashPhase::Idle);
    }

    proptest::proptest! {
        // The cooldown gate is strict and depends only on the finish time.
        #[test]
        fn cooldown_boundary_is_strict(
            finished in 0.0f32..1000.0,
            elapsed in 0.0f32..10.0,
        ) {
            let mut dash = DashEngine::new(DashConfig::default(), finished);
            let mut body = FloatingBody::default();
            let mut sched = Scheduler::new();
            dash.end_dash(finished, &mut body);
            let now = finished + elapsed;
            // Stay off the exact boundary; accumulation noise lives there
            if elapsed < 1.99 {
                proptest::prop_assert!(!dash.can_dash(now));
            } else if elapsed > 2.01 {
                proptest::prop_assert!(dash.can_dash(now));
            }

            // A press during cooldown must leave the body untouched
            if !dash.can_dash(now) {
                dash.handle_input(now, true, Vec3::X, &mut body, &mut sched);
                proptest::prop_assert_eq!(body.velocity(), Vec3::ZERO);
            }
        }
    }

    #[test]
    fn juggernaut_cooldown_applies_after_charged_dash() {
        let (mut dash, mut body, mut sched) = engine(100.0);
        dash.set_juggernaut();
        dash.handle_input(100.0, true, Vec3::ZERO, &mut body, &mut sched);
        dash.handle_input(102.0, false, Vec3::ZERO, &mut body, &mut sched); // full charge, executes
        let end_at = sched.pending(TimerPurpose::DashEnd).unwrap();
        drive_timers(&mut dash, end_at, &mut body, &mut sched);

        // Juggernaut base cooldown is 4s
        assert!(!dash.can_dash(end_at + 4.0));
        assert!(dash.can_dash(end_at + 4.01));
    }
}
