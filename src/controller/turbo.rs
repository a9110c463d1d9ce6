use crate::config::TurboConfig;
use super::scheduler::{Scheduler, TimerHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurboPhase {
    Idle,
    Active,
    Cooldown,
}

/// Deadlines the turbo machine schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurboTimer {
    ActiveEnds,
    CooldownEnds,
}

/// Idle → Active → Cooldown → Idle. Each transition cancels the pending
/// deadline before arming the next, so a stale timer can never cut a phase
/// short.
pub struct Turbo {
    config: TurboConfig,
    phase: TurboPhase,
    pending: Option<TimerHandle>,
}

impl Turbo {
    pub fn new(config: TurboConfig) -> Self {
        Self {
            config,
            phase: TurboPhase::Idle,
            pending: None,
        }
    }

    pub fn phase(&self) -> TurboPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == TurboPhase::Active
    }

    /// Acceleration factor for the current phase.
    pub fn multiplier(&self) -> f32 {
        if self.is_active() { self.config.factor } else { 1.0 }
    }

    /// Enter Active if Idle. Returns whether turbo fired.
    pub fn try_activate<E: From<TurboTimer>>(&mut self, now: f64, scheduler: &mut Scheduler<E>) -> bool {
        if self.phase != TurboPhase::Idle {
            return false;
        }
        self.enter(TurboPhase::Active, now + self.config.active_duration, TurboTimer::ActiveEnds, scheduler);
        true
    }

    /// Handle a fired deadline at time `at`. Returns the new phase, or None
    /// when the timer does not belong to the current phase.
    pub fn on_timer<E: From<TurboTimer>>(
        &mut self,
        timer: TurboTimer,
        at: f64,
        scheduler: &mut Scheduler<E>,
    ) -> Option<TurboPhase> {
        match (self.phase, timer) {
            (TurboPhase::Active, TurboTimer::ActiveEnds) => {
                self.enter(TurboPhase::Cooldown, at + self.config.cooldown_duration, TurboTimer::CooldownEnds, scheduler);
                Some(TurboPhase::Cooldown)
            }
            (TurboPhase::Cooldown, TurboTimer::CooldownEnds) => {
                self.pending = None;
                self.phase = TurboPhase::Idle;
                Some(TurboPhase::Idle)
            }
            _ => None,
        }
    }

    /// Back to Idle, dropping any pending deadline.
    pub fn reset<E>(&mut self, scheduler: &mut Scheduler<E>) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.phase = TurboPhase::Idle;
    }

    fn enter<E: From<TurboTimer>>(
        &mut self,
        phase: TurboPhase,
        deadline: f64,
        timer: TurboTimer,
        scheduler: &mut Scheduler<E>,
    ) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.phase = phase;
        self.pending = Some(scheduler.schedule(deadline, E::from(timer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until(turbo: &mut Turbo, scheduler: &mut Scheduler<TurboTimer>, now: f64) {
        while let Some((at, timer)) = scheduler.pop_due(now) {
            turbo.on_timer(timer, at, scheduler);
        }
    }

    #[test]
    fn full_cycle_timeline() {
        let mut turbo = Turbo::new(TurboConfig::default());
        let mut sched = Scheduler::new();
        assert!(turbo.try_activate(0.0, &mut sched));

        run_until(&mut turbo, &mut sched, 2.999);
        assert_eq!(turbo.phase(), TurboPhase::Active);
        assert_eq!(turbo.multiplier(), 6.0);

        run_until(&mut turbo, &mut sched, 3.0);
        assert_eq!(turbo.phase(), TurboPhase::Cooldown);
        assert_eq!(turbo.multiplier(), 1.0);

        run_until(&mut turbo, &mut sched, 5.0);
        assert!(!turbo.try_activate(5.0, &mut sched));
        assert_eq!(turbo.phase(), TurboPhase::Cooldown);

        run_until(&mut turbo, &mut sched, 7.999);
        assert_eq!(turbo.phase(), TurboPhase::Cooldown);

        run_until(&mut turbo, &mut sched, 8.0);
        assert_eq!(turbo.phase(), TurboPhase::Idle);
        assert!(sched.is_empty());
        assert!(turbo.try_activate(8.5, &mut sched));
    }

    #[test]
    fn cannot_retrigger_while_active() {
        let mut turbo = Turbo::new(TurboConfig::default());
        let mut sched = Scheduler::new();
        assert!(turbo.try_activate(0.0, &mut sched));
        assert!(!turbo.try_activate(1.0, &mut sched));
        assert_eq!(sched.len(), 1);
        run_until(&mut turbo, &mut sched, 3.0);
        assert_eq!(turbo.phase(), TurboPhase::Cooldown);
    }

    #[test]
    fn late_frames_keep_exact_deadlines() {
        let mut turbo = Turbo::new(TurboConfig::default());
        let mut sched = Scheduler::new();
        turbo.try_activate(1.0, &mut sched);
        // A single late read long after both deadlines walks through both.
        run_until(&mut turbo, &mut sched, 20.0);
        assert_eq!(turbo.phase(), TurboPhase::Idle);
    }

    #[test]
    fn stray_timers_are_ignored() {
        let mut turbo = Turbo::new(TurboConfig::default());
        let mut sched: Scheduler<TurboTimer> = Scheduler::new();
        assert_eq!(turbo.on_timer(TurboTimer::CooldownEnds, 1.0, &mut sched), None);
        turbo.try_activate(0.0, &mut sched);
        assert_eq!(turbo.on_timer(TurboTimer::CooldownEnds, 1.0, &mut sched), None);
        assert_eq!(turbo.phase(), TurboPhase::Active);
    }

    #[test]
    fn reset_cancels_pending_deadline() {
        let mut turbo = Turbo::new(TurboConfig::default());
        let mut sched: Scheduler<TurboTimer> = Scheduler::new();
        turbo.try_activate(0.0, &mut sched);
        turbo.reset(&mut sched);
        assert!(sched.is_empty());
        assert_eq!(turbo.phase(), TurboPhase::Idle);
    }
}
