// Deferred one-shot timers in virtual time, plus the frame clock that turns
// wall-clock reads into integration steps.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Pending<E> {
    id: u64,
    due: f64,
    event: E,
}

/// Cancelable deadlines. Nothing fires on its own: the owner pops due events
/// with the current time, so tests can advance time deterministically.
pub struct Scheduler<E> {
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self { next_id: 0, pending: Vec::new() }
    }

    pub fn schedule(&mut self, due: f64, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Pending { id, due, event });
        TimerHandle(id)
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|p| p.id == handle.0) {
            Some(idx) => {
                self.pending.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.id == handle.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest event with `due <= now`, together with
    /// its deadline. Equal deadlines fire in scheduling order.
    pub fn pop_due(&mut self, now: f64) -> Option<(f64, E)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(idx, _)| idx)?;
        let p = self.pending.swap_remove(idx);
        Some((p.due, p.event))
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns successive clock reads (seconds) into frame deltas.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: f64,
    max_delta: Option<f32>,
}

impl FrameClock {
    pub fn new(now: f64, max_delta: Option<f32>) -> Self {
        Self { last: now, max_delta }
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    /// Delta since the previous read. Never negative; capped when a maximum
    /// is configured.
    pub fn delta(&mut self, now: f64) -> f32 {
        let raw = (now - self.last).max(0.0) as f32;
        self.last = now.max(self.last);
        match self.max_delta {
            Some(max) => raw.min(max),
            None => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_deadline_then_fifo_order() {
        let mut s = Scheduler::new();
        s.schedule(2.0, "late");
        s.schedule(1.0, "first");
        s.schedule(1.0, "second");
        assert_eq!(s.pop_due(0.5), None);
        assert_eq!(s.pop_due(5.0), Some((1.0, "first")));
        assert_eq!(s.pop_due(5.0), Some((1.0, "second")));
        assert_eq!(s.pop_due(5.0), Some((2.0, "late")));
        assert!(s.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut s = Scheduler::new();
        let a = s.schedule(1.0, 'a');
        let b = s.schedule(1.5, 'b');
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert!(s.is_pending(b));
        assert_eq!(s.pop_due(1.499), None);
        assert_eq!(s.pop_due(10.0), Some((1.5, 'b')));
        assert_eq!(s.pop_due(10.0), None);
    }

    #[test]
    fn deadline_is_inclusive() {
        let mut s = Scheduler::new();
        s.schedule(3.0, ());
        assert!(s.pop_due(2.999).is_none());
        assert!(s.pop_due(3.0).is_some());
    }

    #[test]
    fn clock_clamps_large_gaps() {
        let mut clock = FrameClock::new(0.0, Some(1.0 / 15.0));
        assert!((clock.delta(0.016) - 0.016).abs() < 1e-6);
        assert!((clock.delta(10.0) - 1.0 / 15.0).abs() < 1e-6);
        assert_eq!(clock.delta(9.0), 0.0);
        assert_eq!(clock.last(), 10.0);

        let mut raw = FrameClock::new(0.0, None);
        assert_eq!(raw.delta(5.0), 5.0);
    }
}
