/// Outcome of a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunResult {
    pub time: f64,
    /// Best time after this run was taken into account.
    pub best: f64,
    pub new_record: bool,
}

/// Stage stopwatch plus the best finish time across runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunTimer {
    start: Option<f64>,
    finished: Option<f64>,
    best: Option<f64>,
}

impl RunTimer {
    pub fn new(best: Option<f64>) -> Self {
        Self { start: None, finished: None, best }
    }

    /// Start the clock if it has not started yet.
    pub fn start(&mut self, now: f64) -> bool {
        if self.start.is_some() {
            return false;
        }
        self.start = Some(now);
        true
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.is_started() && !self.is_finished()
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    /// Frozen time once finished, live time while running.
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        match (self.start, self.finished) {
            (_, Some(done)) => Some(done),
            (Some(start), None) => Some((now - start).max(0.0)),
            (None, None) => None,
        }
    }

    /// Freeze the clock and fold the time into the best record. Returns None
    /// if the run never started or already finished.
    pub fn finish(&mut self, now: f64) -> Option<RunResult> {
        if !self.is_running() {
            return None;
        }
        let time = self.elapsed(now)?;
        self.finished = Some(time);
        let new_record = self.best.map_or(true, |best| time < best);
        if new_record {
            self.best = Some(time);
        }
        Some(RunResult { time, best: self.best.unwrap_or(time), new_record })
    }

    /// Clear the run, keeping the best time.
    pub fn reset(&mut self) {
        self.start = None;
        self.finished = None;
    }
}
