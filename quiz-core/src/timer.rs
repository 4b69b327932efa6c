use std::time::{Duration, Instant};

/// Countdown for a timed attempt. `fire` latches so expiry is reported once.
#[derive(Debug, Clone)]
pub struct Countdown {
    started_at: Instant,
    duration: Duration,
    fired: bool,
}

impl Countdown {
    pub fn start(duration: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            duration,
            fired: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed().min(self.duration)
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.started_at.elapsed())
    }

    pub fn deadline(&self) -> Instant {
        self.started_at + self.duration
    }

    pub fn is_expired(&self) -> bool {
        self.started_at.elapsed() >= self.duration
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Returns true exactly once, the first time it is called after expiry.
    pub fn fire(&mut self) -> bool {
        if self.fired || !self.is_expired() {
            return false;
        }
        self.fired = true;
        true
    }

    /// `m:ss`, as shown next to the quiz form.
    pub fn display(&self) -> String {
        let seconds = self.remaining().as_secs();
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}
