//! Collaborator failure tracking
//!
//! Keeps a rolling window of failure timestamps so the governor can halt
//! when external calls start failing in a burst rather than one at a time.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

pub struct FailureWindow {
    window: Duration,
    events: VecDeque<DateTime<Utc>>,
}

impl FailureWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            events: VecDeque::new(),
        }
    }

    /// Record one collaborator failure
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.events.push_back(at);
    }

    /// Failures still inside the window as of `now`
    pub fn count_at(&mut self, now: DateTime<Utc>) -> u32 {
        let cutoff = now - self.window;
        while let Some(ts) = self.events.front() {
            if *ts < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
        self.events.len() as u32
    }
}
