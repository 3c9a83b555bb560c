//! Build timing utilities.

use std::time::Instant;

use crate::logger::Logger;

/// A simple timer for measuring phase durations.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given phase name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish the timer and log the elapsed time.
    pub fn finish(self, log: &Logger) {
        let secs = self.start.elapsed().as_secs_f64();
        if secs >= 60.0 {
            log.info(&format!("[{:.1}m] {}", secs / 60.0, self.name));
        } else {
            log.info(&format!("[{:.1}s] {}", secs, self.name));
        }
    }
}
