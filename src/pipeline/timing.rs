//! Step timing.

use log::info;
use std::time::Instant;

/// Measures one step and logs the elapsed time when finished.
pub(super) struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub(super) fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    pub(super) fn finish(self) {
        info!("    {}", format_elapsed(self.start.elapsed().as_secs_f64(), &self.name));
    }
}

fn format_elapsed(secs: f64, name: &str) -> String {
    if secs >= 60.0 {
        format!("[{:.1}m] {}", secs / 60.0, name)
    } else {
        format!("[{:.1}s] {}", secs, name)
    }
}
