//! Progress estimation for long dispatches

use std::fmt;
use std::time::{Duration, Instant};

/// Progress of `processed` out of `total` items
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Rounded percentage
    pub percentage: u32,
    pub elapsed: Duration,
    /// Linear estimate; `None` until something was processed
    pub remaining: Option<Duration>,
}

impl Progress {
    /// `total = 0` is treated as 1
    pub fn compute(processed: usize, total: usize, started: Instant) -> Self {
        Self::from_elapsed(processed, total, started.elapsed())
    }

    pub fn from_elapsed(processed: usize, total: usize, elapsed: Duration) -> Self {
        let total = total.max(1);
        let percentage = ((processed as f64 / total as f64) * 100.0).round() as u32;

        let remaining = (processed > 0).then(|| {
            let left = total.saturating_sub(processed) as f64;
            Duration::from_secs_f64(elapsed.as_secs_f64() / processed as f64 * left)
        });

        Self {
            percentage,
            elapsed,
            remaining,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% elapsed {}", self.percentage, format_dhms(self.elapsed))?;
        if let Some(remaining) = self.remaining {
            write!(f, " remaining {}", format_dhms(remaining))?;
        }
        Ok(())
    }
}

/// `Xd Xh Xm Xs`, whole seconds
pub fn format_dhms(duration: Duration) -> String {
    let secs = duration.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}
