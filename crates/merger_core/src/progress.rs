pub const COMPLETE_MESSAGE: &str = "complete";

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Percentage in `[0, 100]`, non-decreasing within one job.
    pub percentage: f64,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(percentage: f64, message: impl Into<String>) -> Self {
        Self {
            percentage,
            message: message.into(),
        }
    }

    pub fn complete() -> Self {
        Self::new(100.0, COMPLETE_MESSAGE)
    }
}

/// Clamps engine-reported percentages so a job's progress never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressTracker {
    last: f64,
}

impl ProgressTracker {
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Returns the value to publish, or `None` for non-finite input.
    pub fn record(&mut self, percentage: f64) -> Option<f64> {
        if !percentage.is_finite() {
            return None;
        }
        self.last = percentage.clamp(0.0, 100.0).max(self.last);
        Some(self.last)
    }

    pub fn finish(&mut self) -> f64 {
        self.last = 100.0;
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
    }
}
