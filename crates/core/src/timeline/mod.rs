use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts ticks and measures the rate at which the host drives them.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    ticks: u64,
    window_start: Option<Instant>,
    window_ticks: u32,
    fps: Option<f32>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Ticks recorded since creation or the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Rate measured over the last completed one-second window.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    /// Records a tick at `now`. Returns the measured rate whenever a
    /// one-second window closes.
    pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.ticks += 1;
        let start = *self.window_start.get_or_insert(now);
        self.window_ticks += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < REPORT_INTERVAL {
            return None;
        }

        let fps = (self.window_ticks - 1) as f32 / elapsed.as_secs_f32();
        self.fps = Some(fps);
        self.window_start = Some(now);
        self.window_ticks = 1;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_rate_once_per_window() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        let frame = Duration::from_micros(16_667);

        let mut reports = Vec::new();
        for n in 0..=100u32 {
            if let Some(fps) = clock.tick_at(start + frame * n) {
                reports.push(fps);
            }
        }

        assert_eq!(clock.ticks(), 101);
        assert_eq!(reports.len(), 1);
        assert!((reports[0] - 60.0).abs() < 0.5, "fps was {}", reports[0]);
        assert_eq!(clock.fps(), Some(reports[0]));
    }

    #[test]
    fn reset_clears_counters() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        clock.tick_at(start + Duration::from_secs(2));
        assert!(clock.fps().is_some());

        clock.reset();
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.fps(), None);
    }
}
