use std::time::Instant;

use spectrum_canvas_core::{Presenter, RasterBuffer, Result};

/// Presenter for headless runs: accumulates per-frame colour statistics and
/// logs them every `report_every` frames.
#[derive(Debug)]
pub struct StatsPresenter {
    report_every: u64,
    frames: u64,
    window_frames: u64,
    window_start: Instant,
    mean_rgb: [f64; 3],
    coverage: f64,
}

impl StatsPresenter {
    pub fn new(report_every: u64) -> Self {
        Self {
            report_every: report_every.max(1),
            frames: 0,
            window_frames: 0,
            window_start: Instant::now(),
            mean_rgb: [0.0; 3],
            coverage: 0.0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn report(&mut self) {
        let n = self.window_frames.max(1) as f64;
        let elapsed = self.window_start.elapsed().as_secs_f64();
        tracing::info!(
            frames = self.frames,
            fps = round1(self.window_frames as f64 / elapsed.max(f64::EPSILON)),
            red = round1(self.mean_rgb[0] / n),
            green = round1(self.mean_rgb[1] / n),
            blue = round1(self.mean_rgb[2] / n),
            coverage = (self.coverage / n * 1000.0).round() / 1000.0,
            "presented"
        );
        self.window_frames = 0;
        self.window_start = Instant::now();
        self.mean_rgb = [0.0; 3];
        self.coverage = 0.0;
    }
}

impl Presenter for StatsPresenter {
    fn present(&mut self, buffer: &RasterBuffer) -> Result<()> {
        let mut sums = [0u64; 3];
        let mut painted = 0u64;
        let mut count = 0u64;
        for px in buffer.pixels().chunks_exact(4) {
            sums[0] += u64::from(px[0]);
            sums[1] += u64::from(px[1]);
            sums[2] += u64::from(px[2]);
            painted += u64::from(px[3] != 0);
            count += 1;
        }

        let count = count.max(1) as f64;
        for (mean, sum) in self.mean_rgb.iter_mut().zip(sums) {
            *mean += sum as f64 / count;
        }
        self.coverage += painted as f64 / count;
        self.frames += 1;
        self.window_frames += 1;

        if self.window_frames >= self.report_every {
            self.report();
        }
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_presented_frames() {
        let mut presenter = StatsPresenter::new(2);
        let buffer = RasterBuffer::new(4, 4);
        for _ in 0..5 {
            presenter.present(&buffer).unwrap();
        }

        assert_eq!(presenter.frames(), 5);
        assert_eq!(presenter.window_frames, 1);
    }
}
