use std::f32::consts::TAU;

/// Seconds between beat pulses (120 BPM).
const BEAT_INTERVAL: f32 = 0.5;
const SWEEP_RATE_HZ: f32 = 0.1;
const SWEEP_OCTAVES: f32 = 2.0;
const NOISE_LEVEL: f32 = 0.05;

/// Stand-in for a playing track: a tone sweeping two octaves either side of
/// `base_hz`, pumped by a decaying 120 BPM envelope, over a little noise.
#[derive(Debug)]
pub struct SyntheticSignal {
    sample_rate: f32,
    base_hz: f32,
    phase: f32,
    position: u64,
    rng: fastrand::Rng,
}

impl SyntheticSignal {
    pub fn new(sample_rate: u32, base_hz: f32) -> Self {
        Self {
            sample_rate: sample_rate.max(1) as f32,
            base_hz: base_hz.max(1.0),
            phase: 0.0,
            position: 0,
            rng: fastrand::Rng::with_seed(0x5eed),
        }
    }

    /// Number of samples covering `seconds` of audio.
    pub fn samples_for(&self, seconds: f32) -> usize {
        (seconds.max(0.0) * self.sample_rate).round() as usize
    }

    pub fn fill(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let t = self.position as f32 / self.sample_rate;
            let sweep = (TAU * SWEEP_RATE_HZ * t).sin() * SWEEP_OCTAVES;
            let frequency = self.base_hz * sweep.exp2();
            self.phase = (self.phase + TAU * frequency / self.sample_rate) % TAU;

            let envelope = (-8.0 * (t % BEAT_INTERVAL)).exp();
            let noise = (self.rng.f32() * 2.0 - 1.0) * NOISE_LEVEL;
            *sample = (0.6 * self.phase.sin() * (0.4 + 0.6 * envelope) + noise).clamp(-1.0, 1.0);
            self.position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range_and_is_not_silent() {
        let mut signal = SyntheticSignal::new(48_000, 220.0);
        let mut block = vec![0.0; signal.samples_for(0.25)];
        signal.fill(&mut block);

        assert_eq!(block.len(), 12_000);
        assert!(block.iter().all(|s| (-1.0..=1.0).contains(s)));
        let peak = block.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.3);
    }
}
