use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{config::AudioConfig, config::MAX_DELAY_SECONDS, CanvasError, Result};

const BLACKMAN_ALPHA: f32 = 0.16;

/// Analyser that turns pushed audio into byte frames, in the manner of a
/// browser analyser node: the most recent `fft_size` samples are kept and
/// either transformed into a smoothed decibel spectrum or copied out as a
/// waveform.
pub struct AnalysisEngine {
    config: AudioConfig,
    history: Vec<f32>,
    cursor: usize,
    processed_samples: usize,
    delay: DelayLine,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    fft: FftResources,
}

impl AnalysisEngine {
    /// Creates an engine with the default 48 kHz / 256-point configuration.
    pub fn new() -> Self {
        Self::with_config(AudioConfig::default())
    }

    /// Creates an engine for an explicit configuration. The configuration is
    /// expected to have passed through [`crate::AppConfig::sanitized`].
    pub fn with_config(config: AudioConfig) -> Self {
        let size = config.fft_size.max(2);
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);
        let fft = FftResources {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        };

        Self {
            history: vec![0.0; size],
            cursor: 0,
            processed_samples: 0,
            delay: DelayLine::new(config.sample_rate),
            window: blackman_window(size),
            smoothed: vec![0.0; size / 2],
            fft,
            config,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Total number of samples consumed since creation or the last reset.
    pub fn processed_samples(&self) -> usize {
        self.processed_samples
    }

    /// Clears the accumulated state while preserving configuration.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.smoothed.fill(0.0);
        self.cursor = 0;
        self.processed_samples = 0;
        self.delay.clear();
    }

    /// Sets the echo delay applied to incoming samples.
    pub fn set_delay(&mut self, seconds: f32) {
        self.delay.set_delay(seconds);
    }

    /// Consumes audio samples in the -1..1 range.
    pub fn process_block(&mut self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Err(CanvasError::InvalidInput(
                "analysis requires at least one sample",
            ));
        }

        let len = self.history.len();
        for &sample in samples {
            self.history[self.cursor] = self.delay.process(sample);
            self.cursor = (self.cursor + 1) % len;
        }
        self.processed_samples += samples.len();
        Ok(())
    }

    /// Fills `out` with the smoothed spectrum mapped from
    /// `[min_decibels, max_decibels]` onto 0..=255. Bins past the Nyquist
    /// limit are written as zero.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
        let len = self.history.len();
        for (index, slot) in self.fft.input.iter_mut().enumerate() {
            *slot = self.history[(self.cursor + index) % len] * self.window[index];
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        let smoothing = self.config.smoothing;
        let min_db = self.config.min_decibels;
        let scale = 255.0 / (self.config.max_decibels - min_db);
        let norm = 1.0 / len as f32;

        for (bin, value) in out.iter_mut().enumerate() {
            let Some(previous) = self.smoothed.get_mut(bin) else {
                *value = 0;
                continue;
            };
            let magnitude = self.fft.spectrum[bin].norm() * norm;
            *previous = smoothing * *previous + (1.0 - smoothing) * magnitude;
            let db = 20.0 * previous.log10();
            *value = ((db - min_db) * scale).clamp(0.0, 255.0) as u8;
        }

        Ok(())
    }

    /// Fills `out` with the most recent samples mapped as `128 * (1 + s)`.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let len = self.history.len();
        let count = out.len().min(len);
        let start = (self.cursor + len - count) % len;

        for (offset, value) in out.iter_mut().enumerate() {
            *value = if offset < count {
                let sample = self.history[(start + offset) % len];
                (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8
            } else {
                128
            };
        }
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Input-side echo: each sample is mixed with the one written `delay`
/// seconds earlier. A zero delay passes samples through untouched.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write: usize,
    delay_samples: usize,
    sample_rate: u32,
}

impl DelayLine {
    pub fn new(sample_rate: u32) -> Self {
        let capacity = (sample_rate as f32 * MAX_DELAY_SECONDS).ceil() as usize + 1;
        Self {
            buffer: vec![0.0; capacity],
            write: 0,
            delay_samples: 0,
            sample_rate,
        }
    }

    pub fn set_delay(&mut self, seconds: f32) {
        let seconds = if seconds.is_finite() {
            seconds.clamp(0.0, MAX_DELAY_SECONDS)
        } else {
            0.0
        };
        let samples = (seconds * self.sample_rate as f32).round() as usize;
        self.delay_samples = samples.min(self.buffer.len() - 1);
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write = 0;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        let delayed = self.buffer[(self.write + len - self.delay_samples) % len];
        self.buffer[self.write] = input;
        self.write = (self.write + 1) % len;

        if self.delay_samples == 0 {
            input
        } else {
            (input + delayed).clamp(-1.0, 1.0)
        }
    }
}

fn blackman_window(len: usize) -> Vec<f32> {
    let a0 = 0.5 * (1.0 - BLACKMAN_ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * BLACKMAN_ALPHA;
    (0..len)
        .map(|index| {
            let phase = 2.0 * PI * index as f32 / len as f32;
            a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
        })
        .collect()
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("config", &self.config)
            .field("processed_samples", &self.processed_samples)
            .field("delay_samples", &self.delay.delay_samples())
            .finish()
    }
}
