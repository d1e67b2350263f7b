use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::{AnalysisEngine, AnalysisSource, AudioConfig, CanvasError, Result};

/// High level audio engine façade. A capture or decoder thread pushes
/// samples in, the render loop reads byte frames out through an
/// [`AnalysisHandle`].
#[derive(Debug)]
pub struct AudioEngine {
    config: AudioConfig,
    analysis: Arc<Mutex<AnalysisEngine>>,
}

impl AudioEngine {
    /// Creates an engine using the default analysis configuration.
    pub fn new() -> Self {
        Self::with_config(AudioConfig::default())
    }

    pub fn with_config(config: AudioConfig) -> Self {
        let analysis = AnalysisEngine::with_config(config.clone());
        Self {
            config,
            analysis: Arc::new(Mutex::new(analysis)),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Resets the analysis state and returns a handle to it.
    pub fn start(&self) -> Result<AnalysisHandle> {
        self.lock_analysis()?.reset();
        tracing::info!(
            sample_rate = self.config.sample_rate,
            fft_size = self.config.fft_size,
            "audio analysis started"
        );
        Ok(AnalysisHandle::new(self.analysis.clone()))
    }

    /// Feeds a block of floating point samples into the engine.
    pub fn push_samples(&self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        self.lock_analysis()?.process_block(samples)
    }

    pub fn set_delay(&self, seconds: f32) -> Result<()> {
        self.lock_analysis()?.set_delay(seconds);
        Ok(())
    }

    fn lock_analysis(&self) -> Result<MutexGuard<'_, AnalysisEngine>> {
        self.analysis
            .lock()
            .map_err(|_| CanvasError::Poisoned("analysis pipeline"))
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, thread-safe view over the analysis engine managed by [`AudioEngine`].
///
/// Reads never wait: while a feeder thread holds the engine they fail with
/// [`CanvasError::Busy`].
#[derive(Clone)]
pub struct AnalysisHandle {
    shared: Arc<Mutex<AnalysisEngine>>,
}

impl AnalysisHandle {
    pub(crate) fn new(shared: Arc<Mutex<AnalysisEngine>>) -> Self {
        Self { shared }
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, AnalysisEngine>> {
        self.shared.try_lock().map_err(|err| match err {
            TryLockError::WouldBlock => CanvasError::Busy("analysis pipeline"),
            TryLockError::Poisoned(_) => CanvasError::Poisoned("analysis pipeline"),
        })
    }
}

impl AnalysisSource for AnalysisHandle {
    fn frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
        self.try_lock()?.byte_frequency_data(out)
    }

    fn waveform_data(&mut self, out: &mut [u8]) -> Result<()> {
        self.try_lock()?.byte_time_domain_data(out);
        Ok(())
    }

    fn set_delay(&mut self, seconds: f32) -> Result<()> {
        self.try_lock()?.set_delay(seconds);
        Ok(())
    }
}

impl std::fmt::Debug for AnalysisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisHandle").finish()
    }
}
