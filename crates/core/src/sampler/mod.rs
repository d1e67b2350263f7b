use crate::{CanvasError, Result, VisualizationMode};

/// Value every sample takes when no analysis data is available; silence in
/// waveform mode.
pub const MID_SCALE: u8 = 128;

/// External analysis collaborator able to fill byte frames.
pub trait AnalysisSource {
    /// Magnitude per frequency bin.
    fn frequency_data(&mut self, out: &mut [u8]) -> Result<()>;

    /// Time-domain amplitude centred on [`MID_SCALE`].
    fn waveform_data(&mut self, out: &mut [u8]) -> Result<()>;

    /// Forwards the audio delay amount. Sources without a delay line ignore it.
    fn set_delay(&mut self, _seconds: f32) -> Result<()> {
        Ok(())
    }
}

/// One tick's amplitude readings. The storage is allocated once and reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFrame {
    values: Vec<u8>,
}

impl SampleFrame {
    pub fn new(len: usize) -> Self {
        Self::filled(len, MID_SCALE)
    }

    pub fn filled(len: usize, value: u8) -> Self {
        Self {
            values: vec![value; len],
        }
    }

    pub fn from_values(values: Vec<u8>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [u8] {
        &mut self.values
    }
}

/// Adapter between the render loop and an [`AnalysisSource`]. Sampling never
/// fails: a missing or broken source yields a constant mid-scale frame, and
/// a source that is busy elsewhere leaves the previous frame in place.
#[derive(Debug)]
pub struct Sampler<S> {
    source: Option<S>,
    frame: SampleFrame,
    frame_mode: Option<VisualizationMode>,
    degraded: bool,
    delay: Option<f32>,
    delay_forwarded: bool,
}

impl<S: AnalysisSource> Sampler<S> {
    pub fn new(source: S, frame_len: usize) -> Self {
        Self::with_source(Some(source), frame_len)
    }

    /// Sampler with no analysis engine attached.
    pub fn detached(frame_len: usize) -> Self {
        Self::with_source(None, frame_len)
    }

    fn with_source(source: Option<S>, frame_len: usize) -> Self {
        Self {
            source,
            frame: SampleFrame::new(frame_len),
            frame_mode: None,
            degraded: false,
            delay: None,
            delay_forwarded: false,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    /// Attaches `source` and hands it the most recently requested delay.
    pub fn attach(&mut self, source: S) {
        self.source = Some(source);
        self.delay_forwarded = false;
        if let Some(seconds) = self.delay {
            self.forward_delay(seconds);
        }
    }

    pub fn detach(&mut self) -> Option<S> {
        self.source.take()
    }

    /// True while the most recent sample had to fall back to mid-scale.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Requests a delay amount. It reaches the source only when it differs
    /// from what the source last accepted; a refused value is retried on the
    /// next call and on [`Sampler::attach`].
    pub fn set_delay(&mut self, seconds: f32) {
        if self.delay == Some(seconds) && self.delay_forwarded {
            return;
        }
        self.delay = Some(seconds);
        self.delay_forwarded = false;
        self.forward_delay(seconds);
    }

    /// True once the source has accepted the requested delay.
    pub fn delay_forwarded(&self) -> bool {
        self.delay_forwarded
    }

    fn forward_delay(&mut self, seconds: f32) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        match source.set_delay(seconds) {
            Ok(()) => self.delay_forwarded = true,
            Err(err) => tracing::trace!(%err, seconds, "delay not forwarded"),
        }
    }

    /// Reads one frame in the requested mode without waiting on the source.
    pub fn sample(&mut self, mode: VisualizationMode) -> &SampleFrame {
        let outcome = match self.source.as_mut() {
            Some(source) => {
                let out = self.frame.values_mut();
                match mode {
                    VisualizationMode::Frequency => source.frequency_data(out),
                    VisualizationMode::Waveform => source.waveform_data(out),
                }
            }
            None => Err(CanvasError::msg("no analysis source attached")),
        };

        match outcome {
            Ok(()) => {
                if self.degraded {
                    tracing::info!("analysis source recovered");
                }
                self.degraded = false;
            }
            Err(CanvasError::Busy(what)) => {
                tracing::trace!(what, "analysis busy, keeping previous frame");
                if self.frame_mode != Some(mode) {
                    self.frame.values_mut().fill(MID_SCALE);
                }
            }
            Err(err) => {
                if !self.degraded {
                    tracing::warn!(%err, "analysis unavailable, rendering silence");
                }
                self.degraded = true;
                self.frame.values_mut().fill(MID_SCALE);
            }
        }
        self.frame_mode = Some(mode);

        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp {
        fail: bool,
        busy: bool,
        delay: f32,
    }

    impl Ramp {
        fn healthy() -> Self {
            Self {
                fail: false,
                busy: false,
                delay: 0.0,
            }
        }
    }

    impl AnalysisSource for Ramp {
        fn frequency_data(&mut self, out: &mut [u8]) -> Result<()> {
            if self.busy {
                return Err(CanvasError::Busy("ramp"));
            }
            if self.fail {
                return Err(CanvasError::msg("engine offline"));
            }
            for (index, value) in out.iter_mut().enumerate() {
                *value = index as u8;
            }
            Ok(())
        }

        fn waveform_data(&mut self, out: &mut [u8]) -> Result<()> {
            if self.busy {
                return Err(CanvasError::Busy("ramp"));
            }
            if self.fail {
                return Err(CanvasError::msg("engine offline"));
            }
            out.fill(200);
            Ok(())
        }

        fn set_delay(&mut self, seconds: f32) -> Result<()> {
            if self.busy {
                return Err(CanvasError::Busy("ramp"));
            }
            self.delay = seconds;
            Ok(())
        }
    }

    #[test]
    fn dispatches_on_mode() {
        let mut sampler = Sampler::new(Ramp::healthy(), 128);

        let frame = sampler.sample(VisualizationMode::Frequency);
        assert_eq!(frame.len(), 128);
        assert_eq!(frame.values()[5], 5);

        let frame = sampler.sample(VisualizationMode::Waveform);
        assert!(frame.values().iter().all(|&v| v == 200));
    }

    #[test]
    fn failing_source_yields_midscale() {
        let mut sampler = Sampler::new(Ramp::healthy(), 64);
        sampler.sample(VisualizationMode::Frequency);

        if let Some(source) = sampler.source.as_mut() {
            source.fail = true;
        }
        let frame = sampler.sample(VisualizationMode::Frequency);
        assert!(frame.values().iter().all(|&v| v == MID_SCALE));
        assert!(sampler.is_degraded());
    }

    #[test]
    fn detached_sampler_keeps_running() {
        let mut sampler = Sampler::<Ramp>::detached(32);
        let frame = sampler.sample(VisualizationMode::Waveform);
        assert_eq!(frame.len(), 32);
        assert!(frame.values().iter().all(|&v| v == MID_SCALE));

        sampler.attach(Ramp::healthy());
        sampler.sample(VisualizationMode::Frequency);
        assert!(!sampler.is_degraded());
    }

    #[test]
    fn forwards_delay() {
        let mut sampler = Sampler::new(Ramp::healthy(), 8);
        sampler.set_delay(0.3);
        assert!(sampler.delay_forwarded());
        assert_eq!(sampler.detach().map(|source| source.delay), Some(0.3));
    }

    #[test]
    fn busy_source_keeps_previous_frame() {
        let mut sampler = Sampler::new(Ramp::healthy(), 16);
        sampler.sample(VisualizationMode::Frequency);

        if let Some(source) = sampler.source.as_mut() {
            source.busy = true;
        }
        let frame = sampler.sample(VisualizationMode::Frequency);
        assert_eq!(frame.values()[7], 7);
        assert!(!sampler.is_degraded());

        // The kept frame belongs to the other mode, so fall back to silence.
        let frame = sampler.sample(VisualizationMode::Waveform);
        assert!(frame.values().iter().all(|&v| v == MID_SCALE));
    }

    #[test]
    fn refused_delay_is_retried() {
        let mut sampler = Sampler::new(Ramp::healthy(), 8);
        if let Some(source) = sampler.source.as_mut() {
            source.busy = true;
        }
        sampler.set_delay(0.4);
        assert!(!sampler.delay_forwarded());

        if let Some(source) = sampler.source.as_mut() {
            source.busy = false;
        }
        sampler.set_delay(0.4);
        assert!(sampler.delay_forwarded());
        assert_eq!(sampler.detach().map(|source| source.delay), Some(0.4));
    }

    #[test]
    fn attach_hands_over_requested_delay() {
        let mut sampler = Sampler::<Ramp>::detached(8);
        sampler.set_delay(0.5);
        assert!(!sampler.delay_forwarded());

        sampler.attach(Ramp::healthy());
        assert!(sampler.delay_forwarded());
        assert_eq!(sampler.detach().map(|source| source.delay), Some(0.5));
    }
}
