use std::time::Instant;

use crate::render::{Presenter, RasterBuffer};
use crate::{
    AnalysisSource, AppConfig, EffectChain, FrameClock, FrameSettings, Result, Sampler,
    SceneRenderer, SurfaceConfig,
};

/// The per-tick pipeline: sample, draw, post-process.
///
/// The host scheduler calls [`Visualizer::tick`] once per display refresh
/// with a fresh [`FrameSettings`] snapshot. Within a tick the raster buffer
/// is handed from the scene renderer to the effect chain and finally lent
/// to the caller; nothing else can touch it in between.
#[derive(Debug)]
pub struct Visualizer<S> {
    sampler: Sampler<S>,
    scene: SceneRenderer,
    effects: EffectChain,
    buffer: RasterBuffer,
    clock: FrameClock,
}

impl<S: AnalysisSource> Visualizer<S> {
    pub fn new(source: S, surface: SurfaceConfig, frame_len: usize) -> Self {
        Self::with_sampler(Sampler::new(source, frame_len), surface)
    }

    /// Visualizer with no analysis engine; every tick renders silence.
    pub fn detached(surface: SurfaceConfig, frame_len: usize) -> Self {
        Self::with_sampler(Sampler::detached(frame_len), surface)
    }

    pub fn from_config(source: S, config: &AppConfig) -> Self {
        Self::new(source, config.surface, config.audio.frame_len())
    }

    fn with_sampler(sampler: Sampler<S>, surface: SurfaceConfig) -> Self {
        tracing::info!(
            width = surface.width,
            height = surface.height,
            frame_len = sampler.frame_len(),
            "visualizer ready"
        );
        Self {
            sampler,
            scene: SceneRenderer::new(),
            effects: EffectChain::new(),
            buffer: RasterBuffer::new(surface.width as usize, surface.height as usize),
            clock: FrameClock::new(),
        }
    }

    /// Replaces the effect chain, e.g. with a seeded one for reproducible
    /// noise.
    pub fn with_effect_chain(mut self, effects: EffectChain) -> Self {
        self.effects = effects;
        self
    }

    /// Advances one tick and returns the finished frame.
    pub fn tick(&mut self, settings: &FrameSettings) -> &RasterBuffer {
        self.sampler.set_delay(settings.delay_seconds);
        let frame = self.sampler.sample(settings.mode);
        self.scene.render(&mut self.buffer, frame.values(), settings);
        self.effects.apply(&mut self.buffer, &settings.effects);

        tracing::trace!(tick = self.clock.ticks(), mode = ?settings.mode, "tick");
        if let Some(fps) = self.clock.tick_at(Instant::now()) {
            tracing::debug!(
                fps,
                ticks = self.clock.ticks(),
                degraded = self.sampler.is_degraded(),
                "frame statistics"
            );
        }

        &self.buffer
    }

    /// Advances one tick and hands the frame to `presenter`.
    pub fn tick_and_present(
        &mut self,
        settings: &FrameSettings,
        presenter: &mut dyn Presenter,
    ) -> Result<()> {
        let frame = self.tick(settings);
        presenter.present(frame)
    }

    /// Frame produced by the most recent tick.
    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    pub fn sampler(&self) -> &Sampler<S> {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler<S> {
        &mut self.sampler
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }
}
