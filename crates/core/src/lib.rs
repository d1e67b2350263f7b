//! Core library for the Spectrum Canvas audio-reactive renderer.
//!
//! Every display refresh the host calls [`Visualizer::tick`], which runs the
//! whole pipeline once: a [`Sampler`] reads one byte frame from the audio
//! analysis engine, the [`SceneRenderer`] turns it into bars, circles or
//! waveform curves on a [`RasterBuffer`], and the [`EffectChain`] rewrites
//! the finished pixels. Control values reach the pipeline as an immutable
//! [`FrameSettings`] snapshot taken from a [`ControlPanel`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod controls;
pub mod effects;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod sampler;
pub mod scene;
pub mod timeline;

pub use analysis::{AnalysisEngine, DelayLine};
pub use audio::{AnalysisHandle, AudioEngine};
pub use config::{
    AppConfig, AudioConfig, BarLayoutKind, ChannelArithmetic, EffectSettings, FrameSettings,
    SurfaceConfig, TintChannel, VisualizationMode,
};
pub use controls::ControlPanel;
pub use effects::EffectChain;
pub use error::{CanvasError, Result};
pub use pipeline::Visualizer;
pub use render::{Presenter, RasterBuffer};
pub use sampler::{AnalysisSource, SampleFrame, Sampler};
pub use scene::{Primitive, SceneRenderer};
pub use timeline::FrameClock;
