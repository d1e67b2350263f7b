use serde::{Deserialize, Serialize};

use crate::Result;

/// Radius used for the largest circle tier when no usable value is supplied.
pub const DEFAULT_MAX_RADIUS: f32 = 200.0;
/// Brightness slider position that leaves the frame untouched.
pub const DEFAULT_BRIGHTNESS_LEVEL: u8 = 100;
/// Upper bound accepted for the audio delay line, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 1.0;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub surface: SurfaceConfig,
    pub audio: AudioConfig,
    pub controls: FrameSettings,
}

impl AppConfig {
    pub fn live_defaults() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing fields take their defaults and
    /// out-of-range values are repaired by [`AppConfig::sanitized`].
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        Ok(config.sanitized())
    }

    /// Replaces every unusable value with its documented default.
    pub fn sanitized(mut self) -> Self {
        let surface_defaults = SurfaceConfig::default();
        if self.surface.width == 0 || self.surface.height == 0 {
            tracing::warn!(
                width = self.surface.width,
                height = self.surface.height,
                "surface dimensions must be non-zero, using defaults"
            );
            self.surface = surface_defaults;
        }

        let audio_defaults = AudioConfig::default();
        let fft = self.audio.fft_size;
        if !fft.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft) {
            tracing::warn!(fft_size = fft, "unsupported fft size, using default");
            self.audio.fft_size = audio_defaults.fft_size;
        }
        if self.audio.sample_rate == 0 {
            tracing::warn!("sample rate must be non-zero, using default");
            self.audio.sample_rate = audio_defaults.sample_rate;
        }
        if !(0.0..=1.0).contains(&self.audio.smoothing) {
            tracing::warn!(
                smoothing = self.audio.smoothing,
                "smoothing outside [0, 1], using default"
            );
            self.audio.smoothing = audio_defaults.smoothing;
        }
        if !(self.audio.min_decibels < self.audio.max_decibels) {
            tracing::warn!(
                min = self.audio.min_decibels,
                max = self.audio.max_decibels,
                "decibel range is empty, using defaults"
            );
            self.audio.min_decibels = audio_defaults.min_decibels;
            self.audio.max_decibels = audio_defaults.max_decibels;
        }

        self.controls = self.controls.sanitized();
        self
    }
}

/// Dimensions of the raster surface, fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Analysis window length; sample frames hold half as many values.
    pub fft_size: usize,
    /// Time constant for averaging successive spectra, in [0, 1].
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl AudioConfig {
    /// Number of values in every sample frame.
    pub fn frame_len(&self) -> usize {
        self.fft_size / 2
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// How each sample value is interpreted by the scene renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    /// Magnitude per frequency bin, drawn as bars.
    #[default]
    Frequency,
    /// Time-domain amplitude around mid-scale, drawn as curves.
    Waveform,
}

/// Bar arrangement used in frequency mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarLayoutKind {
    /// One flat translucent bar per sample plus a mirrored copy.
    #[default]
    Classic,
    /// Wider gradient bars for every other sample.
    Dense,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TintChannel {
    #[default]
    Red,
    Green,
    Blue,
}

impl TintChannel {
    /// Offset of the channel inside an RGBA pixel.
    pub const fn offset(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// 8-bit policy shared by the tint and brightness effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelArithmetic {
    /// Results clamp to [0, 255].
    #[default]
    Saturating,
    /// Results wrap modulo 256.
    Wrapping,
}

impl ChannelArithmetic {
    #[inline(always)]
    pub fn add(self, value: u8, offset: u8) -> u8 {
        match self {
            Self::Saturating => value.saturating_add(offset),
            Self::Wrapping => value.wrapping_add(offset),
        }
    }

    #[inline(always)]
    pub fn sub(self, value: u8, offset: u8) -> u8 {
        match self {
            Self::Saturating => value.saturating_sub(offset),
            Self::Wrapping => value.wrapping_sub(offset),
        }
    }
}

/// Toggles and levels consumed by the pixel effect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub tint_enabled: bool,
    pub tint_channel: TintChannel,
    pub invert: bool,
    pub noise: bool,
    pub scanlines: bool,
    pub brightness_enabled: bool,
    /// Slider position in 0..=100; 100 leaves the frame untouched.
    pub brightness_level: u8,
    pub arithmetic: ChannelArithmetic,
}

impl EffectSettings {
    /// Returns true when no effect would touch the buffer.
    pub fn is_passthrough(&self) -> bool {
        !(self.tint_enabled
            || self.invert
            || self.noise
            || self.scanlines
            || self.brightness_enabled)
    }

    /// Amount subtracted from every colour channel by the brightness effect.
    pub fn darkness(&self) -> u8 {
        100 - self.brightness_level.min(100)
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            tint_enabled: false,
            tint_channel: TintChannel::Red,
            invert: false,
            noise: false,
            scanlines: false,
            brightness_enabled: false,
            brightness_level: DEFAULT_BRIGHTNESS_LEVEL,
            arithmetic: ChannelArithmetic::Saturating,
        }
    }
}

/// Immutable snapshot of every externally controlled value, read once at the
/// start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub mode: VisualizationMode,
    pub layout: BarLayoutKind,
    pub effects: EffectSettings,
    pub max_radius: f32,
    /// Forwarded to the audio delay line; never read by the pixel chain.
    pub delay_seconds: f32,
}

impl FrameSettings {
    /// Clamps levels into range and swaps non-finite numbers for defaults.
    pub fn sanitized(mut self) -> Self {
        if !self.max_radius.is_finite() || self.max_radius < 0.0 {
            tracing::warn!(max_radius = self.max_radius, "invalid circle radius, using default");
            self.max_radius = DEFAULT_MAX_RADIUS;
        }
        if !self.delay_seconds.is_finite() {
            tracing::warn!("invalid delay, using default");
            self.delay_seconds = 0.0;
        }
        self.delay_seconds = self.delay_seconds.clamp(0.0, MAX_DELAY_SECONDS);
        self.effects.brightness_level = self.effects.brightness_level.min(100);
        self
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            mode: VisualizationMode::Frequency,
            layout: BarLayoutKind::Classic,
            effects: EffectSettings::default(),
            max_radius: DEFAULT_MAX_RADIUS,
            delay_seconds: 0.0,
        }
    }
}
