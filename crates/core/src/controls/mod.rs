use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{
    BarLayoutKind, ChannelArithmetic, FrameSettings, TintChannel, VisualizationMode,
    DEFAULT_BRIGHTNESS_LEVEL, DEFAULT_MAX_RADIUS, MAX_DELAY_SECONDS,
};

/// Shared control state mutated by UI event handlers and read by the render
/// loop. Clones share the same underlying values.
///
/// Writers may run at any time relative to a tick; the loop only ever sees
/// the values through [`ControlPanel::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    shared: Arc<Mutex<FrameSettings>>,
}

impl ControlPanel {
    pub fn new(initial: FrameSettings) -> Self {
        Self {
            shared: Arc::new(Mutex::new(initial.sanitized())),
        }
    }

    /// Copies the current values for one tick.
    pub fn snapshot(&self) -> FrameSettings {
        *self.lock()
    }

    pub fn set_mode(&self, mode: VisualizationMode) {
        self.lock().mode = mode;
    }

    pub fn set_layout(&self, layout: BarLayoutKind) {
        self.lock().layout = layout;
    }

    pub fn set_invert(&self, enabled: bool) {
        self.lock().effects.invert = enabled;
    }

    pub fn set_tint(&self, enabled: bool, channel: TintChannel) {
        let mut settings = self.lock();
        settings.effects.tint_enabled = enabled;
        settings.effects.tint_channel = channel;
    }

    pub fn set_noise(&self, enabled: bool) {
        self.lock().effects.noise = enabled;
    }

    pub fn set_scanlines(&self, enabled: bool) {
        self.lock().effects.scanlines = enabled;
    }

    pub fn set_brightness_enabled(&self, enabled: bool) {
        self.lock().effects.brightness_enabled = enabled;
    }

    pub fn set_brightness_level(&self, level: u8) {
        self.lock().effects.brightness_level = level.min(100);
    }

    pub fn set_arithmetic(&self, arithmetic: ChannelArithmetic) {
        self.lock().effects.arithmetic = arithmetic;
    }

    pub fn set_max_radius(&self, radius: f32) {
        let radius = if radius.is_finite() && radius >= 0.0 {
            radius
        } else {
            tracing::warn!(radius, "invalid circle radius, using default");
            DEFAULT_MAX_RADIUS
        };
        self.lock().max_radius = radius;
    }

    pub fn set_delay(&self, seconds: f32) {
        let seconds = if seconds.is_finite() {
            seconds.clamp(0.0, MAX_DELAY_SECONDS)
        } else {
            tracing::warn!(seconds, "invalid delay, using default");
            0.0
        };
        self.lock().delay_seconds = seconds;
    }

    /// Applies a raw slider value; anything unparsable resets the radius to
    /// [`DEFAULT_MAX_RADIUS`].
    pub fn set_max_radius_input(&self, raw: &str) {
        match raw.trim().parse::<f32>() {
            Ok(radius) => self.set_max_radius(radius),
            Err(_) => {
                tracing::warn!(raw, "unparsable circle radius, using default");
                self.set_max_radius(DEFAULT_MAX_RADIUS);
            }
        }
    }

    /// Applies a raw slider value; anything unparsable resets the level to
    /// [`DEFAULT_BRIGHTNESS_LEVEL`].
    pub fn set_brightness_input(&self, raw: &str) {
        let level = match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u8,
            _ => {
                tracing::warn!(raw, "unparsable brightness level, using default");
                DEFAULT_BRIGHTNESS_LEVEL
            }
        };
        self.set_brightness_level(level);
    }

    /// Applies a raw slider value; anything unparsable disables the delay.
    pub fn set_delay_input(&self, raw: &str) {
        match raw.trim().parse::<f32>() {
            Ok(seconds) => self.set_delay(seconds),
            Err(_) => {
                tracing::warn!(raw, "unparsable delay, using default");
                self.set_delay(0.0);
            }
        }
    }

    // A panic in a UI handler must not take the render loop down with it, so
    // a poisoned lock hands back the last written values.
    fn lock(&self) -> MutexGuard<'_, FrameSettings> {
        self.shared.lock().unwrap_or_else(|p| p.into_inner())
    }
}
