//! Per-pixel post-processing applied after the scene is drawn.
//!
//! Effects run in a fixed order for every pixel: tint, invert, noise,
//! scanlines, brightness. Each stage sees the values left by the previous
//! one, so tint followed by invert yields `255 - (v + 100)` on the tinted
//! channel.

use fastrand::Rng;

use crate::render::RasterBuffer;
use crate::EffectSettings;

pub const TINT_OFFSET: u8 = 100;
pub const NOISE_PROBABILITY: f32 = 0.10;
pub const NOISE_GRAY: u8 = 128;
/// Rows whose index is a multiple of this start a scanline band.
pub const SCANLINE_PERIOD: usize = 50;
/// Rows per band, counted from the marked row downwards.
pub const SCANLINE_THICKNESS: usize = 2;

/// Stateless apart from the noise generator, which is seedable so frames can
/// be reproduced.
#[derive(Debug, Clone)]
pub struct EffectChain {
    rng: Rng,
}

impl EffectChain {
    pub fn new() -> Self {
        Self { rng: Rng::new() }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
        }
    }

    /// Runs every enabled effect over `buffer`, visiting each pixel once.
    pub fn apply(&mut self, buffer: &mut RasterBuffer, effects: &EffectSettings) {
        let width = buffer.width();
        if width == 0 || effects.is_passthrough() {
            return;
        }

        let arithmetic = effects.arithmetic;
        let tint = effects.tint_enabled.then(|| effects.tint_channel.offset());
        let invert = effects.invert;
        let noise = effects.noise;
        let darkness = effects.brightness_enabled.then(|| effects.darkness());
        let rng = &mut self.rng;

        for (row, line) in buffer.pixels_mut().chunks_exact_mut(width * 4).enumerate() {
            let scanline = effects.scanlines && row % SCANLINE_PERIOD < SCANLINE_THICKNESS;

            for px in line.chunks_exact_mut(4) {
                if let Some(channel) = tint {
                    px[channel] = arithmetic.add(px[channel], TINT_OFFSET);
                }

                if invert {
                    px[0] = 255 - px[0];
                    px[1] = 255 - px[1];
                    px[2] = 255 - px[2];
                }

                if noise && rng.f32() < NOISE_PROBABILITY {
                    px[0] = NOISE_GRAY;
                    px[1] = NOISE_GRAY;
                    px[2] = NOISE_GRAY;
                    px[3] = 255;
                }

                if scanline {
                    px.fill(255);
                }

                if let Some(darkness) = darkness {
                    px[0] = arithmetic.sub(px[0], darkness);
                    px[1] = arithmetic.sub(px[1], darkness);
                    px[2] = arithmetic.sub(px[2], darkness);
                }
            }
        }
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelArithmetic, TintChannel};

    fn filled(width: usize, height: usize, rgba: [u8; 4]) -> RasterBuffer {
        let mut buffer = RasterBuffer::new(width, height);
        for px in buffer.pixels_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        buffer
    }

    fn run(buffer: &mut RasterBuffer, effects: EffectSettings) {
        EffectChain::with_seed(7).apply(buffer, &effects);
    }

    #[test]
    fn disabled_chain_leaves_buffer_untouched() {
        let mut buffer = filled(8, 8, [10, 20, 30, 40]);
        let before = buffer.clone();
        run(&mut buffer, EffectSettings::default());
        assert_eq!(buffer, before);
    }

    #[test]
    fn tint_runs_before_invert() {
        let mut buffer = filled(2, 2, [50, 60, 70, 80]);
        run(
            &mut buffer,
            EffectSettings {
                tint_enabled: true,
                invert: true,
                ..EffectSettings::default()
            },
        );

        // 255 - (50 + 100), not (255 - 50) + 100.
        assert_eq!(buffer.pixel(1, 1), Some([105, 195, 185, 80]));
    }

    #[test]
    fn tint_targets_the_selected_channel() {
        let mut buffer = filled(1, 1, [1, 2, 3, 4]);
        run(
            &mut buffer,
            EffectSettings {
                tint_enabled: true,
                tint_channel: TintChannel::Green,
                ..EffectSettings::default()
            },
        );
        assert_eq!(buffer.pixel(0, 0), Some([1, 102, 3, 4]));
    }

    #[test]
    fn tint_overflow_follows_policy() {
        let tint = EffectSettings {
            tint_enabled: true,
            ..EffectSettings::default()
        };

        let mut clamped = filled(1, 1, [200, 0, 0, 255]);
        run(&mut clamped, tint);
        assert_eq!(clamped.pixel(0, 0), Some([255, 0, 0, 255]));

        let mut wrapped = filled(1, 1, [200, 0, 0, 255]);
        run(
            &mut wrapped,
            EffectSettings {
                arithmetic: ChannelArithmetic::Wrapping,
                ..tint
            },
        );
        assert_eq!(wrapped.pixel(0, 0), Some([44, 0, 0, 255]));
    }

    #[test]
    fn noise_hits_about_one_pixel_in_ten() {
        let mut buffer = filled(400, 250, [10, 20, 30, 40]);
        run(
            &mut buffer,
            EffectSettings {
                noise: true,
                ..EffectSettings::default()
            },
        );

        let mut gray = 0usize;
        for px in buffer.pixels().chunks_exact(4) {
            match px {
                [128, 128, 128, 255] => gray += 1,
                [10, 20, 30, 40] => {}
                other => panic!("unexpected pixel {other:?}"),
            }
        }

        let fraction = gray as f64 / 100_000.0;
        assert!((fraction - 0.10).abs() < 0.006, "fraction was {fraction}");
    }

    #[test]
    fn noise_is_reproducible_with_a_seed() {
        let effects = EffectSettings {
            noise: true,
            ..EffectSettings::default()
        };
        let mut a = filled(32, 32, [0, 0, 0, 0]);
        let mut b = a.clone();
        run(&mut a, effects);
        run(&mut b, effects);
        assert_eq!(a, b);
    }

    #[test]
    fn scanlines_paint_two_row_bands() {
        let mut buffer = filled(3, 120, [1, 2, 3, 4]);
        run(
            &mut buffer,
            EffectSettings {
                scanlines: true,
                ..EffectSettings::default()
            },
        );

        for row in 0..120 {
            let expected = if matches!(row, 0 | 1 | 50 | 51 | 100 | 101) {
                [255; 4]
            } else {
                [1, 2, 3, 4]
            };
            for col in 0..3 {
                assert_eq!(buffer.pixel(col, row), Some(expected), "row {row}");
            }
        }
    }

    #[test]
    fn scanline_on_last_row_stays_in_bounds() {
        let mut buffer = filled(2, 51, [0, 0, 0, 0]);
        run(
            &mut buffer,
            EffectSettings {
                scanlines: true,
                ..EffectSettings::default()
            },
        );
        assert_eq!(buffer.pixel(1, 50), Some([255; 4]));
        assert_eq!(buffer.pixel(1, 49), Some([0; 4]));
    }

    #[test]
    fn full_brightness_is_a_no_op() {
        let mut buffer = filled(4, 4, [150, 120, 101, 77]);
        let before = buffer.clone();
        run(
            &mut buffer,
            EffectSettings {
                brightness_enabled: true,
                brightness_level: 100,
                ..EffectSettings::default()
            },
        );
        assert_eq!(buffer, before);
    }

    #[test]
    fn zero_brightness_darkens_by_one_hundred() {
        let dark = EffectSettings {
            brightness_enabled: true,
            brightness_level: 0,
            ..EffectSettings::default()
        };

        let mut buffer = filled(4, 4, [150, 120, 101, 77]);
        run(&mut buffer, dark);
        assert_eq!(buffer.pixel(3, 3), Some([50, 20, 1, 77]));

        let mut clamped = filled(1, 1, [30, 99, 100, 5]);
        run(&mut clamped, dark);
        assert_eq!(clamped.pixel(0, 0), Some([0, 0, 0, 5]));

        let mut wrapped = filled(1, 1, [30, 99, 100, 5]);
        run(
            &mut wrapped,
            EffectSettings {
                arithmetic: ChannelArithmetic::Wrapping,
                ..dark
            },
        );
        assert_eq!(wrapped.pixel(0, 0), Some([186, 255, 0, 5]));
    }

    #[test]
    fn brightness_applies_after_scanlines() {
        let mut buffer = filled(1, 3, [0, 0, 0, 0]);
        run(
            &mut buffer,
            EffectSettings {
                scanlines: true,
                brightness_enabled: true,
                brightness_level: 40,
                ..EffectSettings::default()
            },
        );
        assert_eq!(buffer.pixel(0, 0), Some([195, 195, 195, 255]));
        assert_eq!(buffer.pixel(0, 1), Some([195, 195, 195, 255]));
        assert_eq!(buffer.pixel(0, 2), Some([0, 0, 0, 0]));
    }
}
