use crate::render::{BarGradient, Paint, Point, RasterBuffer, Rgba};
use crate::{BarLayoutKind, FrameSettings, VisualizationMode};

/// Waveform curves are displaced by `(amplitude - 128) * WAVE_SCALE`.
pub const WAVE_SCALE: f32 = 1.0;
pub const WAVE_LINE_WIDTH: f32 = 10.0;
const WAVE_ALPHA: f32 = 0.2;
const BAR_ALPHA: f32 = 0.6;

/// One translucent disc layer drawn at the surface centre for every sample.
#[derive(Debug, Clone, Copy)]
pub struct CircleTier {
    pub scale: f32,
    pub rgb: [u8; 3],
    pub base_alpha: f32,
    pub falloff: f32,
}

impl CircleTier {
    pub fn radius(&self, amplitude: u8, max_radius: f32) -> f32 {
        amplitude_fraction(amplitude) * max_radius * self.scale
    }

    pub fn alpha(&self, amplitude: u8) -> f32 {
        self.base_alpha - amplitude_fraction(amplitude) * self.falloff
    }
}

/// Red-ish at full radius, a wide faint blue halo, and a small yellow core.
/// Each fades on its own slope as the amplitude grows.
pub const CIRCLE_TIERS: [CircleTier; 3] = [
    CircleTier {
        scale: 1.0,
        rgb: [255, 111, 111],
        base_alpha: 0.34,
        falloff: 1.0 / 3.0,
    },
    CircleTier {
        scale: 1.5,
        rgb: [0, 0, 255],
        base_alpha: 0.10,
        falloff: 1.0 / 10.0,
    },
    CircleTier {
        scale: 0.5,
        rgb: [200, 200, 0],
        base_alpha: 0.5,
        falloff: 1.0 / 5.0,
    },
];

/// Mirrored copies of the bars, running right to left from the end of the
/// bar field or the right edge of the surface, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorBars {
    /// How far each mirrored copy sits above its source bar.
    pub lift: f32,
}

/// Geometry of the frequency bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    /// Distance between consecutive samples that get drawn.
    pub stride: usize,
    pub bar_width: f32,
    pub bar_spacing: f32,
    pub bar_height: f32,
    pub top_spacing: f32,
    pub mirror: Option<MirrorBars>,
    pub gradient: bool,
}

impl BarLayout {
    pub const fn classic() -> Self {
        Self {
            stride: 1,
            bar_width: 4.0,
            bar_spacing: 1.0,
            bar_height: 100.0,
            top_spacing: 50.0,
            mirror: Some(MirrorBars { lift: 20.0 }),
            gradient: false,
        }
    }

    pub const fn dense() -> Self {
        Self {
            stride: 2,
            bar_width: 10.0,
            bar_spacing: 2.0,
            bar_height: 100.0,
            top_spacing: 50.0,
            mirror: None,
            gradient: true,
        }
    }

    pub const fn for_kind(kind: BarLayoutKind) -> Self {
        match kind {
            BarLayoutKind::Classic => Self::classic(),
            BarLayoutKind::Dense => Self::dense(),
        }
    }

    /// Horizontal distance between consecutive drawn bars.
    pub fn slot_width(&self) -> f32 {
        self.bar_width + self.bar_spacing
    }

    /// Position of the mirrored copy of bar 0 for `bars` drawn bars.
    pub fn mirror_origin(&self, bars: usize, surface_width: usize) -> f32 {
        (bars as f32 * self.slot_width()).min(surface_width as f32)
    }

    /// Top edge of a bar; louder samples sit higher on the surface.
    pub fn bar_top(&self, amplitude: u8) -> f32 {
        self.top_spacing + 256.0 - amplitude as f32
    }

    fn paint(&self) -> Paint {
        if self.gradient {
            Paint::Gradient(BarGradient {
                top: self.top_spacing,
                bottom: self.top_spacing + 256.0 + self.bar_height,
                alpha: BAR_ALPHA,
            })
        } else {
            Paint::Solid(Rgba::new(0, 255, 0, BAR_ALPHA))
        }
    }
}

/// Geometric description of one shape, consumed as soon as it is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Bar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    Curve {
        from: Point,
        control: Point,
        to: Point,
        width: f32,
        color: Rgba,
    },
}

impl Primitive {
    pub fn draw(&self, buffer: &mut RasterBuffer) {
        match *self {
            Self::Bar {
                x,
                y,
                width,
                height,
                ref paint,
            } => buffer.fill_rect(x, y, width, height, paint),
            Self::Circle {
                center,
                radius,
                color,
            } => buffer.fill_circle(center, radius, color),
            Self::Curve {
                from,
                control,
                to,
                width,
                color,
            } => buffer.stroke_quadratic(from, control, to, width, color),
        }
    }
}

/// Maps one sample frame to the primitives for a `width` × `height` surface,
/// appending them to `out` in draw order.
pub fn plan_scene(
    samples: &[u8],
    settings: &FrameSettings,
    width: usize,
    height: usize,
    out: &mut Vec<Primitive>,
) {
    let layout = BarLayout::for_kind(settings.layout);
    let stride = match settings.mode {
        VisualizationMode::Frequency => layout.stride.max(1),
        VisualizationMode::Waveform => 1,
    };
    let center = Point::new(width as f32 / 2.0, height as f32 / 2.0);
    let max_radius = settings.max_radius.max(0.0);
    let bar_paint = layout.paint();
    let mirror_origin = layout.mirror_origin(samples.len().div_ceil(stride), width);
    let wave_color = Rgba::new(0, 255, 0, WAVE_ALPHA);

    for (index, &amplitude) in samples.iter().enumerate().step_by(stride) {
        match settings.mode {
            VisualizationMode::Frequency => {
                let slot = (index / stride) as f32 * layout.slot_width();
                let top = layout.bar_top(amplitude);
                out.push(Primitive::Bar {
                    x: slot,
                    y: top,
                    width: layout.bar_width,
                    height: layout.bar_height,
                    paint: bar_paint,
                });
                if let Some(mirror) = layout.mirror {
                    out.push(Primitive::Bar {
                        x: mirror_origin - slot,
                        y: top - mirror.lift,
                        width: layout.bar_width,
                        height: layout.bar_height,
                        paint: bar_paint,
                    });
                }
            }
            VisualizationMode::Waveform => {
                let displacement = (amplitude as f32 - 128.0) * WAVE_SCALE;
                let from = Point::new(0.0, center.y);
                let to = Point::new(width as f32, center.y);
                for sign in [1.0, -1.0] {
                    out.push(Primitive::Curve {
                        from,
                        control: Point::new(center.x, center.y + sign * displacement),
                        to,
                        width: WAVE_LINE_WIDTH,
                        color: wave_color,
                    });
                }
            }
        }

        for tier in &CIRCLE_TIERS {
            let [r, g, b] = tier.rgb;
            out.push(Primitive::Circle {
                center,
                radius: tier.radius(amplitude, max_radius),
                color: Rgba::new(r, g, b, tier.alpha(amplitude)),
            });
        }
    }
}

/// Draws one tick's scene onto the raster buffer.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    // Scratch reused across ticks; emptied once its primitives are drawn.
    primitives: Vec<Primitive>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears `buffer`, then draws every primitive implied by `samples`.
    pub fn render(&mut self, buffer: &mut RasterBuffer, samples: &[u8], settings: &FrameSettings) {
        buffer.clear();
        self.primitives.clear();
        plan_scene(
            samples,
            settings,
            buffer.width(),
            buffer.height(),
            &mut self.primitives,
        );
        for primitive in self.primitives.drain(..) {
            primitive.draw(buffer);
        }
    }
}

fn amplitude_fraction(amplitude: u8) -> f32 {
    amplitude as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(samples: &[u8], settings: &FrameSettings) -> Vec<Primitive> {
        let mut out = Vec::new();
        plan_scene(samples, settings, 800, 600, &mut out);
        out
    }

    fn circle_radii(primitives: &[Primitive]) -> Vec<f32> {
        primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Circle { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn circle_radii_stay_within_largest_tier() {
        let settings = FrameSettings {
            max_radius: 120.0,
            ..FrameSettings::default()
        };
        let samples: Vec<u8> = (0..=255).collect();

        let radii = circle_radii(&plan(&samples, &settings));
        assert_eq!(radii.len(), 256 * 3);
        assert!(radii.iter().all(|&r| (0.0..=1.5 * 120.0).contains(&r)));
        assert_eq!(radii[255 * 3 + 1], 180.0);
    }

    #[test]
    fn radius_grows_linearly_with_amplitude() {
        let tier = CIRCLE_TIERS[0];
        let mut previous = -1.0;
        for amplitude in 0..=255u8 {
            let radius = tier.radius(amplitude, 90.0);
            assert!(radius > previous);
            previous = radius;
        }
        assert!((tier.radius(51, 90.0) - 18.0).abs() < 1e-4);
        assert_eq!(tier.radius(255, 0.0), 0.0);
    }

    #[test]
    fn tiers_fade_on_distinct_slopes() {
        let alphas = |amplitude| CIRCLE_TIERS.map(|tier| tier.alpha(amplitude));

        let quiet = alphas(0);
        assert_eq!(quiet, [0.34, 0.10, 0.5]);
        let loud = alphas(255);
        assert!((loud[0] - (0.34 - 1.0 / 3.0)).abs() < 1e-6);
        assert!(loud[1].abs() < 1e-6);
        assert!((loud[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn classic_bars_follow_amplitude_and_mirror() {
        let primitives = plan(&[0, 200, 255], &FrameSettings::default());

        let bars: Vec<_> = primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Bar { x, y, height, .. } => Some((*x, *y, *height)),
                _ => None,
            })
            .collect();

        assert_eq!(
            bars,
            vec![
                (0.0, 306.0, 100.0),
                (640.0, 286.0, 100.0),
                (5.0, 106.0, 100.0),
                (635.0, 86.0, 100.0),
                (10.0, 51.0, 100.0),
                (630.0, 31.0, 100.0),
            ]
        );
    }

    #[test]
    fn dense_layout_draws_every_other_sample() {
        let settings = FrameSettings {
            layout: BarLayoutKind::Dense,
            ..FrameSettings::default()
        };
        let samples = [10u8; 128];
        let primitives = plan(&samples, &settings);

        let xs: Vec<f32> = primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Bar { x, paint, .. } => {
                    assert!(matches!(paint, Paint::Gradient(_)));
                    Some(*x)
                }
                _ => None,
            })
            .collect();

        assert_eq!(xs.len(), 64);
        assert_eq!(xs[1], 12.0);
        assert!(xs.iter().all(|&x| x + 10.0 <= 800.0));
        assert_eq!(circle_radii(&primitives).len(), 64 * 3);
    }

    #[test]
    fn waveform_curves_mirror_around_centre() {
        let settings = FrameSettings {
            mode: VisualizationMode::Waveform,
            ..FrameSettings::default()
        };
        let primitives = plan(&[178], &settings);

        let controls: Vec<Point> = primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Curve { control, .. } => Some(*control),
                _ => None,
            })
            .collect();

        assert_eq!(controls, vec![Point::new(400.0, 350.0), Point::new(400.0, 250.0)]);
        assert!(!primitives.iter().any(|p| matches!(p, Primitive::Bar { .. })));
    }

    #[test]
    fn render_starts_from_a_clear_buffer() {
        let mut buffer = RasterBuffer::new(800, 600);
        buffer.fill_rect(700.0, 500.0, 50.0, 50.0, &Paint::Solid(Rgba::new(9, 9, 9, 1.0)));

        let mut renderer = SceneRenderer::new();
        renderer.render(&mut buffer, &[0; 128], &FrameSettings::default());

        assert_eq!(buffer.pixel(720, 520), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(0, 306), Some([0, 255, 0, 153]));
        assert!(renderer.primitives.is_empty());
    }

    fn mirrored_xs(primitives: &[Primitive]) -> Vec<f32> {
        primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Bar { x, y, .. } if *y == 286.0 => Some(*x),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mirror_starts_at_narrow_surface_edge() {
        let mut out = Vec::new();
        plan_scene(&[0; 128], &FrameSettings::default(), 400, 300, &mut out);

        let xs = mirrored_xs(&out);
        assert_eq!(xs.len(), 128);
        assert_eq!(xs[0], 400.0);
        assert_eq!(xs[127], 400.0 - 127.0 * 5.0);
    }

    #[test]
    fn mirror_follows_frame_length() {
        let mut out = Vec::new();
        plan_scene(&[0; 64], &FrameSettings::default(), 800, 600, &mut out);
        assert_eq!(mirrored_xs(&out)[0], 320.0);

        out.clear();
        plan_scene(&[0; 256], &FrameSettings::default(), 800, 600, &mut out);
        assert_eq!(mirrored_xs(&out)[0], 800.0);
    }
}
