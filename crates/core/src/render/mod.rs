use crate::{CanvasError, Result};

/// Fill colour with a CSS-style alpha in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    /// Alpha is clamped to [0, 1]; NaN becomes fully transparent.
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        let a = if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) };
        Self { r, g, b, a }
    }
}

/// Fixed green → yellow → red ramp used by gradient bars. `top` maps to red
/// and `bottom` to green; rows outside the range take the end colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGradient {
    pub top: f32,
    pub bottom: f32,
    pub alpha: f32,
}

impl BarGradient {
    const RED: [f32; 3] = [255.0, 0.0, 0.0];
    const YELLOW: [f32; 3] = [255.0, 255.0, 0.0];
    const GREEN: [f32; 3] = [0.0, 255.0, 0.0];

    pub fn color_at(&self, y: f32) -> Rgba {
        let span = self.bottom - self.top;
        let t = if span.abs() <= f32::EPSILON {
            0.0
        } else {
            ((y - self.top) / span).clamp(0.0, 1.0)
        };
        let (from, to, local) = if t < 0.5 {
            (Self::RED, Self::YELLOW, t * 2.0)
        } else {
            (Self::YELLOW, Self::GREEN, (t - 0.5) * 2.0)
        };
        let mix = |c: usize| (from[c] + (to[c] - from[c]) * local).round() as u8;
        Rgba::new(mix(0), mix(1), mix(2), self.alpha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Gradient(BarGradient),
}

impl Paint {
    fn color_at(&self, y: f32) -> Rgba {
        match self {
            Self::Solid(color) => *color,
            Self::Gradient(gradient) => gradient.color_at(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Row-major RGBA8 surface, non-premultiplied, four interleaved channels per
/// pixel. Shapes are composited source-over and cover a pixel when its
/// centre lies inside the shape.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    // Stroke coverage scratch, one byte per pixel, always left zeroed.
    mask: Vec<u8>,
    // Stamped column range per row for the stroke in progress, always left
    // empty.
    spans: Vec<(usize, usize)>,
}

const EMPTY_SPAN: (usize, usize) = (usize::MAX, 0);

impl RasterBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
            mask: vec![0; width * height],
            spans: vec![EMPTY_SPAN; height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reads the full pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Writes the full pixel buffer.
    pub fn replace_pixels(&mut self, pixels: &[u8]) -> Result<()> {
        if pixels.len() != self.pixels.len() {
            return Err(CanvasError::InvalidInput(
                "pixel data does not match the surface dimensions",
            ));
        }
        self.pixels.copy_from_slice(pixels);
        Ok(())
    }

    /// RGBA value at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Resets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|&v| v == 0)
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: &Paint) {
        let (left, right) = ordered(x, x + width);
        let (top, bottom) = ordered(y, y + height);
        let (x0, x1) = self.covered_span(left, right, self.width);
        let (y0, y1) = self.covered_span(top, bottom, self.height);

        for py in y0..y1 {
            let color = paint.color_at(py as f32 + 0.5);
            let row = py * self.width;
            for px in x0..x1 {
                let i = (row + px) * 4;
                blend(&mut self.pixels[i..i + 4], color);
            }
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        if !(radius > 0.0) || color.a <= 0.0 {
            return;
        }

        let (y0, y1) = self.covered_span(center.y - radius, center.y + radius, self.height);
        let r2 = radius * radius;
        for py in y0..y1 {
            let dy = py as f32 + 0.5 - center.y;
            let reach = r2 - dy * dy;
            if reach < 0.0 {
                continue;
            }
            let half = reach.sqrt();
            let (x0, x1) = self.covered_span(center.x - half, center.x + half, self.width);
            let row = py * self.width;
            for px in x0..x1 {
                let i = (row + px) * 4;
                blend(&mut self.pixels[i..i + 4], color);
            }
        }
    }

    /// Strokes a quadratic Bézier from `from` to `to`. Every pixel within
    /// `line_width / 2` of the curve is blended exactly once.
    pub fn stroke_quadratic(
        &mut self,
        from: Point,
        control: Point,
        to: Point,
        line_width: f32,
        color: Rgba,
    ) {
        let half = line_width * 0.5;
        if !(half > 0.0) || color.a <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }

        let hull = distance(from, control) + distance(control, to);
        let steps = hull.ceil().max(1.0) as usize;
        let mut rows: Option<(usize, usize)> = None;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let u = 1.0 - t;
            let point = Point::new(
                u * u * from.x + 2.0 * u * t * control.x + t * t * to.x,
                u * u * from.y + 2.0 * u * t * control.y + t * t * to.y,
            );
            self.stamp_disc(point, half, &mut rows);
        }

        let Some((y0, y1)) = rows else {
            return;
        };
        for py in y0..=y1 {
            let (x0, x1) = std::mem::replace(&mut self.spans[py], EMPTY_SPAN);
            let row = py * self.width;
            for px in x0..x1 {
                let m = row + px;
                if self.mask[m] != 0 {
                    self.mask[m] = 0;
                    let i = m * 4;
                    blend(&mut self.pixels[i..i + 4], color);
                }
            }
        }
    }

    fn stamp_disc(&mut self, center: Point, radius: f32, rows: &mut Option<(usize, usize)>) {
        let (y0, y1) = self.covered_span(center.y - radius, center.y + radius, self.height);
        let r2 = radius * radius;
        for py in y0..y1 {
            let dy = py as f32 + 0.5 - center.y;
            let reach = r2 - dy * dy;
            if reach < 0.0 {
                continue;
            }
            let half = reach.sqrt();
            let (x0, x1) = self.covered_span(center.x - half, center.x + half, self.width);
            if x0 >= x1 {
                continue;
            }
            let row = py * self.width;
            self.mask[row + x0..row + x1].fill(1);
            let span = &mut self.spans[py];
            *span = (span.0.min(x0), span.1.max(x1));
            *rows = Some(match *rows {
                Some((first, last)) => (first.min(py), last.max(py)),
                None => (py, py),
            });
        }
    }

    /// Pixel indices whose centres fall inside `[start, end)`, clipped to
    /// `0..limit`.
    fn covered_span(&self, start: f32, end: f32, limit: usize) -> (usize, usize) {
        let first = (start - 0.5).ceil().max(0.0);
        let last = (end - 0.5).ceil().min(limit as f32);
        if !(first < last) {
            return (0, 0);
        }
        (first as usize, last as usize)
    }
}

impl PartialEq for RasterBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }
}

/// Consumer of finished frames such as a window or an encoder.
pub trait Presenter {
    fn present(&mut self, buffer: &RasterBuffer) -> Result<()>;
}

#[inline]
fn blend(dst: &mut [u8], color: Rgba) {
    let sa = color.a;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.fill(0);
        return;
    }

    let keep = da * (1.0 - sa);
    let channel = |src: u8, dst: u8| {
        ((src as f32 * sa + dst as f32 * keep) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    dst[0] = channel(color.r, dst[0]);
    dst[1] = channel(color.g, dst[1]);
    dst[2] = channel(color.b, dst[2]);
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}
