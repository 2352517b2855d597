// MIT License

// Copyright (c) 2022 AnonmousDapper

use glam::Vec2;

/// 8-bit sRGB triple, as written in hex literals.
pub type Color = (u8, u8, u8);

/// Build a [`Color`] from a `0xRRGGBB` literal.
pub const fn hex(value: u32) -> Color {
    (
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
    )
}

/// A palette entry: inner and middle stop of a bubble gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub color1: Color,
    pub color2: Color,
}

impl ColorPair {
    pub const fn new(color1: u32, color2: u32) -> Self {
        Self {
            color1: hex(color1),
            color2: hex(color2),
        }
    }
}

/// Straight (non-premultiplied) color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a.clamp(0.0, 1.0),
        )
    }
}

impl From<Color> for Rgba {
    fn from((r, g, b): Color) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

/// Blend function: `(backdrop, source) -> result`.
pub type Mixer = fn(Rgba, Rgba) -> Rgba;

/// Compositing operation applied when painting onto the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    ColorDodge,
}

impl CompositeOp {
    pub fn mixer(self) -> Mixer {
        match self {
            CompositeOp::SourceOver => blend_source_over,
            CompositeOp::ColorDodge => blend_color_dodge,
        }
    }
}

pub fn blend_source_over(backdrop: Rgba, source: Rgba) -> Rgba {
    let a = source.a + backdrop.a * (1.0 - source.a);

    if a <= 0.0 {
        return Rgba::TRANSPARENT;
    }

    let keep = backdrop.a * (1.0 - source.a);
    let channel = |s: f32, b: f32| (s * source.a + b * keep) / a;

    Rgba::new(
        channel(source.r, backdrop.r),
        channel(source.g, backdrop.g),
        channel(source.b, backdrop.b),
        a,
    )
}

fn dodge(backdrop: f32, source: f32) -> f32 {
    if backdrop <= 0.0 {
        0.0
    } else if source >= 1.0 {
        1.0
    } else {
        (backdrop / (1.0 - source)).min(1.0)
    }
}

/// Color-dodge separable blend followed by source-over compositing.
pub fn blend_color_dodge(backdrop: Rgba, source: Rgba) -> Rgba {
    // where the backdrop is transparent the source shows through unmodified
    let mix = |s: f32, b: f32| (1.0 - backdrop.a) * s + backdrop.a * dodge(b, s);

    let blended = Rgba::new(
        mix(source.r, backdrop.r),
        mix(source.g, backdrop.g),
        mix(source.b, backdrop.b),
        source.a,
    );

    blend_source_over(backdrop, blended)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Radial gradient from the center (offset 0) to `radius` (offset 1).
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    center: Vec2,
    radius: f32,
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            stops: Vec::with_capacity(3),
        }
    }

    /// Add a stop; stops sharing an offset keep insertion order.
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let idx = self.stops.partition_point(|stop| stop.offset <= offset);
        self.stops.insert(idx, ColorStop { offset, color });
        self
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `point`, clamped to the last stop outside the radius.
    pub fn color_at(&self, point: Vec2) -> Rgba {
        let t = if self.radius > 0.0 {
            (point.distance(self.center) / self.radius).min(1.0)
        } else {
            1.0
        };

        self.sample(t)
    }

    pub fn sample(&self, t: f32) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Rgba::TRANSPARENT,
        };

        if t <= first.offset {
            return first.color;
        }

        if t >= last.offset {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                if span <= 0.0 {
                    return b.color;
                }
                return lerp_premultiplied(a.color, b.color, (t - a.offset) / span);
            }
        }

        last.color
    }
}

fn lerp_premultiplied(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let alpha = a.a + (b.a - a.a) * t;

    if alpha <= 0.0 {
        return Rgba::TRANSPARENT;
    }

    let channel = |x: f32, y: f32| (x * a.a + (y * b.a - x * a.a) * t) / alpha;

    Rgba::new(
        channel(a.r, b.r),
        channel(a.g, b.g),
        channel(a.b, b.b),
        alpha,
    )
}
