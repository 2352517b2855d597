// MIT License

// Copyright (c) 2022 AnonmousDapper

use std::fmt;

use glam::Vec2;
use half::f16;
use line_drawing::BresenhamCircle;

use crate::color::{CompositeOp, RadialGradient, Rgba};

const GAMMA: f32 = 2.2;

const PIXEL_BYTES: usize = 8;

pub type Size = i32;
pub type Point = (Size, Size);

type Buffer = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    ZeroSized { width: u32, height: u32 },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::ZeroSized { width, height } => {
                write!(f, "cannot allocate a {}x{} drawing surface", width, height)
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Immediate-mode 2D drawing surface.
pub trait Render {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reallocate the surface; previous content is discarded.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    fn fill_rect(&mut self, origin: Point, size: (u32, u32), color: Rgba);

    fn fill_circle(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient);

    fn set_composite(&mut self, op: CompositeOp);

    fn save(&mut self);

    fn restore(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct DrawState {
    composite: CompositeOp,
}

pub struct Canvas {
    width: u32,
    height: u32,
    frame: Buffer,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            width,
            height,
            frame: allocate(width, height)?,
            state: DrawState::default(),
            saved: Vec::new(),
        })
    }

    #[inline]
    pub fn get_frame(&self) -> &Buffer {
        &self.frame
    }

    pub fn composite(&self) -> CompositeOp {
        self.state.composite
    }

    pub fn pixel(&self, x: Size, y: Size) -> Option<Rgba> {
        self.index(x, y)
            .map(|idx| RgbaF16::from_bytes(&self.frame[idx..idx + PIXEL_BYTES]).to_rgba())
    }

    /// Copy the frame into a presenter buffer of the same width, linearizing for
    /// an `Rgba16Float` texture. Rows that don't fit in `frame` are dropped.
    pub fn render_to(&self, frame: &mut [u8]) {
        let row = self.width as usize * PIXEL_BYTES;

        for (dst_row, src_row) in frame.chunks_exact_mut(row).zip(self.frame.chunks_exact(row)) {
            for (dst, src) in dst_row
                .chunks_exact_mut(PIXEL_BYTES)
                .zip(src_row.chunks_exact(PIXEL_BYTES))
            {
                dst.copy_from_slice(&RgbaF16::from_bytes(src).linearize().as_bytes());
            }
        }
    }

    #[inline]
    fn index(&self, x: Size, y: Size) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }

        Some((y as usize * self.width as usize + x as usize) * PIXEL_BYTES)
    }

    #[inline]
    fn paint(&mut self, x: Size, y: Size, color: Rgba) {
        if let Some(idx) = self.index(x, y) {
            let pixel = &mut self.frame[idx..idx + PIXEL_BYTES];
            let backdrop = RgbaF16::from_bytes(pixel).to_rgba();
            let mixed = (self.state.composite.mixer())(backdrop, color);
            pixel.copy_from_slice(&RgbaF16::from(mixed).as_bytes());
        }
    }
}

fn allocate(width: u32, height: u32) -> Result<Buffer, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::ZeroSized { width, height });
    }

    Ok(vec![0; width as usize * height as usize * PIXEL_BYTES])
}

/// Horizontal spans `(y, x_start, x_end)` covering a filled circle.
fn circle_spans(cx: Size, cy: Size, radius: Size) -> Vec<(Size, Size, Size)> {
    let top = cy - radius;
    let mut rows = vec![(Size::MAX, Size::MIN); (radius * 2 + 1) as usize];

    for (x, y) in BresenhamCircle::new(cx, cy, radius) {
        if let Some(row) = rows.get_mut((y - top) as usize) {
            row.0 = row.0.min(x);
            row.1 = row.1.max(x);
        }
    }

    rows.into_iter()
        .enumerate()
        .filter(|(_, (start, end))| start <= end)
        .map(|(dy, (start, end))| (top + dy as Size, start, end))
        .collect()
}

impl Render for Canvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.frame = allocate(width, height)?;
        self.width = width;
        self.height = height;

        Ok(())
    }

    fn fill_rect(&mut self, (x, y): Point, (w, h): (u32, u32), color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as Size).min(self.width as Size);
        let y1 = (y + h as Size).min(self.height as Size);

        for py in y0..y1 {
            for px in x0..x1 {
                self.paint(px, py, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }

        let cx = center.x.round() as Size;
        let cy = center.y.round() as Size;
        let r = radius.ceil() as Size;

        // fully off-surface
        if cx + r < 0 || cy + r < 0 || cx - r >= self.width as Size || cy - r >= self.height as Size
        {
            return;
        }

        for (y, start, end) in circle_spans(cx, cy, r) {
            if y < 0 || y >= self.height as Size {
                continue;
            }

            for x in start.max(0)..=end.min(self.width as Size - 1) {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if sample.distance(center) > radius {
                    continue;
                }

                self.paint(x, y, gradient.color_at(sample));
            }
        }
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.state.composite = op;
    }

    fn save(&mut self) {
        self.saved.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RgbaF16 {
    r: f16,
    g: f16,
    b: f16,
    a: f16,
}

impl RgbaF16 {
    pub fn new_raw(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: f16::from_f32(r),
            g: f16::from_f32(g),
            b: f16::from_f32(b),
            a: f16::from_f32(a),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let channel = |i: usize| f16::from_le_bytes([bytes[i], bytes[i + 1]]);

        Self {
            r: channel(0),
            g: channel(2),
            b: channel(4),
            a: channel(6),
        }
    }

    pub fn to_rgba(self) -> Rgba {
        Rgba::new(self.r.to_f32(), self.g.to_f32(), self.b.to_f32(), self.a.to_f32())
    }

    /// Convert gamma-encoded channels to linear light.
    pub fn linearize(self) -> Self {
        Self::new_raw(
            self.r.to_f32().powf(GAMMA),
            self.g.to_f32().powf(GAMMA),
            self.b.to_f32().powf(GAMMA),
            self.a.to_f32(),
        )
    }

    #[inline]
    pub fn as_bytes(&self) -> [u8; 8] {
        let [rh, rl] = self.r.to_le_bytes();
        let [gh, gl] = self.g.to_le_bytes();
        let [bh, bl] = self.b.to_le_bytes();
        let [ah, al] = self.a.to_le_bytes();

        [rh, rl, gh, gl, bh, bl, ah, al]
    }
}

impl From<Rgba> for RgbaF16 {
    fn from(color: Rgba) -> Self {
        Self::new_raw(color.r, color.g, color.b, color.a)
    }
}
