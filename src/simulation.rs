// MIT License

// Copyright (c) 2022 AnonmousDapper

use std::fmt;

use log::debug;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    canvas::{Render, SurfaceError},
    color::{hex, Color, ColorPair, CompositeOp, RadialGradient, Rgba},
    resize::Viewport,
};

// Field constants

/// Bubbles spawned at start-up.
pub const MAX_COUNT: usize = 75;

/// Bubbles spawned at start-up in reduced mode.
pub const REDUCED_MAX_COUNT: usize = 20;

pub const MAX_SIZE: f32 = 100.0;
pub const MIN_SIZE: f32 = 5.0;

// in tenths of a pixel per frame
const MIN_SPEED: f32 = 5.0;
const MAX_SPEED: f32 = 10.0;

/// One in `DIRECTION_WINDOW + 1` odds per forced direction.
const DIRECTION_WINDOW: i64 = 500;
const RADIUS_WINDOW: i64 = 15;

pub const BACKGROUND: Color = hex(0x0b1f23);

pub const PALETTE: [ColorPair; 4] = [
    ColorPair::new(0xb062fa, 0x72d8ff),
    ColorPair::new(0x71ffc0, 0xce50ff),
    ColorPair::new(0x5b0cfa, 0x0bfcff),
    ColorPair::new(0xff4081, 0x651fff),
];

const EDGE: Color = (250, 76, 43);

// Simulator types

pub type Point = glam::Vec2;

pub type BubbleId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    UnknownBubble(BubbleId),
}

impl fmt::Display for PopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopError::UnknownBubble(id) => write!(f, "no bubble with id {}", id),
        }
    }
}

impl std::error::Error for PopError {}

/// Uniform integer in `[floor(min), floor(max)]`; an inverted range collapses to `floor(min)`.
pub fn random_num<R: Rng>(rng: &mut R, min: f32, max: f32) -> i64 {
    let min = min.floor() as i64;
    let max = (max.floor() as i64).max(min);

    rng.gen_range(min..=max)
}

/// Nudge for a random walk: `1` below `min`, `-1` above `max`, otherwise a
/// rare random `1`/`-1` out of `prob + 1` draws, else `0`.
pub fn change_settings<R: Rng>(
    rng: &mut R,
    value: f32,
    min: f32,
    max: f32,
    prob: i64,
) -> i8 {
    // drawn even when out of bounds so the stream doesn't depend on position
    let chance = random_num(rng, 0.0, prob as f32);

    if value < min {
        1
    } else if value > max {
        -1
    } else {
        match chance {
            1 => 1,
            2 => -1,
            _ => 0,
        }
    }
}

fn pick_color<R: Rng>(rng: &mut R) -> ColorPair {
    PALETTE[random_num(rng, 0.0, (PALETTE.len() - 1) as f32) as usize]
}

fn pick_direction<R: Rng>(rng: &mut R) -> i8 {
    match random_num(rng, -1.0, 1.0) {
        0 => 1,
        d => d as i8,
    }
}

#[derive(Debug, Clone)]
pub struct Bubble {
    id: BubbleId,

    position: Point,

    radius: f32,

    color: ColorPair,

    speed: f32,
    speed_backup: f32,

    direction_x: i8,
    direction_y: i8,

    // never animated
    flicker: f32,
}

impl Bubble {
    fn spawn<R: Rng>(
        rng: &mut R,
        id: BubbleId,
        bounds: Point,
        position: Option<Point>,
        radius: Option<f32>,
    ) -> Self {
        let position = position.unwrap_or_else(|| {
            Point::new(
                random_num(rng, 0.0, bounds.x) as f32,
                random_num(rng, 0.0, bounds.y) as f32,
            )
        });
        let radius = radius.unwrap_or_else(|| random_num(rng, MIN_SIZE, MAX_SIZE) as f32);
        let color = pick_color(rng);
        let speed = random_num(rng, MIN_SPEED, MAX_SPEED) as f32 / 10.0;

        Self {
            id,
            position,
            radius,
            color,
            speed,
            speed_backup: speed,
            direction_x: pick_direction(rng),
            direction_y: pick_direction(rng),
            flicker: 0.0,
        }
    }

    pub fn id(&self) -> BubbleId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn position_mut(&mut self) -> &mut Point {
        &mut self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn radius_mut(&mut self) -> &mut f32 {
        &mut self.radius
    }

    pub fn color(&self) -> ColorPair {
        self.color
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Transient speed override, undone on the next update.
    pub fn speed_mut(&mut self) -> &mut f32 {
        &mut self.speed
    }

    pub fn speed_backup(&self) -> f32 {
        self.speed_backup
    }

    pub fn direction(&self) -> (i8, i8) {
        (self.direction_x, self.direction_y)
    }

    pub fn flicker(&self) -> f32 {
        self.flicker
    }

    /// Advance one frame inside a `bounds.x` by `bounds.y` surface.
    pub fn update<R: Rng>(&mut self, rng: &mut R, bounds: Point) {
        match change_settings(rng, self.position.x, 0.0, bounds.x, DIRECTION_WINDOW) {
            0 => {}
            d => self.direction_x = d,
        }
        match change_settings(rng, self.position.y, 0.0, bounds.y, DIRECTION_WINDOW) {
            0 => {}
            d => self.direction_y = d,
        }

        self.speed = self.speed_backup;

        self.position.x += self.speed * self.direction_x as f32;
        self.position.y += self.speed * self.direction_y as f32;

        self.radius += change_settings(rng, self.radius, MIN_SIZE, MAX_SIZE, RADIUS_WINDOW) as f32;
    }

    pub fn gradient(&self) -> RadialGradient {
        RadialGradient::new(self.position, self.radius)
            .with_stop(0.0, self.color.color1.into())
            .with_stop(0.5, self.color.color2.into())
            .with_stop(1.0, Rgba::rgba(EDGE.0, EDGE.1, EDGE.2, 0.0))
    }

    pub fn draw<D: Render + ?Sized>(&self, surface: &mut D) {
        surface.save();
        surface.set_composite(CompositeOp::ColorDodge);
        surface.fill_circle(self.position, self.radius, &self.gradient());
        surface.restore();
    }
}

/// Grow-only collection of bubbles plus the surface extents they roam.
///
/// Bubble ids start at 1 and equal their position in creation order; nothing
/// is ever removed, popping only shrinks a bubble and appends offspring.
pub struct BubbleField {
    bubbles: Vec<Bubble>,
    width: u32,
    height: u32,
    reduced_mode: bool,
    rng: SmallRng,
}

impl BubbleField {
    pub fn new(
        reduced_mode: bool,
        viewport: Viewport,
        rng: SmallRng,
    ) -> Result<Self, SurfaceError> {
        let (width, height) = viewport.surface_size(reduced_mode);

        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSized { width, height });
        }

        let mut field = Self {
            bubbles: Vec::new(),
            width,
            height,
            reduced_mode,
            rng,
        };

        let count = if reduced_mode { REDUCED_MAX_COUNT } else { MAX_COUNT };
        field.bubbles.reserve(count);

        for _ in 0..count {
            field.spawn(None, None);
        }

        Ok(field)
    }

    pub fn from_seed(
        reduced_mode: bool,
        viewport: Viewport,
        seed: u64,
    ) -> Result<Self, SurfaceError> {
        Self::new(reduced_mode, viewport, SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy(reduced_mode: bool, viewport: Viewport) -> Result<Self, SurfaceError> {
        Self::new(reduced_mode, viewport, SmallRng::from_entropy())
    }

    pub fn reduced_mode(&self) -> bool {
        self.reduced_mode
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bounds(&self) -> Point {
        Point::new(self.width as f32, self.height as f32)
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        id.checked_sub(1).and_then(|idx| self.bubbles.get(idx))
    }

    pub fn get_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        id.checked_sub(1).and_then(|idx| self.bubbles.get_mut(idx))
    }

    fn spawn(&mut self, position: Option<Point>, radius: Option<f32>) -> BubbleId {
        let id = self.bubbles.len() + 1;
        let bounds = self.bounds();
        let bubble = Bubble::spawn(&mut self.rng, id, bounds, position, radius);
        self.bubbles.push(bubble);

        id
    }

    /// Split a bubble into `max(radius / 10, 2)` (rounded up) smaller ones at its
    /// position, then shrink and recolor it. Returns the offspring ids.
    pub fn pop(&mut self, id: BubbleId) -> Result<Vec<BubbleId>, PopError> {
        let (position, radius) = self
            .get(id)
            .map(|b| (b.position, b.radius))
            .ok_or(PopError::UnknownBubble(id))?;

        let pop_count = (radius / 10.0).max(2.0).ceil() as usize;

        let mut offspring = Vec::with_capacity(pop_count);
        for _ in 0..pop_count {
            let size = random_num(&mut self.rng, radius / 4.0, radius / 2.0) as f32;
            offspring.push(self.spawn(Some(position), Some(size)));
        }

        let shrunk = random_num(&mut self.rng, radius / 4.0, radius / 2.0) as f32;
        let color = pick_color(&mut self.rng);

        if let Some(bubble) = self.get_mut(id) {
            bubble.radius = shrunk;
            bubble.color = color;
        }

        debug!(
            "popped bubble {} (r={}) into {} offspring, now r={}",
            id, radius, pop_count, shrunk
        );

        Ok(offspring)
    }

    /// Update every bubble without drawing.
    pub fn step(&mut self) {
        let bounds = self.bounds();

        for bubble in &mut self.bubbles {
            bubble.update(&mut self.rng, bounds);
        }
    }

    /// One animation frame: clear to the background, then update and draw
    /// each bubble in id order.
    pub fn frame<D: Render + ?Sized>(&mut self, surface: &mut D) {
        let bounds = self.bounds();

        surface.fill_rect((0, 0), (self.width, self.height), BACKGROUND.into());

        for bubble in &mut self.bubbles {
            bubble.update(&mut self.rng, bounds);
            bubble.draw(surface);
        }
    }

    /// Apply new viewport metrics. Bubbles keep their positions and drift back
    /// inside on their own.
    pub fn resize<D: Render + ?Sized>(
        &mut self,
        viewport: Viewport,
        surface: &mut D,
    ) -> Result<(), SurfaceError> {
        let (width, height) = viewport.surface_size(self.reduced_mode);

        surface.resize(width, height)?;

        self.width = width;
        self.height = height;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Rect((i32, i32), (u32, u32), Rgba),
        Circle(Vec2, f32),
        Composite(CompositeOp),
        Save,
        Restore,
    }

    struct Recorder {
        width: u32,
        height: u32,
        ops: Vec<Op>,
    }

    impl Recorder {
        fn new((width, height): (u32, u32)) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
            }
        }
    }

    impl Render for Recorder {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
            if width == 0 || height == 0 {
                return Err(SurfaceError::ZeroSized { width, height });
            }
            self.width = width;
            self.height = height;
            Ok(())
        }

        fn fill_rect(&mut self, origin: (i32, i32), size: (u32, u32), color: Rgba) {
            self.ops.push(Op::Rect(origin, size, color));
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, _gradient: &RadialGradient) {
            self.ops.push(Op::Circle(center, radius));
        }

        fn set_composite(&mut self, op: CompositeOp) {
            self.ops.push(Op::Composite(op));
        }

        fn save(&mut self) {
            self.ops.push(Op::Save);
        }

        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(640, 480)
    }

    fn field(seed: u64) -> BubbleField {
        BubbleField::from_seed(false, viewport(), seed).unwrap()
    }

    #[test]
    fn initial_count_depends_on_mode() {
        assert_eq!(field(1).len(), MAX_COUNT);

        let reduced = BubbleField::from_seed(true, viewport(), 1).unwrap();
        assert_eq!(reduced.len(), REDUCED_MAX_COUNT);
        assert!(reduced.reduced_mode());
    }

    #[test]
    fn initial_surface_size() {
        let viewport = viewport().with_content_height(900);

        let full = BubbleField::from_seed(false, viewport, 3).unwrap();
        assert_eq!(full.surface_size(), (640, 950));

        let reduced = BubbleField::from_seed(true, viewport, 3).unwrap();
        assert_eq!(reduced.surface_size(), (640, 480));
    }

    #[test]
    fn zero_sized_viewport_fails_fast() {
        assert!(BubbleField::from_seed(true, Viewport::new(0, 480), 1).is_err());
    }

    #[test]
    fn spawned_bubbles_are_in_range() {
        let field = field(11);

        for bubble in field.bubbles() {
            let pos = bubble.position();
            assert!((0.0..=640.0).contains(&pos.x));
            assert!((0.0..=530.0).contains(&pos.y));
            assert!((MIN_SIZE..=MAX_SIZE).contains(&bubble.radius()));
            assert!((0.5..=1.0).contains(&bubble.speed()));
            assert_eq!(bubble.speed(), bubble.speed_backup());
            assert!(PALETTE.contains(&bubble.color()));
            let (dx, dy) = bubble.direction();
            assert!(dx == 1 || dx == -1);
            assert!(dy == 1 || dy == -1);
            assert_eq!(bubble.flicker(), 0.0);
        }
    }

    #[test]
    fn random_num_bounds() {
        let mut rng = SmallRng::seed_from_u64(5);

        for _ in 0..500 {
            let n = random_num(&mut rng, 1.25, 2.5);
            assert!(n == 1 || n == 2);
        }

        // inverted range clamps instead of panicking
        assert_eq!(random_num(&mut rng, 3.0, 1.0), 3);
        assert_eq!(random_num(&mut rng, 0.25, 0.5), 0);
    }

    #[test]
    fn change_settings_outputs() {
        let mut rng = SmallRng::seed_from_u64(9);

        for _ in 0..1000 {
            assert_eq!(change_settings(&mut rng, -0.5, 0.0, 10.0, 500), 1);
            assert_eq!(change_settings(&mut rng, 10.5, 0.0, 10.0, 500), -1);

            let d = change_settings(&mut rng, 5.0, 0.0, 10.0, 500);
            assert!((-1..=1).contains(&d));

            // draw is always 0 with an empty window
            assert_eq!(change_settings(&mut rng, 5.0, 0.0, 10.0, 0), 0);

            // window of 1 can only force upwards
            let d = change_settings(&mut rng, 5.0, 0.0, 10.0, 1);
            assert!(d == 0 || d == 1);
        }
    }

    #[test]
    fn change_settings_bounds_are_inclusive() {
        let mut rng = SmallRng::seed_from_u64(2);

        let mut seen = [0usize; 3];
        for _ in 0..2000 {
            let d = change_settings(&mut rng, 0.0, 0.0, 10.0, 2);
            seen[(d + 1) as usize] += 1;
        }

        assert!(seen.iter().all(|n| *n > 0));
    }

    #[test]
    fn radius_stays_near_bounds() {
        let mut field = field(42);

        for _ in 0..3000 {
            field.step();

            for bubble in field.bubbles() {
                let r = bubble.radius();
                assert!(r >= MIN_SIZE - 1.0 && r <= MAX_SIZE + 1.0, "radius {}", r);
            }
        }
    }

    #[test]
    fn out_of_bounds_forces_direction() {
        let mut field = field(7);
        let bounds = Point::new(640.0, 530.0);
        let mut rng = SmallRng::seed_from_u64(8);

        let bubble = field.get_mut(1).unwrap();
        *bubble.position_mut() = Point::new(-10.0, 600.0);
        bubble.update(&mut rng, bounds);
        assert_eq!(bubble.direction(), (1, -1));

        *bubble.position_mut() = Point::new(700.0, -3.0);
        bubble.update(&mut rng, bounds);
        assert_eq!(bubble.direction(), (-1, 1));
    }

    #[test]
    fn speed_resets_each_frame() {
        let mut field = field(3);
        let mut rng = SmallRng::seed_from_u64(4);
        let bounds = Point::new(640.0, 530.0);

        let bubble = field.get_mut(2).unwrap();
        *bubble.position_mut() = Point::new(-100.0, -100.0);
        *bubble.speed_mut() = 40.0;

        bubble.update(&mut rng, bounds);

        let step = bubble.speed_backup();
        assert_eq!(bubble.speed(), step);
        assert_eq!(bubble.position(), Point::new(-100.0 + step, -100.0 + step));
    }

    #[test]
    fn pop_large_bubble() {
        let mut field = field(21);
        let before = field.len();

        *field.get_mut(5).unwrap().radius_mut() = 30.0;
        let origin = field.get(5).unwrap().position();

        let offspring = field.pop(5).unwrap();

        assert_eq!(offspring.len(), 3);
        assert_eq!(field.len(), before + 3);
        assert_eq!(offspring, vec![before + 1, before + 2, before + 3]);

        for id in offspring {
            let child = field.get(id).unwrap();
            assert_eq!(child.id(), id);
            assert_eq!(child.position(), origin);
            assert!((7.0..=15.0).contains(&child.radius()));
        }

        let parent = field.get(5).unwrap();
        assert!((7.0..=15.0).contains(&parent.radius()));
        assert!(PALETTE.contains(&parent.color()));
    }

    #[test]
    fn pop_small_bubble_has_two_offspring() {
        let mut field = field(22);
        let before = field.len();

        *field.get_mut(1).unwrap().radius_mut() = 5.0;
        let offspring = field.pop(1).unwrap();

        assert_eq!(offspring.len(), 2);
        assert_eq!(field.len(), before + 2);

        for id in offspring {
            assert!((1.0..=2.0).contains(&field.get(id).unwrap().radius()));
        }
        assert!((1.0..=2.0).contains(&field.get(1).unwrap().radius()));
    }

    #[test]
    fn pop_tiny_bubble_clamps() {
        let mut field = field(23);

        *field.get_mut(1).unwrap().radius_mut() = 0.0;
        let offspring = field.pop(1).unwrap();

        assert_eq!(offspring.len(), 2);
        assert_eq!(field.get(1).unwrap().radius(), 0.0);
    }

    #[test]
    fn pop_unknown_bubble() {
        let mut field = field(24);

        assert_eq!(field.pop(0), Err(PopError::UnknownBubble(0)));
        assert_eq!(field.pop(76), Err(PopError::UnknownBubble(76)));
        assert_eq!(field.len(), MAX_COUNT);
    }

    #[test]
    fn ids_have_no_gaps_after_pops() {
        let mut field = field(31);

        for id in [1, 10, 75, 76, 80, 3, 90] {
            if field.get(id).is_some() {
                field.pop(id).unwrap();
            }
        }

        let ids: Vec<BubbleId> = field.bubbles().iter().map(Bubble::id).collect();
        let expected: Vec<BubbleId> = (1..=field.len()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn frame_clears_then_draws_in_order() {
        let mut field = BubbleField::from_seed(true, viewport(), 12).unwrap();
        let mut surface = Recorder::new(field.surface_size());

        field.frame(&mut surface);

        assert_eq!(
            surface.ops[0],
            Op::Rect((0, 0), (640, 480), BACKGROUND.into())
        );

        let per_bubble: Vec<&[Op]> = surface.ops[1..].chunks(4).collect();
        assert_eq!(per_bubble.len(), field.len());

        for (ops, bubble) in per_bubble.iter().zip(field.bubbles()) {
            assert_eq!(
                *ops,
                &[
                    Op::Save,
                    Op::Composite(CompositeOp::ColorDodge),
                    Op::Circle(bubble.position(), bubble.radius()),
                    Op::Restore,
                ][..]
            );
        }
    }

    #[test]
    fn popped_bubble_keeps_drawing() {
        let mut field = BubbleField::from_seed(true, viewport(), 13).unwrap();
        field.pop(4).unwrap();

        let mut surface = Recorder::new(field.surface_size());
        field.frame(&mut surface);

        let circles = surface
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Circle(..)))
            .count();
        assert_eq!(circles, field.len());
    }

    #[test]
    fn gradient_uses_palette_entry() {
        let field = field(14);
        let bubble = field.get(1).unwrap();
        let gradient = bubble.gradient();

        let stops = gradient.stops();
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0].color, bubble.color().color1.into());
        assert_eq!(stops[1].offset, 0.5);
        assert_eq!(stops[1].color, bubble.color().color2.into());
        assert_eq!(stops[2].color.a, 0.0);
        assert_eq!(gradient.radius(), bubble.radius());
    }

    #[test]
    fn resize_keeps_bubbles_in_place() {
        let mut field = field(15);
        let mut surface = Recorder::new(field.surface_size());
        let before: Vec<Point> = field.bubbles().iter().map(Bubble::position).collect();

        field
            .resize(Viewport::new(320, 200).with_content_height(250), &mut surface)
            .unwrap();

        assert_eq!(field.surface_size(), (320, 300));
        assert_eq!((surface.width, surface.height), (320, 300));

        let after: Vec<Point> = field.bubbles().iter().map(Bubble::position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn failed_resize_keeps_extents() {
        let mut field = field(16);
        let mut surface = Recorder::new(field.surface_size());

        assert!(field.resize(Viewport::new(0, 0), &mut surface).is_err());
        assert_eq!(field.surface_size(), (640, 530));
    }

    #[test]
    fn seeded_fields_are_reproducible() {
        let mut a = field(99);
        let mut b = field(99);

        for _ in 0..50 {
            a.step();
            b.step();
        }

        let pos = |f: &BubbleField| f.bubbles().iter().map(Bubble::position).collect::<Vec<_>>();
        assert_eq!(pos(&a), pos(&b));
    }
}
