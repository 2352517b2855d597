// MIT License

// Copyright (c) 2022 AnonmousDapper

use std::time::{Duration, Instant};

/// Quiet window after the last resize notification before it is applied.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Extra rows below the content so bubbles can drift past the bottom edge.
pub const CONTENT_PADDING: u32 = 50;

/// Host viewport metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Height of the visible content, which may exceed the viewport.
    pub content_height: u32,
}

impl Viewport {
    /// Viewport whose content exactly fills it.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            content_height: height,
        }
    }

    pub fn with_content_height(mut self, content_height: u32) -> Self {
        self.content_height = content_height;
        self
    }

    /// Size of the drawing surface for this viewport.
    pub fn surface_size(&self, reduced_mode: bool) -> (u32, u32) {
        (self.width, surface_height(self, reduced_mode))
    }
}

pub fn surface_height(viewport: &Viewport, reduced_mode: bool) -> u32 {
    if reduced_mode {
        viewport.height
    } else {
        viewport.content_height.saturating_add(CONTENT_PADDING)
    }
}

/// Cancel-and-restart timer: every notification replaces the pending value
/// and pushes its deadline back to `now + delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn notify(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    /// Take the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(self.pending, Some((deadline, _)) if now >= deadline);

        if ready {
            self.cancel()
        } else {
            None
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}
