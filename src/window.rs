// MIT License

// Copyright (c) 2022 AnonmousDapper

use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

use crate::resize::Viewport;

const WIDTH: f64 = crate::WINDOW_WIDTH as f64;
const HEIGHT: f64 = crate::WINDOW_HEIGHT as f64;

const MIN_WIDTH: f64 = crate::MIN_WINDOW_WIDTH as f64;
const MIN_HEIGHT: f64 = crate::MIN_WINDOW_HEIGHT as f64;

/// Viewport metrics for a window's physical size. A native window has no
/// scrolling document, so the content is exactly as tall as the window.
pub fn viewport_of(size: PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width, size.height)
}

pub fn create_window(
    title: &str,
    event_loop: &EventLoop<()>,
) -> Result<(Window, Viewport), winit::error::OsError> {
    let window = WindowBuilder::new()
        .with_visible(false)
        .with_title(title)
        .build(event_loop)?;

    let hidpi = window.scale_factor();

    let (display_width, display_height) = {
        if let Some(display) = window.current_monitor() {
            let size = display.size().to_logical(hidpi);
            (size.width, size.height)
        } else {
            (WIDTH, HEIGHT)
        }
    };

    let default = LogicalSize::new(
        WIDTH.min(display_width).max(MIN_WIDTH),
        HEIGHT.min(display_height).max(MIN_HEIGHT),
    );
    let min_size = LogicalSize::new(MIN_WIDTH, MIN_HEIGHT);

    window.set_inner_size(default);
    window.set_min_inner_size(Some(min_size));
    window.set_visible(true);

    let size = default.to_physical::<u32>(hidpi);

    Ok((window, viewport_of(size)))
}
