// MIT License

// Copyright (c) 2022 AnonmousDapper

#![deny(rust_2018_idioms)]

use std::time::Instant;

use pixels::{PixelsBuilder, SurfaceTexture};

use winit::{
    event::{Event, VirtualKeyCode},
    event_loop::{ControlFlow, EventLoop},
};

use winit_input_helper::WinitInputHelper;

use log::{debug, error, info, warn};

use neon_bubbles::canvas::{Canvas, Render};
use neon_bubbles::environment::Settings;
use neon_bubbles::resize::{Debouncer, Viewport};
use neon_bubbles::simulation::BubbleField;

fn load_settings() -> Settings {
    match std::env::args().nth(1) {
        Some(path) => Settings::load(&path).unwrap_or_else(|e| {
            warn!("ignoring settings file {}: {}", path, e);
            Settings::default()
        }),
        None => Settings::default(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = load_settings();
    let reduced_mode = settings.reduced_mode();

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let (window, viewport) = neon_bubbles::window::create_window("Neon Bubbles", &event_loop)?;

    let mut field = match settings.seed {
        Some(seed) => BubbleField::from_seed(reduced_mode, viewport, seed)?,
        None => BubbleField::from_entropy(reduced_mode, viewport)?,
    };

    let (width, height) = field.surface_size();
    let mut canvas = Canvas::new(width, height)?;

    info!(
        "spawned {} bubbles on a {}x{} surface (reduced mode: {})",
        field.len(),
        width,
        height,
        reduced_mode
    );

    // the presenter shows the top of the surface, one viewport high
    let mut pixels = {
        let surtex = SurfaceTexture::new(viewport.width, viewport.height, &window);
        PixelsBuilder::new(width, viewport.height, surtex)
            .texture_format(neon_bubbles::PIPELINE_TEXTURE_FORMAT)
            .enable_vsync(true)
            .build()?
    };

    let mut resizes: Debouncer<Viewport> = Debouncer::default();

    event_loop.run(move |evt, _, flow| {
        if let Event::RedrawRequested(_) = evt {
            field.frame(&mut canvas);
            canvas.render_to(pixels.get_frame_mut());

            if pixels
                .render()
                .map_err(|e| error!("pixels render failed: {}", e))
                .is_err()
            {
                *flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&evt) {
            if input.key_pressed(VirtualKeyCode::Escape) || input.quit() {
                *flow = ControlFlow::Exit;
                return;
            }

            // zero-sized while minimized
            if let Some(size) = input.window_resized().filter(|s| s.width > 0 && s.height > 0) {
                if let Err(e) = pixels.resize_surface(size.width, size.height) {
                    error!("pixels surface resize failed: {}", e);
                    *flow = ControlFlow::Exit;
                    return;
                }

                debug!("resize to {}x{} pending", size.width, size.height);
                resizes.notify(Instant::now(), neon_bubbles::window::viewport_of(size));
            }

            if let Some(viewport) = resizes.poll(Instant::now()) {
                let applied = field
                    .resize(viewport, &mut canvas)
                    .map_err(|e| e.to_string())
                    .and_then(|()| {
                        pixels
                            .resize_buffer(canvas.width(), viewport.height)
                            .map_err(|e| e.to_string())
                    });

                match applied {
                    Ok(()) => info!(
                        "surface resized to {}x{}",
                        canvas.width(),
                        canvas.height()
                    ),
                    Err(e) => {
                        error!("resize failed: {}", e);
                        *flow = ControlFlow::Exit;
                        return;
                    }
                }
            }

            window.request_redraw();
        }
    });
}
