// MIT License

// Copyright (c) 2022 AnonmousDapper

#![deny(rust_2018_idioms)]

//! Neon bubbles: an animated background of drifting, color-dodged bubbles.

pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;

pub const MIN_WINDOW_WIDTH: u32 = 320;
pub const MIN_WINDOW_HEIGHT: u32 = 240;

pub const PIPELINE_TEXTURE_FORMAT: pixels::wgpu::TextureFormat =
    pixels::wgpu::TextureFormat::Rgba16Float;

pub mod canvas;

pub mod color;

pub mod environment;

pub mod resize;

pub mod window;

pub mod simulation;
