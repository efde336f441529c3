//! Drawing interface for visualizing simulations.
//!
//! The simulation core only talks to the [`Renderer`] trait. Coordinates are
//! in world space (metres): x is zero at the window centre, y is zero at the
//! bottom edge and grows upward, and the world-to-screen scale is fixed at
//! construction. Colors are RGB in `[0, 1]`.
//!
//! [`RasterRenderer`] is a windowless CPU backend drawing into an RGB
//! framebuffer; [`NullRenderer`] discards everything and is used when a real
//! backend cannot be constructed.

mod raster;

use std::path::Path;

pub use raster::RasterRenderer;

pub trait Renderer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn scale(&self) -> f32;

    fn clear(&mut self);
    fn present(&mut self);
    /// Polls windowing events; `false` means the user requested quitting.
    fn process_events(&mut self) -> bool;

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, r: f32, g: f32, b: f32);
    #[allow(clippy::too_many_arguments)]
    fn draw_box(&mut self, x: f32, y: f32, w: f32, h: f32, rotation: f32, r: f32, g: f32, b: f32);
    #[allow(clippy::too_many_arguments)]
    fn draw_box_filled(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        rotation: f32,
        r: f32,
        g: f32,
        b: f32,
    );
    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32, r: f32, g: f32, b: f32);
    fn draw_circle_filled(&mut self, cx: f32, cy: f32, radius: f32, r: f32, g: f32, b: f32);
    #[allow(clippy::too_many_arguments)]
    fn draw_triangle(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        r: f32,
        g: f32,
        b: f32,
    );
    #[allow(clippy::too_many_arguments)]
    fn draw_triangle_filled(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        r: f32,
        g: f32,
        b: f32,
    );

    /// Draws text at screen pixel coordinates. Backends without font support
    /// ignore it.
    fn draw_text(&mut self, text: &str, px: i32, py: i32, r: f32, g: f32, b: f32) {
        let _ = (text, px, py, r, g, b);
    }

    /// Writes the current frame to disk. Backends without a readable
    /// framebuffer ignore it.
    ///
    /// # Errors
    /// Backend-specific encoding or I/O failures.
    fn save_frame(&self, path: &Path) -> anyhow::Result<()> {
        let _ = path;
        Ok(())
    }
}

/// Renderer that draws nothing and never requests quitting.
pub struct NullRenderer {
    width: u32,
    height: u32,
    scale: f32,
}

impl NullRenderer {
    #[must_use]
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }
}

impl Renderer for NullRenderer {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn scale(&self) -> f32 {
        self.scale
    }
    fn clear(&mut self) {}
    fn present(&mut self) {}
    fn process_events(&mut self) -> bool {
        true
    }
    fn draw_line(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn draw_box(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn draw_box_filled(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn draw_circle(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn draw_circle_filled(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
    fn draw_triangle(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
    }
    fn draw_triangle_filled(
        &mut self,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
        _: f32,
    ) {
    }
}
