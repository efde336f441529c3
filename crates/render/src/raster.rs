//! CPU framebuffer backend.

use anyhow::{ensure, Context, Result};
use std::path::Path;

use crate::Renderer;

const BACKGROUND: [u8; 3] = [26, 26, 38];
const CIRCLE_SEGMENTS: u32 = 32;

/// Windowless renderer drawing into an RGB framebuffer.
///
/// Pixels are stored row-major from the top-left; world y grows upward, so
/// the vertical axis is flipped when mapping to screen.
pub struct RasterRenderer {
    width: u32,
    height: u32,
    scale: f32,
    frame: Vec<u8>,
}

impl RasterRenderer {
    /// # Errors
    /// If the window dimensions or scale are not positive.
    pub fn new(width: u32, height: u32, scale: f32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "window dimensions must be nonzero");
        ensure!(scale > 0.0, "world-to-screen scale must be positive");
        let mut renderer = Self {
            width,
            height,
            scale,
            frame: vec![0; (width * height * 3) as usize],
        };
        renderer.clear();
        Ok(renderer)
    }

    fn to_screen(&self, x: f32, y: f32) -> (i64, i64) {
        let px = f64::from(self.width) / 2.0 + f64::from(x) * f64::from(self.scale);
        let py = f64::from(self.height - 1) - f64::from(y) * f64::from(self.scale);
        (px.round() as i64, py.round() as i64)
    }

    fn put(&mut self, px: i64, py: i64, color: [u8; 3]) {
        if px < 0 || py < 0 || px >= i64::from(self.width) || py >= i64::from(self.height) {
            return;
        }
        let idx = ((py as u32 * self.width + px as u32) * 3) as usize;
        self.frame[idx..idx + 3].copy_from_slice(&color);
    }

    /// Pixel color at screen coordinates, for inspection.
    #[must_use]
    pub fn pixel(&self, px: u32, py: u32) -> [u8; 3] {
        let idx = ((py * self.width + px) * 3) as usize;
        [self.frame[idx], self.frame[idx + 1], self.frame[idx + 2]]
    }

    fn line_px(&mut self, mut x0: i64, mut y0: i64, x1: i64, y1: i64, color: [u8; 3]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn box_corners(&self, x: f32, y: f32, w: f32, h: f32, rotation: f32) -> [(f32, f32); 4] {
        let (hw, hh) = (w / 2.0, h / 2.0);
        let (sin_r, cos_r) = rotation.sin_cos();
        let local = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)];
        local.map(|(lx, ly)| (x + lx * cos_r - ly * sin_r, y + lx * sin_r + ly * cos_r))
    }
}

fn color_bytes(r: f32, g: f32, b: f32) -> [u8; 3] {
    [
        (r.clamp(0.0, 1.0) * 255.0) as u8,
        (g.clamp(0.0, 1.0) * 255.0) as u8,
        (b.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

fn edge(ax: i64, ay: i64, bx: i64, by: i64, px: i64, py: i64) -> i64 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

impl Renderer for RasterRenderer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn clear(&mut self) {
        for chunk in self.frame.chunks_exact_mut(3) {
            chunk.copy_from_slice(&BACKGROUND);
        }
    }

    fn present(&mut self) {}

    fn process_events(&mut self) -> bool {
        true
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, r: f32, g: f32, b: f32) {
        let (px0, py0) = self.to_screen(x1, y1);
        let (px1, py1) = self.to_screen(x2, y2);
        self.line_px(px0, py0, px1, py1, color_bytes(r, g, b));
    }

    fn draw_box(&mut self, x: f32, y: f32, w: f32, h: f32, rotation: f32, r: f32, g: f32, b: f32) {
        let corners = self.box_corners(x, y, w, h, rotation);
        for i in 0..4 {
            let (x1, y1) = corners[i];
            let (x2, y2) = corners[(i + 1) % 4];
            self.draw_line(x1, y1, x2, y2, r, g, b);
        }
    }

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
    ) {
        let c = self.box_corners(x, y, w, h, rotation);
        self.draw_triangle_filled(c[0].0, c[0].1, c[1].0, c[1].1, c[2].0, c[2].1, r, g, b);
        self.draw_triangle_filled(c[0].0, c[0].1, c[2].0, c[2].1, c[3].0, c[3].1, r, g, b);
    }

    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32, r: f32, g: f32, b: f32) {
        let step = 2.0 * std::f32::consts::PI / CIRCLE_SEGMENTS as f32;
        for i in 0..CIRCLE_SEGMENTS {
            let a0 = step * i as f32;
            let a1 = step * (i + 1) as f32;
            self.draw_line(
                cx + radius * a0.cos(),
                cy + radius * a0.sin(),
                cx + radius * a1.cos(),
                cy + radius * a1.sin(),
                r,
                g,
                b,
            );
        }
    }

    fn draw_circle_filled(&mut self, cx: f32, cy: f32, radius: f32, r: f32, g: f32, b: f32) {
        let color = color_bytes(r, g, b);
        let (pcx, pcy) = self.to_screen(cx, cy);
        let pr = (radius * self.scale).ceil() as i64;
        for py in (pcy - pr)..=(pcy + pr) {
            for px in (pcx - pr)..=(pcx + pr) {
                let (dx, dy) = (px - pcx, py - pcy);
                if dx * dx + dy * dy <= pr * pr {
                    self.put(px, py, color);
                }
            }
        }
    }

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
    ) {
        self.draw_line(x1, y1, x2, y2, r, g, b);
        self.draw_line(x2, y2, x3, y3, r, g, b);
        self.draw_line(x3, y3, x1, y1, r, g, b);
    }

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
    ) {
        let color = color_bytes(r, g, b);
        let (ax, ay) = self.to_screen(x1, y1);
        let (bx, by) = self.to_screen(x2, y2);
        let (cx, cy) = self.to_screen(x3, y3);
        let min_x = ax.min(bx).min(cx);
        let max_x = ax.max(bx).max(cx);
        let min_y = ay.min(by).min(cy);
        let max_y = ay.max(by).max(cy);
        let area = edge(ax, ay, bx, by, cx, cy);
        if area == 0 {
            self.line_px(ax, ay, bx, by, color);
            return;
        }
        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let w0 = edge(ax, ay, bx, by, px, py);
                let w1 = edge(bx, by, cx, cy, px, py);
                let w2 = edge(cx, cy, ax, ay, px, py);
                let inside = if area > 0 {
                    w0 >= 0 && w1 >= 0 && w2 >= 0
                } else {
                    w0 <= 0 && w1 <= 0 && w2 <= 0
                };
                if inside {
                    self.put(px, py, color);
                }
            }
        }
    }

    fn save_frame(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let img = image::RgbImage::from_raw(self.width, self.height, self.frame.clone())
            .context("framebuffer size mismatch")?;
        img.save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
