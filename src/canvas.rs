use anyhow::Context;
use cgmath::Point2;
use log::info;

use crate::camera::WorldRect;
use crate::texture::{Texture, TextureRegion};
use crate::viewport::Projection;

pub type Color = [u8; 4];

pub fn color_from_f32(color: [f32; 4]) -> Color {
    let c = |v: f32| (v.max(0.0).min(1.0) * 255.0).round() as u8;
    [c(color[0]), c(color[1]), c(color[2]), c(color[3])]
}

// The drawing surface a screen renders into. Destinations are in world units and are placed
// with the current projection.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: [f32; 4]);
    fn set_projection(&mut self, projection: Projection);
    fn draw_region(&mut self, texture: &Texture, region: TextureRegion, dest: WorldRect);
    fn fill_rect(&mut self, dest: WorldRect, color: Color);
}

// Software canvas backed by an RGBA image.
pub struct FrameCanvas {
    image: image::RgbaImage,
    projection: Projection,
}

// A destination rectangle resolved to pixels.
struct PixelSpan {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    columns: std::ops::Range<u32>,
    rows: std::ops::Range<u32>,
}

impl PixelSpan {
    // Pixels whose centers fall inside [start, end), clipped to [lo, hi).
    fn covered(start: f32, end: f32, lo: i64, hi: i64) -> std::ops::Range<u32> {
        let first = ((start - 0.5).ceil() as i64).max(lo).max(0);
        let last = ((end - 0.5).ceil() as i64).min(hi).max(first);
        first as u32..last as u32
    }

    // The fractional position of a pixel center inside the span, in [0, 1).
    fn u(&self, column: u32) -> f32 {
        (column as f32 + 0.5 - self.left) / self.width
    }

    fn v(&self, row: u32) -> f32 {
        (row as f32 + 0.5 - self.top) / self.height
    }
}

fn blend(dst: &mut image::Rgba<u8>, src: Color) {
    let alpha = src[3] as u32;
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        dst.0 = src;
        return;
    }
    let inverse = 255 - alpha;
    for i in 0..3 {
        dst.0[i] = ((src[i] as u32 * alpha + dst.0[i] as u32 * inverse) / 255) as u8;
    }
    dst.0[3] = (alpha + dst.0[3] as u32 * inverse / 255) as u8;
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        FrameCanvas {
            image: image::RgbaImage::new(width, height),
            projection: Projection::pixels(width, height),
        }
    }

    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.image.get_pixel(x, y).0
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("Failed to write frame to {}", path))?;
        info!("Saved frame to {}", path);
        Ok(())
    }

    fn span(&self, dest: WorldRect) -> Option<PixelSpan> {
        let top_left = self
            .projection
            .world_to_screen(Point2::new(dest.x, dest.top()));
        let bottom_right = self
            .projection
            .world_to_screen(Point2::new(dest.right(), dest.y));
        let width = bottom_right.x - top_left.x;
        let height = bottom_right.y - top_left.y;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let screen = self.projection.screen;
        let clip_right = (screen.x as i64 + screen.width as i64).min(self.image.width() as i64);
        let clip_bottom = (screen.y as i64 + screen.height as i64).min(self.image.height() as i64);
        Some(PixelSpan {
            left: top_left.x,
            top: top_left.y,
            width,
            height,
            columns: PixelSpan::covered(top_left.x, bottom_right.x, screen.x as i64, clip_right),
            rows: PixelSpan::covered(top_left.y, bottom_right.y, screen.y as i64, clip_bottom),
        })
    }
}

impl Canvas for FrameCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = image::RgbaImage::new(width, height);
            self.projection = Projection::pixels(width, height);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        let color = image::Rgba(color_from_f32(color));
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    fn draw_region(&mut self, texture: &Texture, region: TextureRegion, dest: WorldRect) {
        if region.width == 0 || region.height == 0 {
            return;
        }
        let span = match self.span(dest) {
            Some(span) => span,
            None => return,
        };
        for row in span.rows.clone() {
            let v = span.v(row);
            let src_y = region.y + ((v * region.height as f32) as u32).min(region.height - 1);
            for column in span.columns.clone() {
                let u = span.u(column);
                let src_x = region.x + ((u * region.width as f32) as u32).min(region.width - 1);
                if src_x >= texture.width() || src_y >= texture.height() {
                    continue;
                }
                let src = texture.sample(src_x, src_y).0;
                blend(self.image.get_pixel_mut(column, row), src);
            }
        }
    }

    fn fill_rect(&mut self, dest: WorldRect, color: Color) {
        let span = match self.span(dest) {
            Some(span) => span,
            None => return,
        };
        for row in span.rows.clone() {
            for column in span.columns.clone() {
                blend(self.image.get_pixel_mut(column, row), color);
            }
        }
    }
}
