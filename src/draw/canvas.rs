use crate::draw::model::{Color, MAX_STROKE_WIDTH};
use crate::draw::raster::{draw_segment, DirtyRect};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageOutputFormat, RgbaImage};
use std::io::Cursor;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Fixed-size RGBA surface the user draws on.
///
/// Strokes are only ever stored as pixels. A cleared canvas is fully
/// transparent; the GUI paints it over a black background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    revision: u64,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
            revision: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rgba_pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bumped on every mutation so the GUI only re-uploads its texture
    /// when something changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.revision = self.revision.wrapping_add(1);
    }

    /// Rasterize one segment and report the area it may have changed.
    /// Widths are clamped to `1..=MAX_STROKE_WIDTH`.
    pub fn stroke_segment(
        &mut self,
        start: (i32, i32),
        end: (i32, i32),
        color: Color,
        stroke_width: u32,
    ) -> Option<DirtyRect> {
        let stroke_width = stroke_width.clamp(1, MAX_STROKE_WIDTH);
        let written = draw_segment(
            start,
            end,
            color,
            stroke_width,
            &mut self.pixels,
            self.width,
            self.height,
        );
        if written == 0 {
            return None;
        }
        self.revision = self.revision.wrapping_add(1);
        DirtyRect::around_segment(start, end, stroke_width, self.width, self.height)
    }

    /// Copy out the RGBA rows covered by `rect`, for partial texture
    /// uploads.
    pub fn region_rgba(&self, rect: DirtyRect) -> Vec<u8> {
        let row_len = rect.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = (y as usize * self.width as usize + rect.x as usize) * 4;
            out.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        out
    }

    /// Fill an inclusive rectangle. Used by tests and benches to lay down
    /// ink with exact extents.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Color) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x1 = x1.min(self.width.saturating_sub(1));
        let y1 = y1.min(self.height.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = ((y * self.width + x) * 4) as usize;
                self.pixels[idx..idx + 4].copy_from_slice(&color.to_rgba_array());
            }
        }
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let image = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("canvas buffer does not match its dimensions")?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageOutputFormat::Png)
            .context("encode canvas as png")?;
        Ok(out.into_inner())
    }

    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }
}
