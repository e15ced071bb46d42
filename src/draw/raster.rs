use crate::draw::model::Color;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Stroke widths at or above this use the cached row mask instead of
/// testing every pixel of the brush square.
const MASK_CACHE_MIN_WIDTH: u32 = 4;

/// Canvas pixels a stroke segment may have touched, already clipped to the
/// canvas. `x + width` and `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    /// Everything a brush of `stroke_width` can reach while walking from
    /// `start` to `end`, clipped to a `canvas_width` x `canvas_height`
    /// surface. `None` when none of it lands on the canvas.
    pub fn around_segment(
        start: (i32, i32),
        end: (i32, i32),
        stroke_width: u32,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Option<Self> {
        let reach = i64::from(stroke_width.saturating_sub(1) / 2);
        let (sx, sy) = (i64::from(start.0), i64::from(start.1));
        let (ex, ey) = (i64::from(end.0), i64::from(end.1));
        let left = (sx.min(ex) - reach).max(0);
        let top = (sy.min(ey) - reach).max(0);
        let right = (sx.max(ex) + reach + 1).min(i64::from(canvas_width));
        let bottom = (sy.max(ey) + reach + 1).min(i64::from(canvas_height));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}

/// Stamp a round brush along the Bresenham walk from `start` to `end`.
///
/// Returns the number of pixel writes, which is mostly useful for tests.
pub fn draw_segment(
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    stroke_width: u32,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) -> u64 {
    let use_mask_cache = stroke_width >= MASK_CACHE_MIN_WIDTH;
    let mut x0 = start.0;
    let mut y0 = start.1;
    let x1 = end.0;
    let y1 = end.1;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut operations: u64 = 0;

    loop {
        operations = operations.saturating_add(draw_brush(
            (x0, y0),
            color,
            stroke_width,
            use_mask_cache,
            pixels,
            width,
            height,
        ));
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
    operations
}

pub fn draw_brush(
    center: (i32, i32),
    color: Color,
    stroke_width: u32,
    use_mask_cache: bool,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) -> u64 {
    if use_mask_cache {
        return draw_brush_mask(center, color, stroke_width, pixels, width, height);
    }
    let radius = (stroke_width.saturating_sub(1) / 2) as i32;
    let mut writes: u64 = 0;
    for y in (center.1 - radius)..=(center.1 + radius) {
        for x in (center.0 - radius)..=(center.0 + radius) {
            let dx = x - center.0;
            let dy = y - center.1;
            // Corners are included so a width-3 brush gives a 3x3 square
            // rather than a plus sign.
            if dx * dx + dy * dy <= radius * radius + radius
                && set_pixel_rgba(pixels, width, height, x, y, color)
            {
                writes = writes.saturating_add(1);
            }
        }
    }
    writes
}

#[derive(Clone)]
struct BrushMask {
    rows: Vec<BrushMaskRow>,
}

#[derive(Clone)]
struct BrushMaskRow {
    dy: i32,
    min_dx: i32,
    max_dx: i32,
}

fn brush_mask_cache() -> &'static Mutex<HashMap<u32, BrushMask>> {
    static CACHE: OnceLock<Mutex<HashMap<u32, BrushMask>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn get_brush_mask(stroke_width: u32) -> BrushMask {
    let cache = brush_mask_cache();
    if let Ok(guard) = cache.lock() {
        if let Some(mask) = guard.get(&stroke_width) {
            return mask.clone();
        }
    }

    let radius = (stroke_width.saturating_sub(1) / 2) as i32;
    let mut rows = Vec::with_capacity((radius.saturating_mul(2) + 1) as usize);
    for dy in -radius..=radius {
        let mut max_dx = radius;
        while max_dx >= 0 && max_dx * max_dx + dy * dy > radius * radius {
            max_dx -= 1;
        }
        if max_dx >= 0 {
            rows.push(BrushMaskRow {
                dy,
                min_dx: -max_dx,
                max_dx,
            });
        }
    }
    let mask = BrushMask { rows };
    if let Ok(mut guard) = cache.lock() {
        let _ = guard.insert(stroke_width, mask.clone());
    }
    mask
}

fn draw_brush_mask(
    center: (i32, i32),
    color: Color,
    stroke_width: u32,
    pixels: &mut [u8],
    width: u32,
    height: u32,
) -> u64 {
    if width == 0 || height == 0 {
        return 0;
    }
    let mask = get_brush_mask(stroke_width);
    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;

    let mut writes: u64 = 0;
    for row in &mask.rows {
        let y = center.1 + row.dy;
        if y < 0 || y > max_y {
            continue;
        }
        let x0 = (center.0 + row.min_dx).max(0);
        let x1 = (center.0 + row.max_dx).min(max_x);
        if x0 > x1 {
            continue;
        }
        let row_base = ((y as u32 * width) * 4) as usize;
        for x in x0..=x1 {
            let idx = row_base + (x as usize * 4);
            pixels[idx..idx + 4].copy_from_slice(&color.to_rgba_array());
            writes = writes.saturating_add(1);
        }
    }
    writes
}

fn set_pixel_rgba(pixels: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Color) -> bool {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return false;
    }

    let idx = ((y as u32 * width + x as u32) * 4) as usize;
    if idx + 3 >= pixels.len() {
        return false;
    }

    pixels[idx..idx + 4].copy_from_slice(&color.to_rgba_array());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    fn alpha_at(pixels: &[u8], width: u32, x: u32, y: u32) -> u8 {
        pixels[((y * width + x) * 4 + 3) as usize]
    }

    #[test]
    fn width_three_brush_covers_three_by_three_block() {
        let mut pixels = blank(8, 8);
        let writes = draw_brush((4, 4), Color::WHITE, 3, false, &mut pixels, 8, 8);
        assert_eq!(writes, 9);
        for y in 3..=5 {
            for x in 3..=5 {
                assert_eq!(alpha_at(&pixels, 8, x, y), 255);
            }
        }
        assert_eq!(alpha_at(&pixels, 8, 2, 4), 0);
    }

    #[test]
    fn horizontal_segment_paints_every_column_between_endpoints() {
        let mut pixels = blank(32, 8);
        draw_segment((2, 4), (20, 4), Color::WHITE, 1, &mut pixels, 32, 8);
        for x in 2..=20 {
            assert_eq!(alpha_at(&pixels, 32, x, 4), 255, "column {x}");
        }
        assert_eq!(alpha_at(&pixels, 32, 21, 4), 0);
        assert_eq!(alpha_at(&pixels, 32, 10, 3), 0);
    }

    #[test]
    fn segment_outside_buffer_is_clipped_without_panicking() {
        let mut pixels = blank(4, 4);
        let writes = draw_segment((-10, -10), (10, 10), Color::WHITE, 6, &mut pixels, 4, 4);
        assert!(writes > 0);
        assert_eq!(pixels.len(), 64);
    }

    #[test]
    fn wide_brush_uses_round_mask() {
        let mut pixels = blank(16, 16);
        draw_brush((8, 8), Color::WHITE, 9, true, &mut pixels, 16, 16);
        assert_eq!(alpha_at(&pixels, 16, 8, 4), 255);
        assert_eq!(alpha_at(&pixels, 16, 4, 4), 0);
    }

    #[test]
    fn dirty_rect_covers_brush_reach_and_clips() {
        let rect = DirtyRect::around_segment((10, 5), (4, 8), 3, 32, 32).unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (3, 4, 9, 6));
        assert!(rect.contains(3, 4));
        assert!(rect.contains(11, 9));
        assert!(!rect.contains(12, 9));
        assert!(!rect.contains(11, 10));

        let clipped = DirtyRect::around_segment((0, 0), (1, 1), 5, 4, 4).unwrap();
        assert_eq!((clipped.x, clipped.y, clipped.width, clipped.height), (0, 0, 4, 4));
        assert_eq!(DirtyRect::around_segment((10, 10), (12, 12), 3, 4, 4), None);
    }

    #[test]
    fn dirty_rect_holds_every_written_pixel() {
        let mut pixels = blank(40, 40);
        draw_segment((5, 30), (33, 12), Color::WHITE, 9, &mut pixels, 40, 40);
        let rect = DirtyRect::around_segment((5, 30), (33, 12), 9, 40, 40).unwrap();
        for y in 0..40 {
            for x in 0..40 {
                if alpha_at(&pixels, 40, x, y) > 0 {
                    assert!(rect.contains(x, y), "({x}, {y}) outside {rect:?}");
                }
            }
        }
    }
}
