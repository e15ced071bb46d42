use crate::draw::canvas::PixelCanvas;

/// Tight rectangle around every ink pixel, inclusive on both ends.
///
/// For a canvas without ink the scan leaves the seed values untouched:
/// `min` at the canvas extent and `max` at zero. That inverted rectangle is
/// returned as-is; callers that care check [`InkBounds::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl InkBounds {
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x as f32 + self.max_x as f32) / 2.0,
            (self.min_y as f32 + self.max_y as f32) / 2.0,
        )
    }
}

/// Full scan of the alpha channel. A pixel counts as ink when alpha is
/// non-zero.
pub fn ink_bounds(canvas: &PixelCanvas) -> InkBounds {
    let (width, height) = canvas.size();
    let mut bounds = InkBounds {
        min_x: width,
        min_y: height,
        max_x: 0,
        max_y: 0,
    };
    if width == 0 {
        return bounds;
    }

    for (y, row) in canvas
        .rgba_pixels()
        .chunks_exact(width as usize * 4)
        .enumerate()
    {
        let y = y as u32;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] > 0 {
                let x = x as u32;
                bounds.min_x = bounds.min_x.min(x);
                bounds.min_y = bounds.min_y.min(y);
                bounds.max_x = bounds.max_x.max(x);
                bounds.max_y = bounds.max_y.max(y);
            }
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Color;

    #[test]
    fn exact_rectangle_for_filled_block() {
        let mut canvas = PixelCanvas::new(40, 30);
        canvas.fill_rect(5, 7, 12, 20, Color::WHITE);
        assert_eq!(
            ink_bounds(&canvas),
            InkBounds {
                min_x: 5,
                min_y: 7,
                max_x: 12,
                max_y: 20,
            }
        );
    }

    #[test]
    fn blank_canvas_returns_inverted_seed() {
        let canvas = PixelCanvas::new(40, 30);
        let bounds = ink_bounds(&canvas);
        assert_eq!(
            bounds,
            InkBounds {
                min_x: 40,
                min_y: 30,
                max_x: 0,
                max_y: 0,
            }
        );
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), (20.0, 15.0));
    }

    #[test]
    fn scattered_pixels_span_their_extremes() {
        let mut canvas = PixelCanvas::new(16, 16);
        canvas.fill_rect(3, 9, 3, 9, Color::WHITE);
        canvas.fill_rect(11, 2, 11, 2, Color::rgba(10, 10, 10, 1));
        let bounds = ink_bounds(&canvas);
        assert_eq!((bounds.min_x, bounds.min_y), (3, 2));
        assert_eq!((bounds.max_x, bounds.max_y), (11, 9));
        assert_eq!(bounds.center(), (7.0, 5.5));
    }

    #[test]
    fn zero_alpha_color_is_not_ink() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill_rect(1, 1, 4, 4, Color::rgba(255, 255, 255, 0));
        assert!(ink_bounds(&canvas).is_empty());
    }
}
