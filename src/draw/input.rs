use crate::draw::canvas::PixelCanvas;
use crate::draw::model::{Color, StrokeStyle};
use crate::draw::raster::DirtyRect;

/// Pointer state machine for freehand drawing.
///
/// Segments are rasterized as soon as the pointer moves; nothing about the
/// stroke survives except the pixels it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInputState {
    style: StrokeStyle,
    last_point: Option<(i32, i32)>,
}

impl DrawInputState {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            style,
            last_point: None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn set_color(&mut self, color: Color) {
        self.style.color = color;
    }

    /// Begin a path. Nothing is painted until the pointer moves.
    pub fn handle_down(&mut self, point: (i32, i32)) {
        self.last_point = Some(point);
    }

    pub fn handle_move(&mut self, canvas: &mut PixelCanvas, point: (i32, i32)) -> Option<DirtyRect> {
        let last = self.last_point?;
        if last == point {
            return None;
        }
        self.last_point = Some(point);
        canvas.stroke_segment(last, point, self.style.color, self.style.width)
    }

    pub fn handle_up(&mut self) {
        self.last_point = None;
    }

    pub fn handle_leave(&mut self) {
        self.last_point = None;
    }
}
