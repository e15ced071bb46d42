pub mod bounds;
pub mod canvas;
pub mod input;
pub mod model;
pub mod raster;

pub use bounds::{ink_bounds, InkBounds};
pub use canvas::PixelCanvas;
pub use input::DrawInputState;
pub use model::{Color, StrokeStyle};
