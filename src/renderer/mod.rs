//! Rendering module
//!
//! Games paint through the `Surface` trait. `PaintList` records paint
//! commands (tests, headless runs); the browser platform implements the
//! same trait over a 2D canvas context.

pub mod overlay;
pub mod palette;
pub mod surface;

pub use palette::Color;
pub use surface::{PaintCommand, PaintList, Surface, TextAlign, TextStyle};
