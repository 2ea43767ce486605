//! Axis-aligned collision and boundary checks
//!
//! All comparisons are closed-interval: touching edges overlap. The catch
//! game's "just barely caught" outcomes at the paddle edge depend on this.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle; `pos` is the top-left corner, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }
}

/// Closed-interval overlap on all four edges
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.left() <= b.right() && a.right() >= b.left() && a.top() <= b.bottom() && a.bottom() >= b.top()
}

/// True once the rectangle's top edge has passed below `boundary_y`
pub fn is_below(rect: &Rect, boundary_y: f32) -> bool {
    rect.top() > boundary_y
}

/// True while the rectangle lies fully inside `[min_x, max_x]`
pub fn is_within_horizontal_bounds(rect: &Rect, min_x: f32, max_x: f32) -> bool {
    rect.left() >= min_x && rect.right() <= max_x
}

/// True while the rectangle lies fully inside `[min_y, max_y]`
pub fn is_within_vertical_bounds(rect: &Rect, min_y: f32, max_y: f32) -> bool {
    rect.top() >= min_y && rect.bottom() <= max_y
}

/// Clamp a horizontal position so an actor of `width` stays in `[0, bound]`
#[inline]
pub fn clamp_span(x: f32, width: f32, bound: f32) -> f32 {
    x.clamp(0.0, (bound - width).max(0.0))
}
