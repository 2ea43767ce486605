//! Colors for game elements

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color string for canvas fill styles
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                f32::from(self.a) / 255.0
            )
        }
    }
}

pub const BACKGROUND: Color = Color::rgb(0x0b, 0x0d, 0x17);
pub const PLAYER: Color = Color::rgb(0x34, 0xd3, 0x99);
pub const OPPONENT: Color = Color::rgb(0xf8, 0x71, 0x71);
pub const BALL: Color = Color::rgb(0xf5, 0xf5, 0xf5);
pub const HUD_TEXT: Color = Color::rgb(0xe5, 0xe7, 0xeb);
pub const OVERLAY_SCRIM: Color = Color::rgba(0, 0, 0, 170);
pub const OVERLAY_TITLE: Color = Color::rgb(0xfb, 0xbf, 0x24);
pub const OVERLAY_TEXT: Color = Color::rgb(0xd1, 0xd5, 0xdb);
pub const FOOD: Color = Color::rgb(0xef, 0x44, 0x44);
pub const PIPE: Color = Color::rgb(0x22, 0xc5, 0x5e);
pub const BIRD: Color = Color::rgb(0xfa, 0xcc, 0x15);

/// Palette shared by falling objects and bricks; variants index into it
pub const VARIANTS: [Color; 5] = [
    Color::rgb(0x60, 0xa5, 0xfa), // blue
    Color::rgb(0xf4, 0x72, 0xb6), // pink
    Color::rgb(0xfb, 0xbf, 0x24), // amber
    Color::rgb(0xa7, 0x8b, 0xfa), // violet
    Color::rgb(0x2d, 0xd4, 0xbf), // teal
];

/// Color for a visual variant index (wraps out-of-range indices)
pub fn variant(index: u8) -> Color {
    VARIANTS[usize::from(index) % VARIANTS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_css() {
        assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
        assert_eq!(Color::rgba(0, 0, 0, 255).to_css(), "#000000");
        assert_eq!(Color::rgba(0, 0, 0, 0).to_css(), "rgba(0, 0, 0, 0.000)");
    }

    #[test]
    fn test_variant_wraps() {
        assert_eq!(variant(0), VARIANTS[0]);
        assert_eq!(variant(VARIANTS.len() as u8), VARIANTS[0]);
    }
}
