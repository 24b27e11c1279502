//! RGBA colors and blending helpers.

use serde::Deserialize;

/// A color in RGBA format (0-255 per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque_alpha")]
    pub a: u8,
}

fn opaque_alpha() -> u8 {
    255
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Return the same color with a different alpha value.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Pack into `[r, g, b, a]` bytes (PNG / RGBA8888 order).
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
}

/// Blend one channel: `src * alpha + dst * (255 - alpha)`, divided by 255.
///
/// Uses `(x + 1 + (x >> 8)) >> 8` in place of `x / 255`.
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Source-over blend of `src` onto `dst`.
///
/// The resulting alpha is `src.a + dst.a * (1 - src.a)`, so blending onto a
/// fully transparent destination yields the source color unchanged.
pub fn blend_over(src: Color, dst: Color) -> Color {
    match src.a {
        255 => src,
        0 => dst,
        _ if dst.a == 0 => src,
        a => {
            let alpha = a as u16;
            let out_a = alpha + dst.a as u16 * (255 - alpha) / 255;
            Color::rgba(
                blend_channel(src.r, dst.r, alpha),
                blend_channel(src.g, dst.g, alpha),
                blend_channel(src.b, dst.b, alpha),
                out_a.min(255) as u8,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces() {
        let dst = Color::rgb(10, 20, 30);
        let src = Color::rgb(200, 100, 50);
        assert_eq!(blend_over(src, dst), src);
    }

    #[test]
    fn transparent_source_keeps_destination() {
        let dst = Color::rgb(10, 20, 30);
        assert_eq!(blend_over(Color::TRANSPARENT, dst), dst);
    }

    #[test]
    fn half_alpha_mixes() {
        let c = blend_over(Color::rgba(255, 255, 255, 128), Color::BLACK);
        assert!((127..=129).contains(&c.r));
        assert_eq!(c.a, 255);
    }

    #[test]
    fn blend_onto_empty_keeps_source() {
        let src = Color::rgba(40, 50, 60, 90);
        assert_eq!(blend_over(src, Color::TRANSPARENT), src);
    }

    #[test]
    fn deserialize_defaults_alpha() {
        let c: Color = toml::from_str("r = 1\ng = 2\nb = 3").unwrap();
        assert_eq!(c, Color::rgb(1, 2, 3));
    }
}
