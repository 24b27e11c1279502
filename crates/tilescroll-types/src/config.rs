//! Renderer configuration.
//!
//! `alpha` and `colorkey` select the storage format of the offscreen buffer.
//! They are special purpose and unrelated to the transparency of individual
//! tilesets: they are only needed when the map itself must be drawn over
//! something else (for example a parallax background).

use serde::Deserialize;

use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::pixmap::PixelFormat;

/// Options accepted at renderer construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Use a per-pixel-alpha buffer.
    pub alpha: bool,
    /// Use a colorkeyed buffer with this key as the transparent color.
    pub colorkey: Option<Color>,
    /// Zoom factor. Values above 1.0 magnify the map.
    pub zoom: f32,
    /// Keep the view inside the map rectangle.
    pub clamp_camera: bool,
    /// Fill used in opaque mode where nothing is drawn (outside the map).
    pub clear_color: Color,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            alpha: false,
            colorkey: None,
            zoom: 1.0,
            clamp_camera: false,
            clear_color: Color::BLACK,
        }
    }
}

impl RendererOptions {
    /// Parse options from a TOML document. Missing keys take defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Check option consistency.
    pub fn validate(&self) -> Result<()> {
        if self.alpha && self.colorkey.is_some() {
            return Err(RenderError::Config(
                "cannot select both colorkey and alpha".into(),
            ));
        }
        validate_zoom(self.zoom)
    }

    /// Storage format of the offscreen buffer.
    pub fn buffer_format(&self) -> PixelFormat {
        match (self.alpha, self.colorkey) {
            (_, Some(key)) => PixelFormat::ColorKeyed(key),
            (true, None) => PixelFormat::Rgba,
            (false, None) => PixelFormat::Rgb,
        }
    }

    /// Color that marks "nothing drawn" in the offscreen buffer.
    pub fn buffer_clear_color(&self) -> Color {
        match self.buffer_format() {
            PixelFormat::Rgb => self.clear_color,
            format => format.clear_color(),
        }
    }
}

/// Zoom must be a finite, strictly positive number.
pub fn validate_zoom(zoom: f32) -> Result<()> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        log::error!("zoom level cannot be zero or less (got {zoom})");
        Err(RenderError::Config(format!(
            "zoom must be positive, got {zoom}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_opaque_unzoomed() {
        let o = RendererOptions::default();
        assert_eq!(o.zoom, 1.0);
        assert_eq!(o.buffer_format(), PixelFormat::Rgb);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn alpha_and_colorkey_conflict() {
        let o = RendererOptions {
            alpha: true,
            colorkey: Some(Color::rgb(255, 0, 255)),
            ..Default::default()
        };
        assert!(matches!(o.validate(), Err(RenderError::Config(_))));
    }

    #[test]
    fn zoom_must_be_positive() {
        assert!(validate_zoom(0.0).is_err());
        assert!(validate_zoom(-1.0).is_err());
        assert!(validate_zoom(f32::NAN).is_err());
        assert!(validate_zoom(0.5).is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let o = RendererOptions::from_toml("alpha = true\nzoom = 2.0").unwrap();
        assert!(o.alpha);
        assert_eq!(o.zoom, 2.0);
        assert_eq!(o.buffer_format(), PixelFormat::Rgba);
        assert!(!o.clamp_camera);
    }

    #[test]
    fn parse_colorkey_table() {
        let o = RendererOptions::from_toml("colorkey = { r = 255, g = 0, b = 255 }").unwrap();
        assert_eq!(
            o.buffer_format(),
            PixelFormat::ColorKeyed(Color::rgb(255, 0, 255))
        );
    }

    #[test]
    fn parse_rejects_bad_zoom() {
        assert!(RendererOptions::from_toml("zoom = 0.0").is_err());
    }
}
