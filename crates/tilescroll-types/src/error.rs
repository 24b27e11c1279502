//! Error types for tilescroll.

use crate::geometry::Size;

/// Errors produced by the tilescroll renderer and its backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Invalid configuration: non-positive viewport or zoom, conflicting
    /// options, empty animation. The call had no effect.
    #[error("config error: {0}")]
    Config(String),

    /// The map data no longer matches what the renderer was configured with.
    ///
    /// Returned by the renderer's adapter check. Renderer operations never
    /// fail with it: they log it and reconfigure.
    #[error("adapter inconsistency: {what} changed from {expected:?} to {found:?}")]
    AdapterInconsistency {
        what: &'static str,
        expected: Size,
        found: Size,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = RenderError::Config("zoom must be positive".into());
        assert_eq!(format!("{e}"), "config error: zoom must be positive");
    }

    #[test]
    fn backend_error_display() {
        let e = RenderError::Backend("surface lost".into());
        assert_eq!(format!("{e}"), "backend error: surface lost");
    }

    #[test]
    fn inconsistency_display() {
        let e = RenderError::AdapterInconsistency {
            what: "tile size",
            expected: Size::new(16, 16),
            found: Size::new(32, 32),
        };
        let msg = format!("{e}");
        assert!(msg.contains("tile size"));
        assert!(msg.contains("w: 32"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: RenderError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: RenderError = io_err.into();
        assert!(format!("{e}").contains("gone"));
    }
}
