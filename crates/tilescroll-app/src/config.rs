//! Demo configuration.
//!
//! Read from the TOML file named by the first CLI argument or the
//! `TILESCROLL_CONFIG` environment variable. Every key is optional.
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//!
//! [map]
//! width = 256
//! height = 256
//! tile_size = 16
//! seed = 7
//!
//! [renderer]
//! zoom = 2.0
//! clamp_camera = true
//! ```

use std::path::Path;

use serde::Deserialize;

use tilescroll_core::config::RendererOptions;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Hero speed in world pixels per frame.
    pub scroll_speed: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "tilescroll".to_string(),
            width: 800,
            height: 600,
            scroll_speed: 3,
        }
    }
}

/// Parameters of the generated demo map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub seed: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            tile_size: 16,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub map: MapConfig,
    pub renderer: RendererOptions,
}

impl DemoConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.renderer.validate()?;
        anyhow::ensure!(
            config.map.tile_size > 0 && config.map.width > 0 && config.map.height > 0,
            "map dimensions and tile size must be positive"
        );
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::info!("Loaded config: {}", path.display());
        Ok(config)
    }

    /// Config from the CLI argument or `TILESCROLL_CONFIG`, else defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::args()
            .nth(1)
            .or_else(|| std::env::var("TILESCROLL_CONFIG").ok())
        {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(DemoConfig::from_toml("").unwrap(), DemoConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let c = DemoConfig::from_toml(
            "[map]\nseed = 9\n[renderer]\nzoom = 2.0\nclamp_camera = true\n",
        )
        .unwrap();
        assert_eq!(c.map.seed, 9);
        assert_eq!(c.map.tile_size, 16);
        assert_eq!(c.renderer.zoom, 2.0);
        assert!(c.renderer.clamp_camera);
        assert_eq!(c.window.width, 800);
    }

    #[test]
    fn invalid_renderer_options_rejected() {
        assert!(DemoConfig::from_toml("[renderer]\nzoom = 0.0\n").is_err());
        assert!(DemoConfig::from_toml("[map]\ntile_size = 0\n").is_err());
    }
}
