//! tilescroll core renderer.
//!
//! Buffered scrolling renderer for large tile maps: an offscreen ring buffer
//! that only redraws newly exposed tiles, per-position tile animation, zoom,
//! and compositing of foreign surfaces between tile layers. Pixel storage is
//! abstract ([`pixmap::Pixmap`]); this crate has no platform dependencies.

// Re-exports from tilescroll-types (foundation types and traits).
pub use tilescroll_types::color;
pub use tilescroll_types::config;
pub use tilescroll_types::error;
pub use tilescroll_types::geometry;
pub use tilescroll_types::pixmap;
pub use tilescroll_types::soft;

pub mod animation;
pub mod cache;
pub mod camera;
pub mod compositor;
pub mod data;
pub mod dirty;
pub mod renderer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use camera::{Camera, CameraGroup, Sprite};
pub use data::MapData;
pub use renderer::{BufferedRenderer, ForeignSurface};
