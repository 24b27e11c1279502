//! Foundation types for tilescroll.
//!
//! This crate contains the backend-agnostic types shared by all tilescroll
//! crates: colors, pixel and tile geometry, the [`pixmap::Pixmap`] trait that
//! graphics backends implement, a software pixmap, renderer configuration,
//! and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pixmap;
pub mod soft;
