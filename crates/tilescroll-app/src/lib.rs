//! Demo support for the tilescroll binaries: configuration, the generated
//! map, and keyboard handling.

pub mod config;
pub mod input;
pub mod map;
