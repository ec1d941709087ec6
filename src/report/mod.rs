//! Report modules.
//!
//! This module renders analyses into their export formats.

pub mod generator;

pub use generator::{render, write_export, RenderOptions};
