//! Analysis engine modules.
//!
//! This module provides the 5 whys state machine and its question templates.

pub mod analyzer;
pub mod questions;

pub use analyzer::AnalysisEngine;
