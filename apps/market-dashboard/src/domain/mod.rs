//! Domain Layer
//!
//! Pure types and computations with no I/O:
//!
//! - [`series`]: price and return tables
//! - [`window`]: analysis time windows and presets
//! - [`analytics`]: summary metrics, correlation, distribution statistics
//! - [`errors`]: fatal load errors and non-fatal warnings

pub mod analytics;
pub mod errors;
pub mod series;
pub mod window;
