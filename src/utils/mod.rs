//! Utility modules for guild scoring
//!
//! Contains shared functionality used across multiple metrics:
//! - Normalization: tanh saturation and percentile interpolation
//! - Organism counting: shared organism network analysis

pub mod normalization;
pub mod organism_counter;

// Re-export commonly used types
pub use normalization::{percentile_normalize, saturate};
pub use organism_counter::{count_shared_organisms, shared_organisms, SharedOrganism};
