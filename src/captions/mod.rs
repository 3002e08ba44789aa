//! Time-aligned caption selection and overlay rasterization.

/// Burning caption text into frames.
pub mod overlay;
/// Alignment validation and per-timestamp text selection.
pub mod track;
