/// Timeline and raster primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Pixel blending and scalar helpers.
pub mod math;
