//! Pan-zoom mode: eased crop trajectory and crop+resize compositing.

/// Crop and rescale a source raster to the canvas.
pub mod compositor;
/// Crop trajectory planning.
pub mod planner;
