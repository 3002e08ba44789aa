//! Pencil-reveal mode: stroke geometry, line-art rendition, mask accumulation and compositing.

/// Per-frame reveal state machine.
pub mod compositor;
/// Cursor sprite loading and stamping.
pub mod cursor;
/// Monotonic accumulated reveal mask.
pub mod mask;
/// Zig-zag stroke generator.
pub mod path;
/// Pencil-style rendition of a source image.
pub mod sketch;
