use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};

/// Turns encoded image bytes into straight-alpha RGBA8.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> ReelResult<image::RgbaImage>;
}

/// Decodes every format the `image` crate was built with, sniffing the format from content.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultImageDecoder;

impl ImageDecoder for DefaultImageDecoder {
    fn decode(&self, bytes: &[u8]) -> ReelResult<image::RgbaImage> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        Ok(dyn_img.to_rgba8())
    }
}

/// Read and decode the image at `path`.
pub fn decode_file(decoder: &dyn ImageDecoder, path: &Path) -> ReelResult<image::RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
    decoder.decode(&bytes).map_err(|e| match e {
        ReelError::Other(inner) => ReelError::Other(inner.context(format!("image {}", path.display()))),
        other => other,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
