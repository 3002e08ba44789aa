//! Background audio: decode to PCM, then fit it to the video length.

/// `ffmpeg`-based decoding into interleaved `f32` PCM.
pub mod decode;
/// Loop/trim/silence fitting, gain and fade-out.
pub mod mix;
