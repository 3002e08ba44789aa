//! Encoding sinks. Sinks consume assembled frames in timeline order.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
