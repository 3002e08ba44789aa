//! Asset prefetch: resolve image/audio references to local files, then decode.

/// Image decoding behind an injectable trait.
pub mod decode;
/// Local path or HTTP(S) source resolution.
pub mod fetch;
/// Invocation-scoped temporary directory.
pub mod workspace;
