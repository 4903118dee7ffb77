//! Frame assets: byte sources, decoding, archive extraction, bounded loading, and ownership.

/// Zip-archive extraction in manifest order.
pub mod archive;
/// Encoded bytes → drawable images.
pub mod decode;
/// Bounded-concurrency and archive frame loading.
pub mod fetch;
/// Byte sources (HTTP, local files).
pub mod source;
/// Session-lifetime owner of decoded frames.
pub mod store;
