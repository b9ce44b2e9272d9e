//! Zstandard decompression (requires the `compression` feature).
//!
//! Newer titles compress binder payloads as single Zstandard frames
//! (magic `28 B5 2F FD`).

#![cfg(feature = "compression")]

use crate::{Error, Result};

/// Decompress a complete Zstandard frame.
///
/// Returns [`Error::Zstd`] on any decompression failure.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|_| Error::Zstd)
}
