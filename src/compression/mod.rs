//! Compression collaborator interface for binder payloads.
//!
//! Binders meet compression in two places: the whole container may sit
//! inside an outer envelope that must be unwrapped before the header can be
//! parsed, and individual entries may be compressed independently of the
//! envelope (both at once is the normal case for BND4). The container
//! readers stay codec-agnostic behind the [`Decompressor`] trait:
//!
//! * [`Decompressor::try_unwrap`] runs once at load and may replace the
//!   cursor with one over the decompressed stream.
//! * [`Decompressor::sniff`] + [`Decompressor::decompress`] run per entry
//!   whose file flags mark it compressed.
//!
//! [`Passthrough`] is the default collaborator and never decompresses.
//! The `compression` Cargo feature adds [`Inflater`], a ready-made
//! implementation over zlib and Zstandard:
//!
//! ```toml
//! [dependencies]
//! bndkit = { version = "0.1", features = ["compression"] }
//! ```
//!
//! Proprietary envelopes (DCX variants, Oodle) stay outside this crate;
//! implement the trait over your own codec to use them.

#[cfg(feature = "compression")]
pub mod zlib;

#[cfg(feature = "compression")]
pub mod zstd;

use crate::bin::BoxedReader;
use crate::{Error, Result};

/// Identifies the compression scheme of one stream or entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Zlib (RFC 1950) stream.
    Zlib,
    /// Zstandard frame.
    Zstd,
}

/// Codec collaborator consumed by the container readers.
pub trait Decompressor {
    /// Inspect a freshly opened cursor for an outer compression envelope.
    ///
    /// Returns the cursor to keep reading from - either the original,
    /// untouched, or a replacement over the decompressed bytes - plus the
    /// detected method, if any.
    fn try_unwrap(&self, cursor: BoxedReader) -> Result<(BoxedReader, Option<Method>)>;

    /// Detect the envelope of one entry's payload.
    fn sniff(&self, bytes: &[u8]) -> Option<Method>;

    /// Inflate one entry's payload.
    fn decompress(&self, bytes: &[u8], method: Method) -> Result<Vec<u8>>;
}

/// The no-op collaborator: never unwraps, never inflates.
///
/// Reading a compressed entry through it is an error rather than silently
/// returning compressed bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Decompressor for Passthrough {
    fn try_unwrap(&self, cursor: BoxedReader) -> Result<(BoxedReader, Option<Method>)> {
        Ok((cursor, None))
    }

    fn sniff(&self, _bytes: &[u8]) -> Option<Method> {
        None
    }

    fn decompress(&self, _bytes: &[u8], _method: Method) -> Result<Vec<u8>> {
        Err(Error::Unsupported("no decompressor configured"))
    }
}

/// Zlib + Zstandard implementation of [`Decompressor`].
#[cfg(feature = "compression")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Inflater;

#[cfg(feature = "compression")]
impl Decompressor for Inflater {
    fn try_unwrap(&self, mut cursor: BoxedReader) -> Result<(BoxedReader, Option<Method>)> {
        use crate::bin::BinReader;
        use std::io::Cursor;

        // Too short for a magic means too short for an envelope.
        let Ok(head) = cursor.step_in(0, |br| br.bytesa::<4>()) else {
            return Ok((cursor, None));
        };
        let Some(method) = sniff_bytes(&head) else {
            return Ok((cursor, None));
        };

        log::debug!("unwrapping {method:?} envelope");
        cursor.seek(0)?;
        let compressed = cursor.rest()?;
        let plain = self.decompress(&compressed, method)?;
        let replacement: BoxedReader = BinReader::new(Box::new(Cursor::new(plain)));
        Ok((replacement, Some(method)))
    }

    fn sniff(&self, bytes: &[u8]) -> Option<Method> {
        sniff_bytes(bytes)
    }

    fn decompress(&self, bytes: &[u8], method: Method) -> Result<Vec<u8>> {
        match method {
            Method::Zlib => zlib::decompress(bytes),
            Method::Zstd => zstd::decompress(bytes),
        }
    }
}

#[cfg(feature = "compression")]
fn sniff_bytes(bytes: &[u8]) -> Option<Method> {
    match bytes {
        // CMF 0x78 plus the FLG values zlib actually emits.
        [0x78, 0x01 | 0x5E | 0x9C | 0xDA, ..] => Some(Method::Zlib),
        // Zstandard frame magic, little-endian 0xFD2FB528.
        [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(Method::Zstd),
        _ => None,
    }
}

#[cfg(all(test, feature = "compression"))]
mod tests {
    use super::*;

    #[test]
    fn sniffs_zlib_and_zstd_magics() {
        assert_eq!(Inflater.sniff(&[0x78, 0x9C, 0, 0]), Some(Method::Zlib));
        assert_eq!(Inflater.sniff(&[0x78, 0x01, 0, 0]), Some(Method::Zlib));
        assert_eq!(Inflater.sniff(&[0x28, 0xB5, 0x2F, 0xFD]), Some(Method::Zstd));
        assert_eq!(Inflater.sniff(&[0x78, 0x00, 0, 0]), None);
        assert_eq!(Inflater.sniff(b"BND3"), None);
    }

    #[test]
    fn passthrough_refuses_to_inflate() {
        assert!(Passthrough.decompress(&[0x78, 0x9C], Method::Zlib).is_err());
    }
}
