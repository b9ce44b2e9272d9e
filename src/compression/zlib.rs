//! Zlib decompression (requires the `compression` feature).
//!
//! Zlib is the workhorse codec for binder payloads on older titles; an
//! entry's stream starts with CMF byte `0x78` followed by one of the FLG
//! values `0x01`, `0x5E`, `0x9C`, or `0xDA` and ends with an Adler-32
//! checksum, all of which flate2 handles.

#![cfg(feature = "compression")]

use std::io::Read;

use crate::{Error, Result};

/// Decompress a complete zlib stream, header and checksum included.
///
/// Returns [`Error::Zlib`] on any decompression failure.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|_| Error::Zlib)?;
    Ok(out)
}

/// Compress a buffer into a zlib stream.
///
/// The counterpart of [`decompress`], mainly useful for building fixtures
/// and repacking tools.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).map_err(|_| Error::Zlib)?;
    enc.finish().map_err(|_| Error::Zlib)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let plain = b"the same bytes come back out".repeat(20);
        let packed = compress(&plain).unwrap();
        assert_eq!(packed[0], 0x78);
        assert_eq!(decompress(&packed).unwrap(), plain);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(decompress(&[0x78, 0x9C, 0xFF, 0xFF]), Err(Error::Zlib)));
    }
}
