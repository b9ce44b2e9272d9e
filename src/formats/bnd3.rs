//! BND3 - single-stream binder (header + data in one file).
//!
//! The general-purpose archive of the Demon's Souls / Dark Souls 1 era.
//! Which entry fields exist is governed by the format byte; see
//! [`Format`](crate::formats::binder::Format).
//!
//! ## Layout
//! ```text
//! [0x00] Magic "BND3"             (4 bytes)
//! [0x04] Version                  (8-byte fixed string, usually a timestamp)
//! [0x0C] Format                   (1 byte, possibly bit-reversed)
//! [0x0D] BigEndian                (bool)
//! [0x0E] BitBigEndian             (bool)
//! [0x0F] 0                        (1 byte)
//! [0x10] FileCount                (i32)
//! [0x14] FileHeadersEnd           (i32, ignored)
//! [0x18] Unk18 (0 or 0x80000000)  (i32)
//! [0x1C] 0                        (i32)
//! [0x20] FileHeaders              (FileCount entries)
//! [...]  Names, then file data
//! ```
//!
//! Integers from FileCount on use the endianness resolved from the
//! BigEndian byte OR'd with the format's BigEndian flag.
//!
//! ## File Header
//! ```text
//! [0x00] FileFlags                (1 byte) + 3 zero bytes
//! [0x04] CompressedSize           (u32)
//! [0x08] DataOffset               (u32, or i64 with LongOffsets)
//! [....] ID                       (i32, with IDs)
//! [....] NameOffset               (u32 -> null-terminated Shift-JIS, with names)
//! [....] UncompressedSize         (u32, with Compression)
//! ```

use log::debug;

use crate::bin::{BinReader, BoxedReader, IntoCursor};
use crate::compression::{Decompressor, Method, Passthrough};
use crate::formats::binder::{read_binder3_header, BinderFileHeader, Format};
use crate::{Error, Result};

use std::io::{Read, Seek};

/// Parsed BND3 metadata.
///
/// File data is accessed via [`Bnd3Reader`].
#[derive(Debug)]
pub struct Bnd3 {
    /// Version string, usually a build timestamp.
    pub version: String,
    /// Feature flags for the whole binder.
    pub format: Format,
    /// Whether the header declared itself big-endian.
    pub big_endian: bool,
    /// Whether flag bytes are stored in big bit order.
    pub bit_big_endian: bool,
    /// Unknown; always 0 except occasionally 0x80000000 in Demon's Souls.
    pub unk18: i32,
    /// All file entries in declaration order.
    pub files: Vec<BinderFileHeader>,
}

impl Bnd3 {
    /// Whether `bytes` look like the start of a BND3.
    pub fn is(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BND3"
    }

    /// Parse a BND3 header from `br`.
    ///
    /// The reader must be positioned at the magic; any outer compression
    /// envelope must already be unwrapped. File contents are not read.
    pub fn parse<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        br.assert_magic(b"BND3")?;
        let h = read_binder3_header(br)?;

        br.u32()?; // end of file headers, not including padding before data
        let unk18 = br.assert_i32(&[0, i32::MIN], "unk18")?;
        br.assert_i32(&[0], "header padding")?;

        let mut files = Vec::with_capacity(h.file_count as usize);
        for _ in 0..h.file_count {
            files.push(BinderFileHeader::read_bnd3(br, h.format, h.bit_big_endian)?);
        }

        Ok(Self {
            version: h.version,
            format: h.format,
            big_endian: h.big_endian,
            bit_big_endian: h.bit_big_endian,
            unk18,
            files,
        })
    }
}

/// On-demand reader for BND3 containers.
///
/// Owns its cursor; dropping the reader releases it. Not thread-safe -
/// extraction moves the shared cursor.
pub struct Bnd3Reader<D = Passthrough> {
    /// Parsed metadata.
    pub bnd: Bnd3,
    data: BoxedReader,
    decomp: D,
    compression: Option<Method>,
}

impl Bnd3Reader {
    /// Read a BND3 from a path, byte buffer, or stream at position 0,
    /// without outer-envelope support.
    pub fn new(source: impl IntoCursor) -> Result<Self> {
        Self::with_decompressor(source, Passthrough)
    }
}

impl<D: Decompressor> Bnd3Reader<D> {
    /// Read a BND3, letting `decomp` unwrap an outer compression envelope
    /// and inflate compressed entries.
    pub fn with_decompressor(source: impl IntoCursor, decomp: D) -> Result<Self> {
        let cursor = source.into_cursor()?;
        let (mut cursor, compression) = decomp.try_unwrap(cursor)?;
        let bnd = Bnd3::parse(&mut cursor)?;
        debug!("BND3 {:?}: {} entries", bnd.version, bnd.files.len());
        Ok(Self {
            bnd,
            data: cursor,
            decomp,
            compression,
        })
    }

    /// The outer envelope detected at load, if any.
    pub fn compression(&self) -> Option<Method> {
        self.compression
    }

    /// All file entries.
    pub fn files(&self) -> &[BinderFileHeader] {
        &self.bnd.files
    }

    /// Extract one entry's bytes, inflating if the entry is compressed.
    ///
    /// Re-readable any number of times.
    pub fn read_file(&mut self, file: &BinderFileHeader) -> Result<Vec<u8>> {
        file.read_data(&mut self.data, &self.decomp)
    }

    /// Extract the entry at `index`.
    pub fn read_file_at(&mut self, index: usize) -> Result<Vec<u8>> {
        let count = self.bnd.files.len();
        let file = self
            .bnd
            .files
            .get(index)
            .cloned()
            .ok_or(Error::Index { index, count })?;
        self.read_file(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::BinWriter;
    use crate::formats::binder::{write_file_flags, write_format, FileFlags};
    use std::io::Read as _;

    /// Zlib-only test collaborator backed by flate2 (dev-dependency), so the
    /// default feature set still exercises compressed entries.
    struct TestZlib;

    impl Decompressor for TestZlib {
        fn try_unwrap(
            &self,
            cursor: BoxedReader,
        ) -> Result<(BoxedReader, Option<Method>)> {
            Ok((cursor, None))
        }

        fn sniff(&self, bytes: &[u8]) -> Option<Method> {
            (bytes.len() >= 2 && bytes[0] == 0x78).then_some(Method::Zlib)
        }

        fn decompress(&self, bytes: &[u8], _method: Method) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            flate2::read::ZlibDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|_| Error::Format("bad zlib fixture"))?;
            Ok(out)
        }
    }

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        use std::io::Write as _;
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Build a little-endian BND3 with the classic
    /// IDs|Names1|Names2|Compression format. `compressed` marks entries
    /// stored as zlib.
    fn build_bnd3(entries: &[(i32, &str, &[u8], bool)]) -> Vec<u8> {
        let format = Format::IDS | Format::NAMES_1 | Format::NAMES_2 | Format::COMPRESSION;
        let mut bw = BinWriter::memory();
        bw.bytes(b"BND3").unwrap();
        bw.fix_str("07D7R6", 8).unwrap();
        write_format(&mut bw, false, format).unwrap();
        bw.bool(false).unwrap(); // big-endian
        bw.bool(false).unwrap(); // bit-big-endian
        bw.u8(0).unwrap();
        bw.u32(entries.len() as u32).unwrap();
        let headers_end = bw.reserve_u32().unwrap();
        bw.i32(0).unwrap(); // unk18
        bw.i32(0).unwrap();

        let mut tokens = Vec::new();
        for (id, _, data, compressed) in entries {
            let flags = if *compressed {
                FileFlags::COMPRESSED | FileFlags::FLAG_1
            } else {
                FileFlags::FLAG_1
            };
            write_file_flags(&mut bw, false, flags).unwrap();
            bw.u8(0).unwrap();
            bw.u8(0).unwrap();
            bw.u8(0).unwrap();
            let size = bw.reserve_u32().unwrap();
            let offset = bw.reserve_u32().unwrap();
            bw.i32(*id).unwrap();
            let name_offset = bw.reserve_u32().unwrap();
            bw.u32(data.len() as u32).unwrap(); // uncompressed size
            tokens.push((size, offset, name_offset));
        }

        let mut name_positions = Vec::new();
        for (_, name, _, _) in entries {
            name_positions.push(bw.position().unwrap() as u32);
            bw.bytes(name.as_bytes()).unwrap();
            bw.u8(0).unwrap();
        }
        let end = bw.position().unwrap() as u32;
        bw.fill_u32(headers_end, end).unwrap();

        let mut payload_info = Vec::new();
        for (_, _, data, compressed) in entries {
            let stored = if *compressed {
                zlib_compress(data)
            } else {
                data.to_vec()
            };
            let pos = bw.position().unwrap() as u32;
            bw.bytes(&stored).unwrap();
            payload_info.push((pos, stored.len() as u32));
        }

        for (((size, offset, name_off), (pos, len)), name_pos) in
            tokens.into_iter().zip(payload_info).zip(name_positions)
        {
            bw.fill_u32(size, len).unwrap();
            bw.fill_u32(offset, pos).unwrap();
            bw.fill_u32(name_off, name_pos).unwrap();
        }
        bw.into_bytes()
    }

    const PAYLOAD_A: &[u8] = b"first payload, stored raw";
    const PAYLOAD_B: &[u8] = b"second payload, also raw bytes";
    const PAYLOAD_C: &[u8] =
        b"third payload third payload third payload third payload (compresses)";

    fn fixture() -> Vec<u8> {
        build_bnd3(&[
            (10, "a.param", PAYLOAD_A, false),
            (20, "b.param", PAYLOAD_B, false),
            (30, "c.fmg", PAYLOAD_C, true),
        ])
    }

    #[test]
    fn parses_header_fields() {
        let mut reader = Bnd3Reader::new(fixture()).unwrap();
        assert_eq!(reader.bnd.version, "07D7R6");
        assert_eq!(
            reader.bnd.format,
            Format::IDS | Format::NAMES_1 | Format::NAMES_2 | Format::COMPRESSION
        );
        assert!(!reader.bnd.big_endian);
        assert_eq!(reader.files().len(), 3);
        assert_eq!(reader.files()[0].id, Some(10));
        assert_eq!(reader.files()[2].name.as_deref(), Some("c.fmg"));
        assert_eq!(reader.files()[2].uncompressed_size, Some(PAYLOAD_C.len() as u64));
        assert_eq!(reader.compression(), None);

        // Uncompressed entries come back as raw offset slices.
        assert_eq!(reader.read_file_at(0).unwrap(), PAYLOAD_A);
        assert_eq!(reader.read_file_at(1).unwrap(), PAYLOAD_B);
    }

    #[test]
    fn compressed_entry_inflates_and_rereads() {
        let mut reader = Bnd3Reader::with_decompressor(fixture(), TestZlib).unwrap();
        assert_eq!(reader.read_file_at(2).unwrap(), PAYLOAD_C);
        // Extraction is repeatable; nothing is cached or consumed.
        assert_eq!(reader.read_file_at(2).unwrap(), PAYLOAD_C);
        assert_eq!(reader.read_file_at(0).unwrap(), PAYLOAD_A);
    }

    #[test]
    fn compressed_entry_without_decompressor_is_an_error() {
        let mut reader = Bnd3Reader::new(fixture()).unwrap();
        assert!(reader.read_file_at(2).is_err());
    }

    #[test]
    fn bad_index_is_an_index_error() {
        let mut reader = Bnd3Reader::new(fixture()).unwrap();
        match reader.read_file_at(3) {
            Err(Error::Index { index: 3, count: 3 }) => {}
            other => panic!("expected index error, got {other:?}"),
        }
    }

    #[test]
    fn bad_magic_aborts_construction() {
        let mut bytes = fixture();
        bytes[3] = b'9';
        assert!(matches!(Bnd3Reader::new(bytes), Err(Error::BadMagic)));
    }

    #[test]
    fn probe_sniffs_magic() {
        assert!(Bnd3::is(&fixture()));
        assert!(!Bnd3::is(b"BND4"));
        assert!(!Bnd3::is(b"BN"));
    }
}
