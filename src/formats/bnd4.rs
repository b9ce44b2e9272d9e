//! BND4 - single-stream binder of the Dark Souls 2 era onward.
//!
//! Compared to BND3: 64-bit sizes, optional 64-bit data offsets, a
//! Unicode/Shift-JIS toggle for names, an optional filename hash table, and
//! per-entry compression that is independent of any outer envelope (a
//! container unwrapped at load can still hold individually compressed
//! entries).
//!
//! ## Layout
//! ```text
//! [0x00] Magic "BND4"             (4 bytes)
//! [0x04] Unk04, Unk05             (2 bools)
//! [0x06] 0, 0, 0                  (3 bytes)
//! [0x09] BigEndian                (bool)
//! [0x0A] !BitBigEndian            (bool)
//! [0x0B] 0                        (1 byte)
//! [0x0C] FileCount                (i32)
//! [0x10] HeaderSize (0x40)        (i64)
//! [0x18] Version                  (8-byte fixed string)
//! [0x20] FileHeaderSize           (i64)
//! [0x28] FileHeadersEnd           (i64, ignored; includes the hash table)
//! [0x30] Unicode                  (bool)
//! [0x31] Format                   (1 byte)
//! [0x32] Extended (0/1/4/0x80)    (1 byte)
//! [0x33] 0                        (1 byte)
//! [0x34] 0                        (i32)
//! [0x38] HashTableOffset          (i64; 0 unless Extended == 4)
//! [0x40] FileHeaders              (FileCount entries)
//! ```
//!
//! ## File Header
//! ```text
//! [0x00] FileFlags                (1 byte) + 3 zero bytes
//! [0x04] -1                       (i32)
//! [0x08] CompressedSize           (i64)
//! [....] UncompressedSize         (i64, with Compression)
//! [....] DataOffset               (u32, or i64 with LongOffsets)
//! [....] ID                       (i32, with IDs)
//! [....] NameOffset               (u32 -> UTF-16 or Shift-JIS, with names)
//! [....] ID + 0                   (2 x i32, only when Format is bare Names1)
//! ```

use log::debug;

use crate::bin::{BinReader, BoxedReader, IntoCursor};
use crate::compression::{Decompressor, Method, Passthrough};
use crate::formats::binder::{
    assert_hash_table, bnd4_file_header_size, read_binder4_header, read_format,
    BinderFileHeader, Format,
};
use crate::{Error, Result};

use std::io::{Read, Seek};

/// Parsed BND4 metadata.
///
/// File data is accessed via [`Bnd4Reader`].
#[derive(Debug)]
pub struct Bnd4 {
    /// Unknown header bool at 0x04.
    pub unk04: bool,
    /// Unknown header bool at 0x05.
    pub unk05: bool,
    /// Version string.
    pub version: String,
    /// Feature flags for the whole binder.
    pub format: Format,
    /// Whether the header declared itself big-endian.
    pub big_endian: bool,
    /// Whether flag bytes are stored in big bit order.
    pub bit_big_endian: bool,
    /// Whether names are UTF-16 rather than Shift-JIS.
    pub unicode: bool,
    /// Hash table presence marker; 4 means a filename hash table exists.
    pub extended: u8,
    /// All file entries in declaration order.
    pub files: Vec<BinderFileHeader>,
}

impl Bnd4 {
    /// Whether `bytes` look like the start of a BND4.
    pub fn is(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BND4"
    }

    /// Parse a BND4 header from `br`.
    ///
    /// The reader must be positioned at the magic; any outer compression
    /// envelope must already be unwrapped. File contents are not read.
    pub fn parse<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        br.assert_magic(b"BND4")?;
        let h = read_binder4_header(br)?;

        br.assert_i64(&[0x40], "header size")?;
        let version = br.fix_str(8)?;
        let file_header_size = br.i64()? as u64;
        br.i64()?; // end of file headers, including the hash table

        let unicode = br.bool()?;
        let format = read_format(br, h.bit_big_endian)?;
        let extended = br.assert_u8(&[0, 1, 4, 0x80], "extended flag")?;
        br.assert_u8(&[0], "header padding")?;
        br.assert_i32(&[0], "header padding")?;

        if extended == 4 {
            let table_offset = br.i64()? as u64;
            br.step_in(table_offset, assert_hash_table)?;
        } else {
            br.assert_i64(&[0], "hash table offset")?;
        }

        if file_header_size != bnd4_file_header_size(format) {
            return Err(Error::Format("file header size does not match format"));
        }

        let mut files = Vec::with_capacity(h.file_count as usize);
        for _ in 0..h.file_count {
            files.push(BinderFileHeader::read_bnd4(
                br,
                format,
                h.bit_big_endian,
                unicode,
            )?);
        }

        Ok(Self {
            unk04: h.unk04,
            unk05: h.unk05,
            version,
            format,
            big_endian: h.big_endian,
            bit_big_endian: h.bit_big_endian,
            unicode,
            extended,
            files,
        })
    }
}

/// On-demand reader for BND4 containers.
pub struct Bnd4Reader<D = Passthrough> {
    /// Parsed metadata.
    pub bnd: Bnd4,
    data: BoxedReader,
    decomp: D,
    compression: Option<Method>,
}

impl Bnd4Reader {
    /// Read a BND4 from a path, byte buffer, or stream at position 0,
    /// without outer-envelope support.
    pub fn new(source: impl IntoCursor) -> Result<Self> {
        Self::with_decompressor(source, Passthrough)
    }
}

impl<D: Decompressor> Bnd4Reader<D> {
    /// Read a BND4, letting `decomp` unwrap an outer compression envelope
    /// and inflate compressed entries. Entries stay individually compressed
    /// even when the whole stream was wrapped, so both paths matter.
    pub fn with_decompressor(source: impl IntoCursor, decomp: D) -> Result<Self> {
        let cursor = source.into_cursor()?;
        let (mut cursor, compression) = decomp.try_unwrap(cursor)?;
        let bnd = Bnd4::parse(&mut cursor)?;
        debug!("BND4 {:?}: {} entries", bnd.version, bnd.files.len());
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
