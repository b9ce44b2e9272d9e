//! BXF4 - split binder: a BHF4 header file (.bhd) plus a BDF4 data file
//! (.bdt).
//!
//! The BHF4 header is laid out exactly like a BND4 header except that the
//! word at 0x28 (headers end) is zero, since the data lives in the sibling
//! stream. Entry metadata is BND4-shaped; data offsets address the data
//! stream.
//!
//! ## BDF4 data stream
//! ```text
//! [0x00] Magic "BDF4"             (4 bytes)
//! [0x04] Unk04, Unk05             (2 bools)
//! [0x06] 0, 0, 0                  (3 bytes)
//! [0x09] BigEndian                (bool)
//! [0x0A] BitBigEndian             (bool)
//! [0x0B] 0                        (1 byte)
//! [0x0C] 0                        (i32)
//! [0x10] HeaderSize (0x30/0x40)   (i64)
//! [0x18] Version                  (8-byte fixed string)
//! [0x20] 0                        (i64)
//! [....] File data (at HeaderSize)
//! ```

use log::debug;

use crate::bin::{BinReader, BoxedReader, IntoCursor};
use crate::compression::{Decompressor, Passthrough};
use crate::formats::binder::{
    assert_hash_table, bnd4_file_header_size, read_binder4_header, read_format,
    BinderFileHeader, Format,
};
use crate::{Error, Result};

use std::io::{Read, Seek};

/// Parsed BHF4 metadata.
#[derive(Debug)]
pub struct Bxf4 {
    /// Unknown header bool at 0x04.
    pub unk04: bool,
    /// Unknown header bool at 0x05.
    pub unk05: bool,
    /// Version string from the header stream.
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

impl Bxf4 {
    /// Whether `bytes` look like the start of a BHF4 header file.
    pub fn is_header(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BHF4"
    }

    /// Whether `bytes` look like the start of a BDF4 data file.
    pub fn is_data(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BDF4"
    }

    /// Parse a BHF4 header from `br`. File contents live elsewhere.
    pub fn parse<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        br.assert_magic(b"BHF4")?;
        let h = read_binder4_header(br)?;

        br.assert_i64(&[0x40], "header size")?;
        let version = br.fix_str(8)?;
        let file_header_size = br.i64()? as u64;
        br.assert_i64(&[0], "headers end")?;

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

/// Check the minimal BDF4 signature at the start of the data stream.
pub(crate) fn read_bdf4_header(br: &mut BoxedReader) -> Result<()> {
    br.assert_magic(b"BDF4")?;
    br.bool()?; // unk04
    br.bool()?; // unk05
    br.assert_u8(&[0], "data header padding")?;
    br.assert_u8(&[0], "data header padding")?;
    br.assert_u8(&[0], "data header padding")?;
    br.big_endian = br.bool()?;
    br.bool()?; // bit-big-endian
    br.assert_u8(&[0], "data header padding")?;
    br.assert_i32(&[0], "data header padding")?;
    br.assert_i64(&[0x30, 0x40], "data header size")?;
    br.fix_str(8)?; // version
    br.assert_i64(&[0], "data header padding")?;
    Ok(())
}

/// On-demand reader for BXF4 containers.
pub struct Bxf4Reader<D = Passthrough> {
    /// Parsed metadata.
    pub bxf: Bxf4,
    data: BoxedReader,
    decomp: D,
}

impl Bxf4Reader {
    /// Read a BXF4 from a header source (.bhd) and a data source (.bdt);
    /// each may independently be a path, byte buffer, or stream at
    /// position 0.
    pub fn new(header: impl IntoCursor, data: impl IntoCursor) -> Result<Self> {
        Self::with_decompressor(header, data, Passthrough)
    }
}

impl<D: Decompressor> Bxf4Reader<D> {
    /// Read a BXF4, letting `decomp` inflate compressed entries.
    pub fn with_decompressor(
        header: impl IntoCursor,
        data: impl IntoCursor,
        decomp: D,
    ) -> Result<Self> {
        let mut header_cursor = header.into_cursor()?;
        let mut data_cursor = data.into_cursor()?;

        read_bdf4_header(&mut data_cursor)?;
        let bxf = Bxf4::parse(&mut header_cursor)?;
        debug!("BXF4 {:?}: {} entries", bxf.version, bxf.files.len());

        Ok(Self {
            bxf,
            data: data_cursor,
            decomp,
        })
    }

    /// All file entries.
    pub fn files(&self) -> &[BinderFileHeader] {
        &self.bxf.files
    }

    /// Extract one entry's bytes from the data stream.
    pub fn read_file(&mut self, file: &BinderFileHeader) -> Result<Vec<u8>> {
        file.read_data(&mut self.data, &self.decomp)
    }

    /// Extract the entry at `index`.
    pub fn read_file_at(&mut self, index: usize) -> Result<Vec<u8>> {
        let count = self.bxf.files.len();
        let file = self
            .bxf
            .files
            .get(index)
            .cloned()
            .ok_or(Error::Index { index, count })?;
        self.read_file(&file)
    }
}
