//! BXF3 - split binder: a BHF3 header file (.bhd) plus a BDF3 data file
//! (.bdt).
//!
//! Entry metadata is identical to BND3; the difference is that headers and
//! data live in two separately supplied streams, and every data offset
//! addresses the data stream.
//!
//! ## BHF3 header stream
//! ```text
//! [0x00] Magic "BHF3"             (4 bytes)
//! [0x04] Version                  (8-byte fixed string)
//! [0x0C] Format / BigEndian / BitBigEndian / 0   (4 bytes, as BND3)
//! [0x10] FileCount                (i32)
//! [0x14] 0, 0, 0                  (3 x i32)
//! [0x20] FileHeaders              (BND3-shaped entries)
//! ```
//!
//! ## BDF3 data stream
//! ```text
//! [0x00] Magic "BDF3"             (4 bytes)
//! [0x04] Version                  (8-byte fixed string)
//! [0x0C] 0                        (i32)
//! [0x10] File data
//! ```

use log::debug;

use crate::bin::{BinReader, BoxedReader, IntoCursor};
use crate::compression::{Decompressor, Passthrough};
use crate::formats::binder::{read_binder3_header, BinderFileHeader, Format};
use crate::{Error, Result};

use std::io::{Read, Seek};

/// Parsed BHF3 metadata.
#[derive(Debug)]
pub struct Bxf3 {
    /// Version string from the header stream.
    pub version: String,
    /// Feature flags for the whole binder.
    pub format: Format,
    /// Whether the header declared itself big-endian.
    pub big_endian: bool,
    /// Whether flag bytes are stored in big bit order.
    pub bit_big_endian: bool,
    /// All file entries in declaration order.
    pub files: Vec<BinderFileHeader>,
}

impl Bxf3 {
    /// Whether `bytes` look like the start of a BHF3 header file.
    pub fn is_header(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BHF3"
    }

    /// Whether `bytes` look like the start of a BDF3 data file.
    pub fn is_data(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BDF3"
    }

    /// Parse a BHF3 header from `br`. File contents live elsewhere.
    pub fn parse<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        br.assert_magic(b"BHF3")?;
        let h = read_binder3_header(br)?;

        br.assert_i32(&[0], "header padding")?;
        br.assert_i32(&[0], "header padding")?;
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
            files,
        })
    }
}

/// Check the minimal BDF3 signature at the start of the data stream.
pub(crate) fn read_bdf3_header(br: &mut BoxedReader) -> Result<()> {
    br.assert_magic(b"BDF3")?;
    br.fix_str(8)?; // version
    br.assert_i32(&[0], "data header padding")?;
    Ok(())
}

/// On-demand reader for BXF3 containers.
///
/// Owns both cursors; the header cursor is released as soon as parsing
/// finishes, the data cursor when the reader drops.
pub struct Bxf3Reader<D = Passthrough> {
    /// Parsed metadata.
    pub bxf: Bxf3,
    data: BoxedReader,
    decomp: D,
}

impl Bxf3Reader {
    /// Read a BXF3 from a header source (.bhd) and a data source (.bdt);
    /// each may independently be a path, byte buffer, or stream at
    /// position 0.
    pub fn new(header: impl IntoCursor, data: impl IntoCursor) -> Result<Self> {
        Self::with_decompressor(header, data, Passthrough)
    }
}

impl<D: Decompressor> Bxf3Reader<D> {
    /// Read a BXF3, letting `decomp` inflate compressed entries.
    pub fn with_decompressor(
        header: impl IntoCursor,
        data: impl IntoCursor,
        decomp: D,
    ) -> Result<Self> {
        let mut header_cursor = header.into_cursor()?;
        let mut data_cursor = data.into_cursor()?;

        // Sniff the data stream before committing to the header parse; both
        // cursors drop on the way out of any failure.
        read_bdf3_header(&mut data_cursor)?;
        let bxf = Bxf3::parse(&mut header_cursor)?;
        debug!("BXF3 {:?}: {} entries", bxf.version, bxf.files.len());

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
