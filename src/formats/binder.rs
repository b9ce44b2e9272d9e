//! Common format information for BND3, BXF3, BND4, and BXF4.
//!
//! Every binder stores one feature-flags byte ([`Format`]) describing which
//! optional fields its entries carry, and one flags byte per entry
//! ([`FileFlags`]). Both bytes may be stored bit-reversed depending on the
//! platform; [`read_format`] applies the historical heuristic for detecting
//! the orientation and [`write_format`] applies the (deliberately different)
//! condition the original tooling uses when writing. Do not unify the two -
//! reference files round-trip through this exact pair.
//!
//! Entry metadata is the shared [`BinderFileHeader`] record; the
//! version-specific entry layouts are parsed by
//! [`BinderFileHeader::read_bnd3`] / [`BinderFileHeader::read_bnd4`] and the
//! containers in [`bnd3`](crate::formats::bnd3) et al. wrap them with lazy
//! data access.

use bitflags::bitflags;

use crate::bin::{BinReader, BinWriter, BoxedReader};
use crate::compression::Decompressor;
use crate::{Error, Result};

use std::io::{Read, Seek, Write};

bitflags! {
    /// Features supported by a binder, one byte on disk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Format: u8 {
        /// File is big-endian regardless of the big-endian byte.
        const BIG_ENDIAN = 0b0000_0001;
        /// Files have ID numbers.
        const IDS = 0b0000_0010;
        /// Files have name strings; meaning relative to NAMES_2 unclear.
        const NAMES_1 = 0b0000_0100;
        /// Files have name strings.
        const NAMES_2 = 0b0000_1000;
        /// File data offsets are 64-bit.
        const LONG_OFFSETS = 0b0001_0000;
        /// Files may be compressed.
        const COMPRESSION = 0b0010_0000;
        /// Unknown.
        const FLAG_6 = 0b0100_0000;
        /// Unknown.
        const FLAG_7 = 0b1000_0000;
    }
}

impl Format {
    /// Whether the file is big-endian regardless of the big-endian byte.
    pub fn force_big_endian(self) -> bool {
        self.contains(Format::BIG_ENDIAN)
    }

    /// Whether entries carry ID numbers.
    pub fn has_ids(self) -> bool {
        self.contains(Format::IDS)
    }

    /// Whether entries carry name strings.
    pub fn has_names(self) -> bool {
        self.intersects(Format::NAMES_1 | Format::NAMES_2)
    }

    /// Whether data offsets are 64-bit.
    pub fn has_long_offsets(self) -> bool {
        self.contains(Format::LONG_OFFSETS)
    }

    /// Whether entries may be compressed.
    pub fn has_compression(self) -> bool {
        self.contains(Format::COMPRESSION)
    }
}

bitflags! {
    /// Per-entry feature flags, one byte on disk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u8 {
        /// Entry data is compressed.
        const COMPRESSED = 0b0000_0001;
        /// Unknown; set on essentially every file.
        const FLAG_1 = 0b0000_0010;
        /// Unknown.
        const FLAG_2 = 0b0000_0100;
        /// Unknown.
        const FLAG_3 = 0b0000_1000;
        /// Unknown.
        const FLAG_4 = 0b0001_0000;
        /// Unknown.
        const FLAG_5 = 0b0010_0000;
        /// Unknown.
        const FLAG_6 = 0b0100_0000;
        /// Unknown.
        const FLAG_7 = 0b1000_0000;
    }
}

/// Read a binder format byte, un-reversing it if necessary.
///
/// On little-bit-endian platforms the byte is stored reversed; "IDs bit set,
/// Flag7 clear" in the raw byte is taken as a signature that it is already
/// correctly oriented.
pub fn read_format<R: Read + Seek>(br: &mut BinReader<R>, bit_big_endian: bool) -> Result<Format> {
    let raw = br.u8()?;
    let reverse = bit_big_endian || (raw & 1) != 0 && (raw & 0b1000_0000) == 0;
    let bits = if reverse { raw } else { raw.reverse_bits() };
    Ok(Format::from_bits_retain(bits))
}

/// Write a binder format byte, reversing it if necessary.
///
/// The condition is intentionally not the mirror of [`read_format`]; it is
/// what the original tooling does, and reference files depend on it.
pub fn write_format<W: Write + Seek>(
    bw: &mut BinWriter<W>,
    bit_big_endian: bool,
    format: Format,
) -> Result<()> {
    let reverse = bit_big_endian || (format.force_big_endian() && format.contains(Format::FLAG_6));
    let raw = if reverse {
        format.bits()
    } else {
        format.bits().reverse_bits()
    };
    bw.u8(raw)
}

/// Read a per-entry flags byte; reversal follows the bit-endianness alone.
pub fn read_file_flags<R: Read + Seek>(
    br: &mut BinReader<R>,
    bit_big_endian: bool,
) -> Result<FileFlags> {
    let raw = br.u8()?;
    let bits = if bit_big_endian { raw } else { raw.reverse_bits() };
    Ok(FileFlags::from_bits_retain(bits))
}

/// Write a per-entry flags byte; reversal follows the bit-endianness alone.
pub fn write_file_flags<W: Write + Seek>(
    bw: &mut BinWriter<W>,
    bit_big_endian: bool,
    flags: FileFlags,
) -> Result<()> {
    let bits = flags.bits();
    bw.u8(if bit_big_endian { bits } else { bits.reverse_bits() })
}

/// Size in bytes of one BND4/BXF4 file header for `format`.
pub fn bnd4_file_header_size(format: Format) -> u64 {
    let offset = if format.has_long_offsets() { 8 } else { 4 };
    let compression = if format.has_compression() { 8 } else { 0 };
    let ids = if format.has_ids() { 4 } else { 0 };
    let names = if format.has_names() { 4 } else { 0 };
    let bare_names1 = if format == Format::NAMES_1 { 8 } else { 0 };
    0x10 + offset + compression + ids + names + bare_names1
}

/// Metadata for one file inside a BND3/BND4/BXF3/BXF4.
///
/// Created when the container header is parsed; the payload itself is only
/// touched by [`read_file`](crate::formats::bnd3::Bnd3Reader::read_file).
#[derive(Debug, Clone)]
pub struct BinderFileHeader {
    /// Per-entry feature flags.
    pub flags: FileFlags,
    /// ID number, if the format has IDs.
    pub id: Option<i32>,
    /// Name, if the format has names.
    pub name: Option<String>,
    /// Size of the entry's data as stored.
    pub compressed_size: u64,
    /// Size after decompression, if the format records it.
    pub uncompressed_size: Option<u64>,
    /// Absolute offset of the entry's data in the data stream.
    pub data_offset: u64,
}

impl BinderFileHeader {
    /// Parse one BND3/BXF3 entry.
    pub(crate) fn read_bnd3<R: Read + Seek>(
        br: &mut BinReader<R>,
        format: Format,
        bit_big_endian: bool,
    ) -> Result<Self> {
        let flags = read_file_flags(br, bit_big_endian)?;
        br.assert_u8(&[0], "file header padding")?;
        br.assert_u8(&[0], "file header padding")?;
        br.assert_u8(&[0], "file header padding")?;

        let compressed_size = br.u32()? as u64;
        let data_offset = if format.has_long_offsets() {
            br.i64()? as u64
        } else {
            br.u32()? as u64
        };

        let id = if format.has_ids() { Some(br.i32()?) } else { None };

        let name = if format.has_names() {
            let name_offset = br.u32()?;
            Some(br.get_shift_jis(name_offset as u64)?)
        } else {
            None
        };

        let uncompressed_size = if format.has_compression() {
            Some(br.u32()? as u64)
        } else {
            None
        };

        Ok(Self {
            flags,
            id,
            name,
            compressed_size,
            uncompressed_size,
            data_offset,
        })
    }

    /// Parse one BND4/BXF4 entry.
    pub(crate) fn read_bnd4<R: Read + Seek>(
        br: &mut BinReader<R>,
        format: Format,
        bit_big_endian: bool,
        unicode: bool,
    ) -> Result<Self> {
        let flags = read_file_flags(br, bit_big_endian)?;
        br.assert_u8(&[0], "file header padding")?;
        br.assert_u8(&[0], "file header padding")?;
        br.assert_u8(&[0], "file header padding")?;
        br.assert_i32(&[-1], "file header filler")?;

        let compressed_size = br.i64()? as u64;
        let uncompressed_size = if format.has_compression() {
            Some(br.i64()? as u64)
        } else {
            None
        };

        let data_offset = if format.has_long_offsets() {
            br.i64()? as u64
        } else {
            br.u32()? as u64
        };

        let mut id = if format.has_ids() { Some(br.i32()?) } else { None };

        let name = if format.has_names() {
            let name_offset = br.u32()?;
            Some(if unicode {
                br.get_utf16(name_offset as u64)?
            } else {
                br.get_shift_jis(name_offset as u64)?
            })
        } else {
            None
        };

        // The bare-Names1 layout stores the ID after the name offset instead.
        if format == Format::NAMES_1 {
            id = Some(br.i32()?);
            br.assert_i32(&[0], "file header tail")?;
        }

        Ok(Self {
            flags,
            id,
            name,
            compressed_size,
            uncompressed_size,
            data_offset,
        })
    }

    /// Fetch this entry's bytes from `br`, inflating if the entry is
    /// compressed. Re-readable; the cursor position is not preserved.
    pub(crate) fn read_data<D: Decompressor>(
        &self,
        br: &mut BoxedReader,
        decomp: &D,
    ) -> Result<Vec<u8>> {
        let bytes = br.get_bytes(self.data_offset, self.compressed_size as usize)?;
        if self.flags.contains(FileFlags::COMPRESSED) {
            let method = decomp
                .sniff(&bytes)
                .ok_or(Error::Format("unrecognized compression envelope"))?;
            return decomp.decompress(&bytes, method);
        }
        Ok(bytes)
    }
}

/// The shared BND3/BHF3 prelude after the magic: version, flag bytes, and
/// file count, with the stream endianness resolved.
pub(crate) struct Binder3Header {
    pub version: String,
    pub format: Format,
    pub big_endian: bool,
    pub bit_big_endian: bool,
    pub file_count: u32,
}

pub(crate) fn read_binder3_header<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Binder3Header> {
    let version = br.fix_str(8)?;

    // The format byte's orientation depends on the bit-endian byte that
    // follows it, so peek ahead.
    let bit_big_endian = br.bool_at(0xE)?;

    let format = read_format(br, bit_big_endian)?;
    let big_endian = br.bool()?;
    br.assert_bool(bit_big_endian, "bit-endianness byte")?;
    br.assert_u8(&[0], "header padding")?;

    br.big_endian = big_endian || format.force_big_endian();
    let file_count = br.u32()?;

    Ok(Binder3Header {
        version,
        format,
        big_endian,
        bit_big_endian,
        file_count,
    })
}

/// The shared BND4/BHF4 prelude after the magic, up to the file count.
pub(crate) struct Binder4Header {
    pub unk04: bool,
    pub unk05: bool,
    pub big_endian: bool,
    pub bit_big_endian: bool,
    pub file_count: u32,
}

pub(crate) fn read_binder4_header<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Binder4Header> {
    let unk04 = br.bool()?;
    let unk05 = br.bool()?;
    br.assert_u8(&[0], "header padding")?;
    br.assert_u8(&[0], "header padding")?;
    br.assert_u8(&[0], "header padding")?;
    let big_endian = br.bool()?;
    let bit_big_endian = !br.bool()?;
    br.assert_u8(&[0], "header padding")?;

    br.big_endian = big_endian;
    let file_count = br.u32()?;

    Ok(Binder4Header {
        unk04,
        unk05,
        big_endian,
        bit_big_endian,
        file_count,
    })
}

/// Validate the BND4 filename hash table layout at the current position.
pub(crate) fn assert_hash_table<R: Read + Seek>(br: &mut BinReader<R>) -> Result<()> {
    br.i64()?; // path hashes offset
    br.u32()?; // hash group count
    br.assert_u8(&[0x10], "hash table header size")?;
    br.assert_u8(&[8], "hash group size")?;
    br.assert_u8(&[8], "path hash size")?;
    br.assert_u8(&[0], "hash table padding")?;
    Ok(())
}

/// A BND/BXF version timestamp, e.g. `07D7R6` - two-digit year, letter-coded
/// month, day, letter-coded hour, minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Full year (2000-2099).
    pub year: u16,
    /// Month 1-12.
    pub month: u8,
    /// Day of month.
    pub day: u8,
    /// Hour 0-23.
    pub hour: u8,
    /// Minute 0-59.
    pub minute: u8,
}

impl Timestamp {
    /// Parse a timestamp string as found in a binder version field.
    pub fn parse(s: &str) -> Result<Self> {
        const ERR: Error = Error::Format("unrecognized timestamp");
        let b = s.as_bytes();

        if b.len() < 6
            || !b[0].is_ascii_digit()
            || !b[1].is_ascii_digit()
            || !b[2].is_ascii_uppercase()
        {
            return Err(ERR);
        }
        let year = 2000 + (b[0] - b'0') as u16 * 10 + (b[1] - b'0') as u16;
        let month = b[2] - b'A';

        let mut i = 3;
        let mut day = 0u32;
        let day_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            day = day * 10 + (b[i] - b'0') as u32;
            i += 1;
        }
        if i == day_start || i >= b.len() || !b[i].is_ascii_uppercase() || day > 31 {
            return Err(ERR);
        }
        let hour = b[i] - b'A';
        i += 1;

        let mut minute = 0u32;
        let minute_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            minute = minute * 10 + (b[i] - b'0') as u32;
            i += 1;
        }
        if i == minute_start || minute > 59 {
            return Err(ERR);
        }

        Ok(Self {
            year,
            month,
            day: day as u8,
            hour,
            minute: minute as u8,
        })
    }

    /// Format as a binder version string (unpadded; version fields null-pad
    /// to 8 bytes on write).
    pub fn format(&self) -> Result<String> {
        if !(2000..=2099).contains(&self.year) {
            return Err(Error::Format("timestamp year must be 2000-2099"));
        }
        Ok(format!(
            "{:02}{}{}{}{}",
            self.year - 2000,
            (b'A' + self.month) as char,
            self.day,
            (b'A' + self.hour) as char,
            self.minute
        ))
    }
}
