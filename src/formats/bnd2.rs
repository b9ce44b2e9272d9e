//! BND2 - the early path-keyed binder (versions 202 and 211).
//!
//! Predates the format-flags byte of BND3; instead a path mode selects how
//! entry names are stored, and an alignment size governs the padding
//! inserted between payload blocks (readers just follow the stored
//! offsets). Never wrapped in an outer compression envelope.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "BND\0"            (4 bytes)
//! [0x04] HeaderInfoFlags          (1 byte)
//! [0x05] FileInfoFlags            (1 byte)
//! [0x06] 0                        (1 byte)
//! [0x07] 0 or 1                   (1 byte)
//! [0x08] FileVersion (202/211)    (i32)
//! [0x0C] FileSize                 (i32, ignored)
//! [0x10] FileCount                (i32)
//! [0x14] AlignmentSize            (u16)
//! [0x16] FilePathMode             (1 byte)
//! [0x17] Unk1B (0/1)              (1 byte)
//! [0x18] 0                        (i32)
//! [0x1C] BaseDirectory            (null-terminated Shift-JIS, mode 3 only)
//! [...]  FileHeaders              (FileCount entries)
//! ```
//!
//! ## File Header
//! ```text
//! [0x00] ID                       (i32)
//! [0x04] Offset                   (u32)
//! [0x08] Size                     (u32)
//! [0x0C] NameOffset               (u32 -> Shift-JIS, any mode but Nameless)
//! ```

use log::debug;

use crate::bin::{BinReader, BoxedReader, IntoCursor};
use crate::{Error, Result};

use std::io::{Read, Seek};

/// How BND2 entry paths are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePathMode {
    /// Entries have no names at all.
    Nameless = 0,
    /// Entries store a bare file name.
    FileName = 1,
    /// Entries store a full path.
    FullPath = 2,
    /// Entries store paths relative to a shared base directory.
    BaseDirectory = 3,
}

impl FilePathMode {
    fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::Nameless),
            1 => Ok(Self::FileName),
            2 => Ok(Self::FullPath),
            3 => Ok(Self::BaseDirectory),
            _ => Err(Error::Format("file path mode")),
        }
    }
}

/// Metadata for one file inside a BND2.
#[derive(Debug, Clone)]
pub struct Bnd2FileHeader {
    /// ID number.
    pub id: i32,
    /// Absolute offset of the entry's data.
    pub offset: u32,
    /// Size of the entry's data in bytes.
    pub size: u32,
    /// Name, unless the archive is nameless.
    pub name: Option<String>,
}

/// Parsed BND2 metadata.
#[derive(Debug)]
pub struct Bnd2 {
    /// Header info flags; meaning unknown.
    pub header_info_flags: u8,
    /// File info flags; meaning unknown.
    pub file_info_flags: u8,
    /// Unknown byte at 0x07; 1 on files dumped from memory.
    pub unk07: u8,
    /// Format version; only 202 and 211 have been seen.
    pub version: i32,
    /// Payload block alignment used when the archive was written.
    pub alignment: u16,
    /// How entry paths are stored.
    pub path_mode: FilePathMode,
    /// Unknown byte at 0x17.
    pub unk1b: u8,
    /// Shared base directory, in base-directory mode.
    pub base_directory: Option<String>,
    /// All file entries in declaration order.
    pub files: Vec<Bnd2FileHeader>,
}

impl Bnd2 {
    /// Whether `bytes` look like the start of a BND2.
    pub fn is(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BND\0"
    }

    /// Parse a BND2 header from `br`. File contents are not read.
    pub fn parse<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        br.assert_magic(b"BND\0")?;
        let header_info_flags = br.u8()?;
        let file_info_flags = br.u8()?;
        br.assert_u8(&[0], "header padding")?;
        let unk07 = br.assert_u8(&[0, 1], "unk07")?;
        let version = br.assert_i32(&[202, 211], "file version")?;
        br.i32()?; // file size
        let file_count = br.i32()?;
        let alignment = br.u16()?;
        let path_mode = FilePathMode::from_u8(br.u8()?)?;
        let unk1b = br.assert_u8(&[0, 1], "unk1B")?;
        br.assert_i32(&[0], "header padding")?;

        let base_directory = if path_mode == FilePathMode::BaseDirectory {
            Some(br.shift_jis_cstr()?)
        } else {
            None
        };

        let mut files = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            let id = br.i32()?;
            let offset = br.u32()?;
            let size = br.u32()?;
            let name = if path_mode != FilePathMode::Nameless {
                let name_offset = br.u32()?;
                Some(br.get_shift_jis(name_offset as u64)?)
            } else {
                None
            };
            files.push(Bnd2FileHeader {
                id,
                offset,
                size,
                name,
            });
        }

        Ok(Self {
            header_info_flags,
            file_info_flags,
            unk07,
            version,
            alignment,
            path_mode,
            unk1b,
            base_directory,
            files,
        })
    }
}

/// On-demand reader for BND2 containers.
pub struct Bnd2Reader {
    /// Parsed metadata.
    pub bnd: Bnd2,
    data: BoxedReader,
}

impl Bnd2Reader {
    /// Read a BND2 from a path, byte buffer, or stream at position 0.
    pub fn new(source: impl IntoCursor) -> Result<Self> {
        let mut cursor = source.into_cursor()?;
        let bnd = Bnd2::parse(&mut cursor)?;
        debug!("BND2 v{}: {} entries", bnd.version, bnd.files.len());
        Ok(Self { bnd, data: cursor })
    }

    /// All file entries.
    pub fn files(&self) -> &[Bnd2FileHeader] {
        &self.bnd.files
    }

    /// Extract one entry's bytes.
    pub fn read_file(&mut self, file: &Bnd2FileHeader) -> Result<Vec<u8>> {
        self.data.get_bytes(file.offset as u64, file.size as usize)
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

    fn build_bnd2(
        path_mode: FilePathMode,
        base_dir: Option<&str>,
        entries: &[(i32, Option<&str>, &[u8])],
    ) -> Vec<u8> {
        let alignment: u16 = 0x20;
        let mut bw = BinWriter::memory();
        bw.bytes(b"BND\0").unwrap();
        bw.u8(0).unwrap();
        bw.u8(0).unwrap();
        bw.u8(0).unwrap();
        bw.u8(0).unwrap();
        bw.i32(202).unwrap();
        let file_size = bw.reserve_u32().unwrap();
        bw.i32(entries.len() as i32).unwrap();
        bw.u16(alignment).unwrap();
        bw.u8(path_mode as u8).unwrap();
        bw.u8(0).unwrap();
        bw.i32(0).unwrap();
        if let Some(dir) = base_dir {
            bw.bytes(dir.as_bytes()).unwrap();
            bw.u8(0).unwrap();
        }

        let mut tokens = Vec::new();
        for (id, _, data) in entries {
            bw.i32(*id).unwrap();
            let offset = bw.reserve_u32().unwrap();
            bw.u32(data.len() as u32).unwrap();
            let name = if path_mode != FilePathMode::Nameless {
                Some(bw.reserve_u32().unwrap())
            } else {
                None
            };
            tokens.push((offset, name));
        }

        let mut name_positions = Vec::new();
        for (_, name, _) in entries {
            if let Some(name) = name {
                name_positions.push(bw.position().unwrap() as u32);
                bw.bytes(name.as_bytes()).unwrap();
                bw.u8(0).unwrap();
            } else {
                name_positions.push(0);
            }
        }

        let mut data_positions = Vec::new();
        for (_, _, data) in entries {
            // Pad up to the alignment boundary the way the writer would.
            let pos = bw.position().unwrap();
            let pad = (alignment as u64 - pos % alignment as u64) % alignment as u64;
            for _ in 0..pad {
                bw.u8(0).unwrap();
            }
            data_positions.push(bw.position().unwrap() as u32);
            bw.bytes(data).unwrap();
        }

        for (((offset, name_token), pos), name_pos) in
            tokens.into_iter().zip(data_positions).zip(name_positions)
        {
            bw.fill_u32(offset, pos).unwrap();
            if let Some(t) = name_token {
                bw.fill_u32(t, name_pos).unwrap();
            }
        }
        let end = bw.position().unwrap() as u32;
        bw.fill_u32(file_size, end).unwrap();
        bw.into_bytes()
    }

    #[test]
    fn full_path_mode_round_trip() {
        let bytes = build_bnd2(
            FilePathMode::FullPath,
            None,
            &[
                (0, Some("data\\model\\a.bin"), b"model a"),
                (1, Some("data\\model\\b.bin"), b"model b bytes"),
            ],
        );
        let mut reader = Bnd2Reader::new(bytes).unwrap();
        assert_eq!(reader.bnd.version, 202);
        assert_eq!(reader.bnd.path_mode, FilePathMode::FullPath);
        assert_eq!(reader.bnd.alignment, 0x20);
        assert_eq!(reader.files()[0].name.as_deref(), Some("data\\model\\a.bin"));
        assert_eq!(reader.read_file_at(0).unwrap(), b"model a");
        assert_eq!(reader.read_file_at(1).unwrap(), b"model b bytes");
        // Alignment-driven padding keeps payload offsets on the boundary.
        assert_eq!(reader.files()[1].offset % 0x20, 0);
    }

    #[test]
    fn base_directory_mode_carries_the_directory() {
        let bytes = build_bnd2(
            FilePathMode::BaseDirectory,
            Some("bind\\"),
            &[(7, Some("a.bin"), b"payload")],
        );
        let reader = Bnd2Reader::new(bytes).unwrap();
        assert_eq!(reader.bnd.base_directory.as_deref(), Some("bind\\"));
        assert_eq!(reader.files()[0].name.as_deref(), Some("a.bin"));
    }

    #[test]
    fn nameless_mode_has_no_names() {
        let bytes = build_bnd2(FilePathMode::Nameless, None, &[(1, None, b"anon")]);
        let mut reader = Bnd2Reader::new(bytes).unwrap();
        assert_eq!(reader.files()[0].name, None);
        assert_eq!(reader.read_file_at(0).unwrap(), b"anon");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = build_bnd2(FilePathMode::Nameless, None, &[]);
        bytes[8] = 0xCB; // version 203
        assert!(matches!(Bnd2Reader::new(bytes), Err(Error::Format(_))));
    }
}
