//! BHD5 - the header file of the dvdbnd container format.
//!
//! A dvdbnd packages every game file into one flat data file (.bdt)
//! addressed by a BHD5 header. Files carry no names, only a hash of their
//! full path; headers are grouped into buckets by `hash % bucket_count` so
//! lookup touches a single short list.
//!
//! Four header generations exist, told apart not by the file but by the
//! [`Game`] the caller supplies; later generations add per-file AES
//! metadata, honest (unpadded) sizes, and 64-bit hashes.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "BHD5"             (4 bytes)
//! [0x04] Endianness (0=BE, -1=LE) (i8)
//! [0x05] Unk05                    (bool)
//! [0x06] 0, 0                     (2 bytes)
//! [0x08] Version (1)              (i32)
//! [0x0C] FileSize                 (i32, ignored on read)
//! [0x10] BucketCount              (i32)
//! [0x14] BucketsOffset            (i32)
//! [0x18] SaltLength + Salt        (i32 + ASCII, DS2 onward; no padding)
//! [....] Buckets                  (BucketCount x {FileHeaderCount, FileHeadersOffset})
//! [....] FileHeaders, then SHA/AES records
//! ```
//!
//! ## File header by generation
//! * **Elden Ring**: u64 hash, i32 padded size, i32 unpadded size (stored
//!   narrowed from its logical 64 bits), i64 offset, i64 SHA offset, i64
//!   AES offset.
//! * **Earlier**: u32 hash, i32 padded size, i64 offset; DS2 onward adds
//!   i64 SHA/AES offsets; DS3 onward adds an i64 unpadded size (absent
//!   fields read as the -1 sentinel).
//!
//! A SHA/AES offset of 0 means "absent" - position 0 is always the main
//! header, never a record.

use log::debug;

use crate::bin::{pos32, BinReader, BinWriter, IntoCursor, ReservedU64};
use crate::crypto::aes::CbcDecryptor;
use crate::hash::{path_hash_32, path_hash_64};
use crate::{Error, Result};

use std::io::{Read, Seek, SeekFrom, Write};

/// The dvdbnd format generation, ordered by release.
///
/// Capabilities are gated by comparison, not identity; see
/// [`encryption_supported`](Game::encryption_supported) and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Game {
    /// Dark Souls 1, PC and console. The first known format.
    DarkSouls1,
    /// Dark Souls 2 (and Scholar) on PC. Adds AES encryption and salting.
    DarkSouls2,
    /// Dark Souls 3 and Sekiro on PC. Adds unpadded size fields.
    DarkSouls3,
    /// Elden Ring on PC. Widens hashes and offsets to 64 bits and narrows
    /// the unpadded size to 32 bits on disk.
    EldenRing,
}

impl Game {
    /// Whether this generation supports per-file AES metadata.
    pub fn encryption_supported(self) -> bool {
        self >= Game::DarkSouls2
    }

    /// Whether this generation records unpadded file sizes.
    pub fn unpadded_size_supported(self) -> bool {
        self >= Game::DarkSouls3
    }

    /// Whether this generation upgraded many fields to 64 bits.
    pub fn long_fields_supported(self) -> bool {
        self >= Game::DarkSouls3
    }
}

/// A hashed or encrypted byte span of a file, half-open.
///
/// `(-1, -1)` or an empty span means "skip".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Start of the range, inclusive.
    pub start: i64,
    /// End of the range, exclusive.
    pub end: i64,
}

impl Range {
    /// Whether this range contributes no bytes.
    pub fn is_skip(&self) -> bool {
        self.start == -1 || self.end == -1 || self.start == self.end
    }

    fn read<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        Ok(Self {
            start: br.i64()?,
            end: br.i64()?,
        })
    }

    fn write<W: Write + Seek>(&self, bw: &mut BinWriter<W>) -> Result<()> {
        bw.i64(self.start)?;
        bw.i64(self.end)
    }
}

/// Salted SHA hash record for one file: a 32-byte digest plus the byte
/// spans that contributed to it.
///
/// The digest is carried verbatim; this library never recomputes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaHash {
    /// 32-byte salted digest.
    pub hash: [u8; 32],
    /// Hashed sections of the file.
    pub ranges: Vec<Range>,
}

impl ShaHash {
    fn read<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        let hash = br.bytesa::<32>()?;
        let range_count = br.i32()?;
        let mut ranges = Vec::with_capacity(range_count as usize);
        for _ in 0..range_count {
            ranges.push(Range::read(br)?);
        }
        Ok(Self { hash, ranges })
    }

    fn write<W: Write + Seek>(&self, bw: &mut BinWriter<W>) -> Result<()> {
        bw.bytes(&self.hash)?;
        bw.i32(self.ranges.len() as i32)?;
        for range in &self.ranges {
            range.write(bw)?;
        }
        Ok(())
    }
}

/// AES encryption record for one file: a 16-byte key plus the byte spans
/// that are encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AesKey {
    /// 16-byte AES-128 key.
    pub key: [u8; 16],
    /// Encrypted sections of the file.
    pub ranges: Vec<Range>,
}

impl AesKey {
    fn read<R: Read + Seek>(br: &mut BinReader<R>) -> Result<Self> {
        let key = br.bytesa::<16>()?;
        let range_count = br.i32()?;
        let mut ranges = Vec::with_capacity(range_count as usize);
        for _ in 0..range_count {
            ranges.push(Range::read(br)?);
        }
        Ok(Self { key, ranges })
    }

    fn write<W: Write + Seek>(&self, bw: &mut BinWriter<W>) -> Result<()> {
        bw.bytes(&self.key)?;
        bw.i32(self.ranges.len() as i32)?;
        for range in &self.ranges {
            range.write(bw)?;
        }
        Ok(())
    }

    /// Decrypt file data in place.
    ///
    /// One AES-128-CBC chain with a zero IV runs through the ranges in list
    /// order; skipped and degenerate ranges contribute nothing but do not
    /// reset the chain. Bytes outside all ranges are untouched.
    pub fn decrypt(&self, bytes: &mut [u8]) -> Result<()> {
        let mut decryptor = CbcDecryptor::new(&self.key);
        for range in self.ranges.iter().filter(|r| !r.is_skip()) {
            if range.start < 0 || range.end < range.start {
                return Err(Error::Format("encrypted range is invalid"));
            }
            let (start, end) = (range.start as usize, range.end as usize);
            if end > bytes.len() {
                return Err(Error::Format("encrypted range out of bounds"));
            }
            decryptor.decrypt_in_place(&mut bytes[start..end])?;
        }
        Ok(())
    }
}

/// Information about one file in the dvdbnd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Hash of the full file path; 32-bit before Elden Ring.
    pub file_name_hash: u64,
    /// Size of the file's data in the BDT, padding included.
    pub padded_file_size: u32,
    /// Size after decryption; -1 when the generation does not record it.
    pub unpadded_file_size: i64,
    /// Start of the file's data in the BDT.
    pub file_offset: u64,
    /// Hashing information, if present.
    pub sha_hash: Option<ShaHash>,
    /// Encryption information, if present.
    pub aes_key: Option<AesKey>,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            file_name_hash: 0,
            padded_file_size: 0,
            unpadded_file_size: -1,
            file_offset: 0,
            sha_hash: None,
            aes_key: None,
        }
    }
}

impl FileHeader {
    fn read<R: Read + Seek>(br: &mut BinReader<R>, game: Game) -> Result<Self> {
        let mut sha_hash_offset = 0i64;
        let mut aes_key_offset = 0i64;
        let mut unpadded_file_size = -1i64;

        let file_name_hash;
        let padded_file_size;
        let file_offset;
        if game >= Game::EldenRing {
            file_name_hash = br.u64()?;
            padded_file_size = br.u32()?;
            unpadded_file_size = br.i32()? as i64; // narrowed on disk
            file_offset = br.i64()? as u64;
            sha_hash_offset = br.i64()?;
            aes_key_offset = br.i64()?;
        } else {
            file_name_hash = br.u32()? as u64;
            padded_file_size = br.u32()?;
            file_offset = br.i64()? as u64;

            if game >= Game::DarkSouls2 {
                sha_hash_offset = br.i64()?;
                aes_key_offset = br.i64()?;
            }
            if game >= Game::DarkSouls3 {
                unpadded_file_size = br.i64()?;
            }
        }

        let sha_hash = if sha_hash_offset != 0 {
            Some(br.step_in(sha_hash_offset as u64, ShaHash::read)?)
        } else {
            None
        };

        let aes_key = if aes_key_offset != 0 {
            Some(br.step_in(aes_key_offset as u64, AesKey::read)?)
        } else {
            None
        };

        Ok(Self {
            file_name_hash,
            padded_file_size,
            unpadded_file_size,
            file_offset,
            sha_hash,
            aes_key,
        })
    }

    /// Write the fixed part of the header, returning the reserved SHA/AES
    /// offset fields for the backfill pass (absent before DS2).
    fn write<W: Write + Seek>(
        &self,
        bw: &mut BinWriter<W>,
        game: Game,
    ) -> Result<Option<(ReservedU64, ReservedU64)>> {
        if game >= Game::EldenRing {
            bw.u64(self.file_name_hash)?;
            bw.u32(self.padded_file_size)?;
            bw.i32(self.unpadded_file_size as i32)?; // sanctioned narrowing
            bw.i64(self.file_offset as i64)?;
            let sha = bw.reserve_u64()?;
            let aes = bw.reserve_u64()?;
            Ok(Some((sha, aes)))
        } else {
            let hash = u32::try_from(self.file_name_hash)
                .map_err(|_| Error::Unsupported("file name hash does not fit in 32 bits"))?;
            bw.u32(hash)?;
            bw.u32(self.padded_file_size)?;
            bw.i64(self.file_offset as i64)?;

            let tokens = if game >= Game::DarkSouls2 {
                let sha = bw.reserve_u64()?;
                let aes = bw.reserve_u64()?;
                Some((sha, aes))
            } else {
                None
            };
            if game >= Game::DarkSouls3 {
                bw.i64(self.unpadded_file_size)?;
            }
            Ok(tokens)
        }
    }

    /// Fill this file's SHA/AES offset fields and append the records.
    fn write_sha_and_key<W: Write + Seek>(
        &self,
        bw: &mut BinWriter<W>,
        tokens: Option<(ReservedU64, ReservedU64)>,
    ) -> Result<()> {
        let Some((sha_token, aes_token)) = tokens else {
            return Ok(());
        };
        match &self.sha_hash {
            Some(sha) => {
                let pos = bw.position()?;
                bw.fill_u64(sha_token, pos)?;
                sha.write(bw)?;
            }
            None => bw.fill_u64(sha_token, 0)?,
        }
        match &self.aes_key {
            Some(aes) => {
                let pos = bw.position()?;
                bw.fill_u64(aes_token, pos)?;
                aes.write(bw)?;
            }
            None => bw.fill_u64(aes_token, 0)?,
        }
        Ok(())
    }

    /// Read this file's data from the BDT, decrypting if necessary.
    pub fn read_file<R: Read + Seek>(&self, bdt: &mut R) -> Result<Vec<u8>> {
        bdt.seek(SeekFrom::Start(self.file_offset))?;
        let mut bytes = vec![0u8; self.padded_file_size as usize];
        bdt.read_exact(&mut bytes)?;
        if let Some(key) = &self.aes_key {
            key.decrypt(&mut bytes)?;
        }
        Ok(bytes)
    }
}

/// Files grouped by hash for faster lookup.
pub type Bucket = Vec<FileHeader>;

/// The header file of the dvdbnd container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bhd5 {
    /// Generation the header is (or will be) formatted as.
    pub format: Game,
    /// Whether the header is big-endian.
    pub big_endian: bool,
    /// Unknown; possibly whether crypto is allowed. Offsets are present
    /// regardless.
    pub unk05: bool,
    /// Salt mixed into the per-file SHA hashes. Empty before DS2.
    pub salt: String,
    /// Buckets of file headers; index = hash % bucket count.
    pub buckets: Vec<Bucket>,
}

impl Bhd5 {
    /// Create an empty header for `game`.
    pub fn new(game: Game) -> Self {
        Self {
            format: game,
            big_endian: false,
            unk05: false,
            salt: String::new(),
            buckets: Vec::new(),
        }
    }

    /// Whether `bytes` look like the start of a BHD5 header file.
    pub fn is_header(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && &bytes[..4] == b"BHD5"
    }

    /// Whether `bytes` look like the start of a companion data file.
    pub fn is_data(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && (&bytes[..4] == b"BDF3" || &bytes[..4] == b"BDF4")
    }

    /// Read a header formatted for `game` from a path, byte buffer, or
    /// stream at position 0. Must already be decrypted, if applicable.
    pub fn read(source: impl IntoCursor, game: Game) -> Result<Self> {
        let mut br = source.into_cursor()?;
        Self::parse(&mut br, game)
    }

    fn parse<R: Read + Seek>(br: &mut BinReader<R>, game: Game) -> Result<Self> {
        br.assert_magic(b"BHD5")?;
        let big_endian = br.assert_i8(&[0, -1], "endianness byte")? == 0;
        br.big_endian = big_endian;
        let unk05 = br.bool()?;
        br.assert_u8(&[0], "header padding")?;
        br.assert_u8(&[0], "header padding")?;
        br.assert_i32(&[1], "version")?;
        br.i32()?; // file size
        let bucket_count = br.i32()?;
        let buckets_offset = br.i32()?;

        let salt = if game >= Game::DarkSouls2 {
            let salt_length = br.i32()?;
            br.ascii(salt_length as usize)?
            // No padding.
        } else {
            String::new()
        };

        br.seek(buckets_offset as u64)?;
        let mut buckets = Vec::with_capacity(bucket_count as usize);
        for _ in 0..bucket_count {
            buckets.push(read_bucket(br, game)?);
        }
        debug!(
            "BHD5 ({game:?}): {} buckets, {} files",
            buckets.len(),
            buckets.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            format: game,
            big_endian,
            unk05,
            salt,
            buckets,
        })
    }

    /// Write the header to `sink`.
    pub fn write<W: Write + Seek>(&self, sink: W) -> Result<()> {
        let mut bw = BinWriter::new(sink);
        self.write_to(&mut bw)
    }

    /// Write the header to a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bw = BinWriter::memory();
        self.write_to(&mut bw)?;
        Ok(bw.into_bytes())
    }

    /// Reserve-then-fill writer. The payload order is fixed: every bucket
    /// descriptor, then every bucket's file headers, then each file's
    /// (SHA, AES) pair in bucket-then-index order - reference headers are
    /// laid out exactly this way.
    fn write_to<W: Write + Seek>(&self, bw: &mut BinWriter<W>) -> Result<()> {
        bw.big_endian = self.big_endian;
        bw.bytes(b"BHD5")?;
        bw.i8(if self.big_endian { 0 } else { -1 })?;
        bw.bool(self.unk05)?;
        bw.u8(0)?;
        bw.u8(0)?;
        bw.i32(1)?;
        let file_size = bw.reserve_u32()?;
        bw.i32(self.buckets.len() as i32)?;
        let buckets_offset = bw.reserve_u32()?;

        if self.format >= Game::DarkSouls2 {
            bw.i32(self.salt.len() as i32)?;
            bw.ascii(&self.salt)?;
        }

        let pos = pos32(bw.position()?)?;
        bw.fill_u32(buckets_offset, pos)?;
        let mut header_offsets = Vec::with_capacity(self.buckets.len());
        for bucket in &self.buckets {
            bw.i32(bucket.len() as i32)?;
            header_offsets.push(bw.reserve_u32()?);
        }

        let mut crypto_tokens = Vec::new();
        for (bucket, token) in self.buckets.iter().zip(header_offsets) {
            let pos = pos32(bw.position()?)?;
            bw.fill_u32(token, pos)?;
            for file in bucket {
                crypto_tokens.push(file.write(bw, self.format)?);
            }
        }

        for (file, tokens) in self.buckets.iter().flatten().zip(crypto_tokens) {
            file.write_sha_and_key(bw, tokens)?;
        }

        let pos = pos32(bw.position()?)?;
        bw.fill_u32(file_size, pos)?;
        Ok(())
    }

    /// Look up a file by its path hash. A miss is `None`, never an error.
    pub fn file(&self, hash: u64) -> Option<&FileHeader> {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = &self.buckets[(hash % self.buckets.len() as u64) as usize];
        bucket.iter().find(|f| f.file_name_hash == hash)
    }

    /// Look up a file by path, hashing with the width this generation uses.
    pub fn file_by_path(&self, path: &str) -> Option<&FileHeader> {
        let hash = if self.format >= Game::EldenRing {
            path_hash_64(path)
        } else {
            path_hash_32(path) as u64
        };
        self.file(hash)
    }
}

fn read_bucket<R: Read + Seek>(br: &mut BinReader<R>, game: Game) -> Result<Bucket> {
    let file_header_count = br.i32()?;
    let file_headers_offset = br.i32()?;
    br.step_in(file_headers_offset as u64, |br| {
        let mut files = Vec::with_capacity(file_header_count as usize);
        for _ in 0..file_header_count {
            files.push(FileHeader::read(br, game)?);
        }
        Ok(files)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::aes::Aes128;

    fn round_trip(bhd: &Bhd5) -> Bhd5 {
        let bytes = bhd.to_bytes().unwrap();
        Bhd5::read(bytes, bhd.format).unwrap()
    }

    #[test]
    fn dark_souls_1_single_file_round_trip() {
        let mut bhd = Bhd5::new(Game::DarkSouls1);
        bhd.buckets.push(vec![FileHeader {
            file_name_hash: 0xDEADBEEF,
            padded_file_size: 0x800,
            file_offset: 0x4000,
            ..FileHeader::default()
        }]);

        let parsed = round_trip(&bhd);
        assert_eq!(parsed, bhd);
        let file = parsed.file(0xDEADBEEF).expect("file present");
        assert_eq!(file.padded_file_size, 0x800);
        assert_eq!(file.file_offset, 0x4000);
        assert_eq!(file.unpadded_file_size, -1);
        assert!(file.sha_hash.is_none());
        assert!(file.aes_key.is_none());
    }

    #[test]
    fn elden_ring_unpadded_size_survives_narrowing() {
        let mut bhd = Bhd5::new(Game::EldenRing);
        bhd.salt = "ERSALT".into();
        bhd.buckets.push(vec![FileHeader {
            file_name_hash: 0x0123_4567_89AB_CDEF,
            padded_file_size: 0x200,
            unpadded_file_size: 100,
            file_offset: 0x10_0000,
            ..FileHeader::default()
        }]);

        let parsed = round_trip(&bhd);
        assert_eq!(parsed, bhd);
        let file = parsed.file(0x0123_4567_89AB_CDEF).unwrap();
        assert_eq!(file.unpadded_file_size, 100);
    }

    #[test]
    fn multi_bucket_round_trip_with_mixed_crypto_metadata() {
        let sha = ShaHash {
            hash: [0xAB; 32],
            ranges: vec![
                Range { start: 0, end: 0x30 },
                Range { start: -1, end: -1 },
            ],
        };
        let aes = AesKey {
            key: [0x5A; 16],
            ranges: vec![Range { start: 0x10, end: 0x40 }],
        };

        // Hashes chosen so bucket index = hash % 3 spreads across buckets.
        let mut bhd = Bhd5::new(Game::DarkSouls3);
        bhd.salt = "GR_25_46".into();
        bhd.unk05 = true;
        bhd.buckets = vec![
            vec![
                FileHeader {
                    file_name_hash: 3,
                    padded_file_size: 0x100,
                    unpadded_file_size: 0xF3,
                    file_offset: 0,
                    sha_hash: None,
                    aes_key: None,
                },
                FileHeader {
                    file_name_hash: 6,
                    padded_file_size: 0x200,
                    unpadded_file_size: 0x1FF,
                    file_offset: 0x100,
                    sha_hash: Some(sha.clone()),
                    aes_key: None,
                },
            ],
            vec![FileHeader {
                file_name_hash: 7,
                padded_file_size: 0x300,
                unpadded_file_size: 0x2C0,
                file_offset: 0x300,
                sha_hash: Some(sha),
                aes_key: Some(aes),
            }],
            vec![],
        ];

        let parsed = round_trip(&bhd);
        assert_eq!(parsed, bhd);

        // Lookup hits the right bucket and scans linearly.
        assert_eq!(parsed.file(6).unwrap().padded_file_size, 0x200);
        assert_eq!(parsed.file(7).unwrap().aes_key.as_ref().unwrap().key, [0x5A; 16]);
        // A hash that maps to a bucket with no match is a miss, not an error.
        assert!(parsed.file(9).is_none());
        assert!(parsed.file(1).is_none());
    }

    #[test]
    fn big_endian_round_trip() {
        let mut bhd = Bhd5::new(Game::DarkSouls1);
        bhd.big_endian = true;
        bhd.buckets.push(vec![FileHeader {
            file_name_hash: 0x1234,
            padded_file_size: 0x10,
            file_offset: 0x40,
            ..FileHeader::default()
        }]);
        let bytes = bhd.to_bytes().unwrap();
        assert_eq!(bytes[4], 0); // endianness byte
        assert_eq!(round_trip(&bhd), bhd);
    }

    #[test]
    fn pre_elden_ring_refuses_wide_hashes() {
        let mut bhd = Bhd5::new(Game::DarkSouls3);
        bhd.buckets.push(vec![FileHeader {
            file_name_hash: 0x1_0000_0000,
            ..FileHeader::default()
        }]);
        assert!(matches!(bhd.to_bytes(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn probes() {
        let bhd = Bhd5::new(Game::DarkSouls1).to_bytes().unwrap();
        assert!(Bhd5::is_header(&bhd));
        assert!(!Bhd5::is_header(b"BND3"));
        assert!(Bhd5::is_data(b"BDF3....."));
        assert!(Bhd5::is_data(b"BDF4....."));
        assert!(!Bhd5::is_data(b"BHD5"));
        assert!(!Bhd5::is_data(b"BD"));
    }

    #[test]
    fn version_mismatch_aborts() {
        let mut bytes = Bhd5::new(Game::DarkSouls1).to_bytes().unwrap();
        bytes[8] = 2;
        assert!(matches!(
            Bhd5::read(bytes, Game::DarkSouls1),
            Err(Error::Format(_))
        ));
    }

    // CBC-encrypt with a zero IV, one chain across all given spans.
    fn cbc_encrypt_ranges(key: &[u8; 16], data: &mut [u8], ranges: &[Range]) {
        let aes = Aes128::new(key);
        let mut prev = [0u8; 16];
        for range in ranges.iter().filter(|r| !r.is_skip()) {
            let span = &mut data[range.start as usize..range.end as usize];
            for chunk in span.chunks_exact_mut(16) {
                let mut block = [0u8; 16];
                block.copy_from_slice(chunk);
                for (b, p) in block.iter_mut().zip(prev.iter()) {
                    *b ^= p;
                }
                prev = aes.encrypt_block(&block);
                chunk.copy_from_slice(&prev);
            }
        }
    }

    #[test]
    fn read_file_decrypts_only_the_listed_ranges() {
        let key = [0x7E; 16];
        let ranges = vec![
            Range { start: 0x00, end: 0x20 },
            Range { start: -1, end: -1 }, // skip, must not reset the chain
            Range { start: 0x40, end: 0x60 },
        ];

        let plain: Vec<u8> = (0u8..0x80).collect();
        let mut stored = plain.clone();
        cbc_encrypt_ranges(&key, &mut stored, &ranges);
        // The gap stays plaintext on disk.
        assert_eq!(&stored[0x20..0x40], &plain[0x20..0x40]);
        assert_ne!(&stored[..0x20], &plain[..0x20]);

        let header = FileHeader {
            file_name_hash: 42,
            padded_file_size: plain.len() as u32,
            file_offset: 0x10,
            aes_key: Some(AesKey {
                key,
                ranges: ranges.clone(),
            }),
            ..FileHeader::default()
        };

        // BDT: 16 bytes of junk, then the stored file.
        let mut bdt = vec![0xEE; 0x10];
        bdt.extend_from_slice(&stored);
        let mut cursor = std::io::Cursor::new(bdt);

        let out = header.read_file(&mut cursor).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn out_of_bounds_range_is_a_format_violation() {
        let key = AesKey {
            key: [1; 16],
            ranges: vec![Range { start: 0, end: 0x100 }],
        };
        let mut bytes = vec![0u8; 0x20];
        assert!(matches!(key.decrypt(&mut bytes), Err(Error::Format(_))));
    }
}
