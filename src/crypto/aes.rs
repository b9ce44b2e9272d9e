//! AES-128 primitives for dvdbnd file decryption.
//!
//! dvdbnd archives encrypt selected byte ranges of each file with
//! AES-128-CBC using an all-zero initial IV. One cipher state runs through
//! all of a file's ranges in order: a later range continues the chain left
//! by the previous one rather than restarting it, so [`CbcDecryptor`] keeps
//! its feedback block across calls.
//!
//! ## Pure-Rust implementation note
//!
//! To keep the dependency footprint small, AES is implemented here with a
//! compact lookup-table approach. This is not constant-time and should not
//! be used for security-sensitive applications, but it is correct and
//! sufficient for offline file-format parsing.

use crate::{Error, Result};

// Rijndael S-box: multiplicative inverse in GF(2^8) followed by the fixed
// affine transform. https://en.wikipedia.org/wiki/Rijndael_S-box
const SBOX: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB, 0x76,
    0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4, 0x72, 0xC0,
    0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71, 0xD8, 0x31, 0x15,
    0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2, 0xEB, 0x27, 0xB2, 0x75,
    0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6, 0xB3, 0x29, 0xE3, 0x2F, 0x84,
    0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB, 0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF,
    0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45, 0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8,
    0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5, 0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2,
    0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44, 0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73,
    0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A, 0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB,
    0xE0, 0x32, 0x3A, 0x0A, 0x49, 0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79,
    0xE7, 0xC8, 0x37, 0x6D, 0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08,
    0xBA, 0x78, 0x25, 0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A,
    0x70, 0x3E, 0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E,
    0xE1, 0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB, 0x16,
];

// Exact inverse of SBOX.
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6A, 0xD5, 0x30, 0x36, 0xA5, 0x38, 0xBF, 0x40, 0xA3, 0x9E, 0x81, 0xF3, 0xD7, 0xFB,
    0x7C, 0xE3, 0x39, 0x82, 0x9B, 0x2F, 0xFF, 0x87, 0x34, 0x8E, 0x43, 0x44, 0xC4, 0xDE, 0xE9, 0xCB,
    0x54, 0x7B, 0x94, 0x32, 0xA6, 0xC2, 0x23, 0x3D, 0xEE, 0x4C, 0x95, 0x0B, 0x42, 0xFA, 0xC3, 0x4E,
    0x08, 0x2E, 0xA1, 0x66, 0x28, 0xD9, 0x24, 0xB2, 0x76, 0x5B, 0xA2, 0x49, 0x6D, 0x8B, 0xD1, 0x25,
    0x72, 0xF8, 0xF6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xD4, 0xA4, 0x5C, 0xCC, 0x5D, 0x65, 0xB6, 0x92,
    0x6C, 0x70, 0x48, 0x50, 0xFD, 0xED, 0xB9, 0xDA, 0x5E, 0x15, 0x46, 0x57, 0xA7, 0x8D, 0x9D, 0x84,
    0x90, 0xD8, 0xAB, 0x00, 0x8C, 0xBC, 0xD3, 0x0A, 0xF7, 0xE4, 0x58, 0x05, 0xB8, 0xB3, 0x45, 0x06,
    0xD0, 0x2C, 0x1E, 0x8F, 0xCA, 0x3F, 0x0F, 0x02, 0xC1, 0xAF, 0xBD, 0x03, 0x01, 0x13, 0x8A, 0x6B,
    0x3A, 0x91, 0x11, 0x41, 0x4F, 0x67, 0xDC, 0xEA, 0x97, 0xF2, 0xCF, 0xCE, 0xF0, 0xB4, 0xE6, 0x73,
    0x96, 0xAC, 0x74, 0x22, 0xE7, 0xAD, 0x35, 0x85, 0xE2, 0xF9, 0x37, 0xE8, 0x1C, 0x75, 0xDF, 0x6E,
    0x47, 0xF1, 0x1A, 0x71, 0x1D, 0x29, 0xC5, 0x89, 0x6F, 0xB7, 0x62, 0x0E, 0xAA, 0x18, 0xBE, 0x1B,
    0xFC, 0x56, 0x3E, 0x4B, 0xC6, 0xD2, 0x79, 0x20, 0x9A, 0xDB, 0xC0, 0xFE, 0x78, 0xCD, 0x5A, 0xF4,
    0x1F, 0xDD, 0xA8, 0x33, 0x88, 0x07, 0xC7, 0x31, 0xB1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xEC, 0x5F,
    0x60, 0x51, 0x7F, 0xA9, 0x19, 0xB5, 0x4A, 0x0D, 0x2D, 0xE5, 0x7A, 0x9F, 0x93, 0xC9, 0x9C, 0xEF,
    0xA0, 0xE0, 0x3B, 0x4D, 0xAE, 0x2A, 0xF5, 0xB0, 0xC8, 0xEB, 0xBB, 0x3C, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2B, 0x04, 0x7E, 0xBA, 0x77, 0xD6, 0x26, 0xE1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0C, 0x7D,
];

/// The 4x4 AES state, column-major.
type Block = [u8; 16];

// Multiply in GF(2^8) mod x^8+x^4+x^3+x+1.
#[inline]
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            p ^= a;
        }
        let hi = a & 0x80 != 0;
        a <<= 1;
        if hi {
            a ^= 0x1B;
        }
        b >>= 1;
    }
    p
}

fn sub_bytes(s: &mut Block) {
    for b in s.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

fn inv_sub_bytes(s: &mut Block) {
    for b in s.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

// Row i left-rotates by i; row i holds indices {i, i+4, i+8, i+12}.
fn shift_rows(s: &mut Block) {
    let t = s[1];
    s[1] = s[5];
    s[5] = s[9];
    s[9] = s[13];
    s[13] = t;
    s.swap(2, 10);
    s.swap(6, 14);
    let t = s[15];
    s[15] = s[11];
    s[11] = s[7];
    s[7] = s[3];
    s[3] = t;
}

fn inv_shift_rows(s: &mut Block) {
    let t = s[13];
    s[13] = s[9];
    s[9] = s[5];
    s[5] = s[1];
    s[1] = t;
    s.swap(2, 10);
    s.swap(6, 14);
    let t = s[3];
    s[3] = s[7];
    s[7] = s[11];
    s[11] = s[15];
    s[15] = t;
}

// MDS matrix rows are cyclic shifts of [2, 3, 1, 1].
fn mix_columns(s: &mut Block) {
    for i in 0..4 {
        let b = i * 4;
        let (s0, s1, s2, s3) = (s[b], s[b + 1], s[b + 2], s[b + 3]);
        s[b] = gmul(0x02, s0) ^ gmul(0x03, s1) ^ s2 ^ s3;
        s[b + 1] = s0 ^ gmul(0x02, s1) ^ gmul(0x03, s2) ^ s3;
        s[b + 2] = s0 ^ s1 ^ gmul(0x02, s2) ^ gmul(0x03, s3);
        s[b + 3] = gmul(0x03, s0) ^ s1 ^ s2 ^ gmul(0x02, s3);
    }
}

// Inverse MDS matrix rows are cyclic shifts of [0x0E, 0x0B, 0x0D, 0x09].
fn inv_mix_columns(s: &mut Block) {
    for i in 0..4 {
        let b = i * 4;
        let (s0, s1, s2, s3) = (s[b], s[b + 1], s[b + 2], s[b + 3]);
        s[b] = gmul(0x0E, s0) ^ gmul(0x0B, s1) ^ gmul(0x0D, s2) ^ gmul(0x09, s3);
        s[b + 1] = gmul(0x09, s0) ^ gmul(0x0E, s1) ^ gmul(0x0B, s2) ^ gmul(0x0D, s3);
        s[b + 2] = gmul(0x0D, s0) ^ gmul(0x09, s1) ^ gmul(0x0E, s2) ^ gmul(0x0B, s3);
        s[b + 3] = gmul(0x0B, s0) ^ gmul(0x0D, s1) ^ gmul(0x09, s2) ^ gmul(0x0E, s3);
    }
}

fn add_round_key(s: &mut Block, rk: &[u8]) {
    for (b, k) in s.iter_mut().zip(rk.iter()) {
        *b ^= k;
    }
}

// Expand a 16-byte key into 11 round keys (176 bytes).
// https://en.wikipedia.org/wiki/AES_key_schedule
fn key_expand(key: &[u8; 16]) -> [u8; 176] {
    let mut w = [0u8; 176];
    w[..16].copy_from_slice(key);
    let rcon: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1B, 0x36];
    for i in 4..44usize {
        let mut t = [
            w[(i - 1) * 4],
            w[(i - 1) * 4 + 1],
            w[(i - 1) * 4 + 2],
            w[(i - 1) * 4 + 3],
        ];
        if i % 4 == 0 {
            t = [t[1], t[2], t[3], t[0]];
            t = [
                SBOX[t[0] as usize] ^ rcon[i / 4 - 1],
                SBOX[t[1] as usize],
                SBOX[t[2] as usize],
                SBOX[t[3] as usize],
            ];
        }
        for j in 0..4 {
            w[i * 4 + j] = w[(i - 4) * 4 + j] ^ t[j];
        }
    }
    w
}

/// AES-128 block cipher with a precomputed key schedule.
pub struct Aes128 {
    round_keys: [u8; 176],
}

impl Aes128 {
    /// Expand `key` into the round-key schedule.
    pub fn new(key: &[u8; 16]) -> Self {
        Self {
            round_keys: key_expand(key),
        }
    }

    /// Encrypt one 16-byte block.
    pub fn encrypt_block(&self, block: &Block) -> Block {
        let rk = &self.round_keys;
        let mut s = *block;
        add_round_key(&mut s, &rk[..16]);
        for round in 1..10 {
            sub_bytes(&mut s);
            shift_rows(&mut s);
            mix_columns(&mut s);
            add_round_key(&mut s, &rk[round * 16..(round + 1) * 16]);
        }
        // Final round omits MixColumns.
        sub_bytes(&mut s);
        shift_rows(&mut s);
        add_round_key(&mut s, &rk[160..]);
        s
    }

    /// Decrypt one 16-byte block.
    pub fn decrypt_block(&self, block: &Block) -> Block {
        let rk = &self.round_keys;
        let mut s = *block;
        add_round_key(&mut s, &rk[160..]);
        for round in (1..10).rev() {
            inv_shift_rows(&mut s);
            inv_sub_bytes(&mut s);
            add_round_key(&mut s, &rk[round * 16..(round + 1) * 16]);
            inv_mix_columns(&mut s);
        }
        inv_shift_rows(&mut s);
        inv_sub_bytes(&mut s);
        add_round_key(&mut s, &rk[..16]);
        s
    }
}

/// AES-128-CBC decryptor with an all-zero initial IV whose feedback chain
/// persists across separately supplied spans.
///
/// dvdbnd files list several encrypted ranges that were produced by one
/// cipher run; feed the spans in list order and each continues where the
/// previous left off. Skipped ranges contribute no bytes and must simply
/// not be fed - the chain is unaffected.
pub struct CbcDecryptor {
    cipher: Aes128,
    prev: Block,
}

impl CbcDecryptor {
    /// Start a chain for `key` with a zero IV.
    pub fn new(key: &[u8; 16]) -> Self {
        Self {
            cipher: Aes128::new(key),
            prev: [0u8; 16],
        }
    }

    /// Decrypt `data` in place, continuing the chain.
    ///
    /// `data` must be a whole number of 16-byte blocks.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) -> Result<()> {
        if data.len() % 16 != 0 {
            return Err(Error::Format("encrypted range is not block-aligned"));
        }
        for chunk in data.chunks_exact_mut(16) {
            let mut ct = [0u8; 16];
            ct.copy_from_slice(chunk);
            let mut pt = self.cipher.decrypt_block(&ct);
            for (p, v) in pt.iter_mut().zip(self.prev.iter()) {
                *p ^= v;
            }
            self.prev = ct;
            chunk.copy_from_slice(&pt);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // FIPS-197 appendix C.1.
    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F,
    ];
    const PLAIN: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF,
    ];
    const CIPHER: [u8; 16] = [
        0x69, 0xC4, 0xE0, 0xD8, 0x6A, 0x7B, 0x04, 0x30, 0xD8, 0xCD, 0xB7, 0x80, 0x70, 0xB4, 0xC5,
        0x5A,
    ];

    #[test]
    fn fips197_block_vectors() {
        let aes = Aes128::new(&KEY);
        assert_eq!(aes.encrypt_block(&PLAIN), CIPHER);
        assert_eq!(aes.decrypt_block(&CIPHER), PLAIN);
    }

    // CBC-encrypt with a zero IV, the inverse of what CbcDecryptor does.
    fn cbc_encrypt(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
        let aes = Aes128::new(key);
        let mut prev = [0u8; 16];
        let mut out = Vec::with_capacity(plain.len());
        for chunk in plain.chunks_exact(16) {
            let mut block = [0u8; 16];
            block.copy_from_slice(chunk);
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            prev = aes.encrypt_block(&block);
            out.extend_from_slice(&prev);
        }
        out
    }

    #[test]
    fn cbc_zero_iv_first_block_is_ecb() {
        let ct = cbc_encrypt(&KEY, &PLAIN);
        assert_eq!(&ct[..], &CIPHER[..]);
        let mut data = ct;
        CbcDecryptor::new(&KEY).decrypt_in_place(&mut data).unwrap();
        assert_eq!(&data[..], &PLAIN[..]);
    }

    #[test]
    fn chain_survives_span_boundaries() {
        let plain: Vec<u8> = (0u8..64).collect();
        let ct = cbc_encrypt(&KEY, &plain);

        // Whole-buffer decryption.
        let mut whole = ct.clone();
        CbcDecryptor::new(&KEY).decrypt_in_place(&mut whole).unwrap();
        assert_eq!(whole, plain);

        // Same ciphertext fed as three spans through one decryptor.
        let mut split = ct.clone();
        let mut dec = CbcDecryptor::new(&KEY);
        let (a, rest) = split.split_at_mut(16);
        let (b, c) = rest.split_at_mut(32);
        dec.decrypt_in_place(a).unwrap();
        dec.decrypt_in_place(b).unwrap();
        dec.decrypt_in_place(c).unwrap();
        assert_eq!(split, plain);
    }

    #[test]
    fn misaligned_span_is_rejected() {
        let mut data = vec![0u8; 20];
        assert!(CbcDecryptor::new(&KEY).decrypt_in_place(&mut data).is_err());
    }
}
