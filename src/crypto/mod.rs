//! Cryptographic operations for dvdbnd content.
//!
//! This module contains a pure-Rust AES implementation used to decrypt the
//! partially-encrypted files addressed by BHD5 headers. All functions accept
//! already-loaded key material; the 16-byte per-file keys live in the BHD5
//! header itself.
//!
//! The implementation here is intended for **offline file-format parsing**
//! only. It is not constant-time and should not be used in contexts where
//! timing side-channels are a concern.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`aes`] | AES-128 block cipher and the zero-IV CBC decryptor applied to encrypted byte ranges |

pub mod aes;
