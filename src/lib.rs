//! **bndkit** - a reusable Rust library for parsing FromSoftware binary
//! container formats.
//!
//! # Supported formats
//! | Module | Format |
//! |--------|--------|
//! | [`formats::bnd3`] | BND3 - single-stream binder (DeS / DS1 era) |
//! | [`formats::bnd4`] | BND4 - single-stream binder (DS2 era onward) |
//! | [`formats::bxf3`] | BXF3 - split binder, BHF3 header + BDF3 data |
//! | [`formats::bxf4`] | BXF4 - split binder, BHF4 header + BDF4 data |
//! | [`formats::bnd2`] | BND2 - early path-keyed binder |
//! | [`formats::bhd5`] | BHD5 - hashed dvdbnd archive header |
//!
//! Containers parse eagerly into entry metadata and extract payloads
//! lazily; see [`formats`] for the shared conventions. Compression codecs
//! are pluggable via [`compression::Decompressor`], and the partial AES
//! decryption used by dvdbnd archives lives in [`crypto`].

pub mod bin;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod formats;
pub mod hash;

pub use error::{Error, Result};
