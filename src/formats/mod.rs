//! Parsers for FromSoftware binary container formats.
//!
//! Each submodule targets one format family. All parsers follow the same
//! conventions:
//!
//! * **Generic byte sources** - constructors accept anything implementing
//!   [`crate::bin::IntoCursor`]: a filesystem path, an owned byte buffer,
//!   or an already-open stream positioned at its start.
//! * **Metadata only** - parsing reads headers and builds an in-memory
//!   description of the container's contents. File data is never eagerly
//!   loaded.
//! * **Reader wrappers** - each container has a `*Reader` type that owns the
//!   underlying cursor(s) and extracts individual entries on demand via
//!   `read_file`. Extraction is re-readable and uncached; readers release
//!   their cursors on drop.
//! * **Compression is a collaborator** - readers take a
//!   [`crate::compression::Decompressor`] for outer envelopes and
//!   per-entry payloads; the parsing core never names a codec.
//!
//! ## Format overview
//!
//! | Module    | Format      | Description |
//! |-----------|-------------|-------------|
//! | [`binder`] | -          | Flags codec and entry metadata shared by BND3/BND4/BXF3/BXF4 |
//! | [`bnd2`]  | BND2        | Early path-keyed binder (versions 202/211) |
//! | [`bnd3`]  | BND3        | Single-stream binder of the DeS/DS1 era |
//! | [`bnd4`]  | BND4        | Single-stream binder of the DS2 era onward |
//! | [`bxf3`]  | BXF3        | Split binder: BHF3 header + BDF3 data |
//! | [`bxf4`]  | BXF4        | Split binder: BHF4 header + BDF4 data |
//! | [`bhd5`]  | BHD5        | Hashed dvdbnd archive header with bucketed lookup and per-file AES/SHA metadata |

pub mod bhd5;
pub mod binder;
pub mod bnd2;
pub mod bnd3;
pub mod bnd4;
pub mod bxf3;
pub mod bxf4;
