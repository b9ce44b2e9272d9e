//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout bndkit.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
#[derive(Debug)]
pub enum Error {
    /// A magic/signature field did not match the expected value.
    BadMagic,
    /// An asserted literal, version, or structural constraint was violated
    /// (message describes which one).
    Format(&'static str),
    /// The operation is not available for the format generation being read
    /// or written, or a value does not fit the on-disk field width.
    Unsupported(&'static str),
    /// A file entry index was out of range.
    Index {
        /// The requested index.
        index: usize,
        /// The number of entries available.
        count: usize,
    },
    /// A stream was handed in at a nonzero position; absolute offsets need
    /// the stream anchored at its start.
    NotAtStart,
    /// The stream ended before all expected bytes could be read.
    UnexpectedEof,
    /// An underlying I/O operation failed.
    Io(io::Error),
    /// Zlib decompression failed.
    #[cfg(feature = "compression")]
    Zlib,
    /// Zstandard decompression failed.
    #[cfg(feature = "compression")]
    Zstd,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMagic => write!(f, "bad magic value"),
            Error::Format(s) => write!(f, "format violation: {s}"),
            Error::Unsupported(s) => write!(f, "unsupported for this format: {s}"),
            Error::Index { index, count } => {
                write!(f, "file index {index} out of range for {count} entries")
            }
            Error::NotAtStart => write!(f, "stream is not at position 0"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "compression")]
            Error::Zlib => write!(f, "zlib decompression failed"),
            #[cfg(feature = "compression")]
            Error::Zstd => write!(f, "zstd decompression failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}
