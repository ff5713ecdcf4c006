//! Error types for `DirPak`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `DirPak` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(String),

    // ==================== Format Errors ====================
    /// The file is not a PAK archive (missing `PAK0` magic).
    #[error("invalid PAK magic: expected PAK0, found {0:?}")]
    InvalidMagic([u8; 4]),

    /// The archive was written by an incompatible format version.
    #[error("unsupported PAK version: {}.{}.{}", .0[0], .0[1], .0[2])]
    UnsupportedVersion([u8; 4]),

    /// The endian marker is neither `0xFEFF` nor `0xFFFE`.
    #[error("invalid endian marker: {0:#06x}")]
    InvalidEndianMarker(u16),

    /// A section ended before its declared size.
    #[error("truncated {section}: expected {expected} bytes, found {found}")]
    Truncated {
        /// Which part of the archive was short.
        section: &'static str,
        /// Bytes the header declared.
        expected: u64,
        /// Bytes actually available.
        found: u64,
    },

    /// A header offset is not a multiple of the section alignment.
    #[error("{field} offset {offset:#x} is not 32-byte aligned")]
    Misaligned {
        /// Name of the header field.
        field: &'static str,
        /// The offending offset.
        offset: u64,
    },

    /// An entry record holds values that cannot describe a tree node.
    #[error("invalid entry {index}: {message}")]
    InvalidEntry {
        /// Index of the entry in the entry table.
        index: usize,
        /// What is wrong with it.
        message: String,
    },

    /// A directory expected more children than the entry table holds.
    #[error("entry table exhausted: directory at entry {directory} expects {expected} children")]
    EntryTableExhausted {
        /// Entry index of the directory still waiting for children.
        directory: usize,
        /// Its declared child count.
        expected: u64,
    },

    /// Decoding finished with entries left over.
    #[error("entry table has {remaining} unconsumed entries")]
    EntryTableRemainder {
        /// Number of entries never reached.
        remaining: usize,
    },

    // ==================== Compression Errors ====================
    /// Zlib decompression failed.
    #[error("Zlib decompression failed: {message}")]
    ZlibDecompressionFailed {
        /// The error message.
        message: String,
    },

    /// Inflated payload length differs from the recorded uncompressed size.
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    DecompressedSizeMismatch {
        /// Recorded uncompressed size.
        expected: u64,
        /// Bytes actually produced.
        actual: u64,
    },

    /// Zlib compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    // ==================== File Session Errors ====================
    /// A seek would move the cursor outside `[0, len]`.
    #[error("seek out of range: position {requested} outside 0..={len}")]
    SeekOutOfRange {
        /// The position the seek would have produced.
        requested: i128,
        /// Length of the payload.
        len: u64,
    },

    /// Cursor reads are only served from stored (uncompressed) payloads.
    #[error("partial read of compressed file {0}: use read_all or read_range")]
    CompressedPartialRead(String),

    // ==================== Lookup Errors ====================
    /// The requested file was not found in the PAK archive.
    #[error("file not found in PAK: {0}")]
    FileNotFoundInPak(String),

    /// The requested path names a directory, not a file.
    #[error("not a file: {0}")]
    NotAFile(String),

    // ==================== Build Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    /// A source file's size changed between listing and reading.
    #[error("{} changed while packing: listed {listed} bytes, read {read}", .path.display())]
    SourceChanged {
        /// Path relative to the source root.
        path: PathBuf,
        /// Length reported by the listing.
        listed: u64,
        /// Length actually read.
        read: u64,
    },

    /// Build options failed validation.
    #[error("invalid build options: {0}")]
    InvalidOptions(String),

    /// A value does not fit the on-disk field width.
    #[error("{what} too large: {value}")]
    TooLarge {
        /// What overflowed.
        what: &'static str,
        /// The value that did not fit.
        value: u64,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error reports a malformed archive rather than an I/O or
    /// usage problem.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMagic(_)
                | Error::UnsupportedVersion(_)
                | Error::InvalidEndianMarker(_)
                | Error::Truncated { .. }
                | Error::Misaligned { .. }
                | Error::InvalidEntry { .. }
                | Error::EntryTableExhausted { .. }
                | Error::EntryTableRemainder { .. }
        )
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDir(err.to_string())
    }
}

/// A specialized Result type for `DirPak` operations.
pub type Result<T> = std::result::Result<T, Error>;
