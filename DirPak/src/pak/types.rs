//! Result and progress types for PAK operations

use super::format::{Endianness, PakHeader};

/// Progress callback for PAK operations
pub type ProgressCallback<'a> = &'a dyn Fn(&PakProgress);

/// Progress information during PAK operations
#[derive(Debug, Clone)]
pub struct PakProgress {
    /// Current operation phase
    pub phase: PakPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items, 0 when unknown
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl PakProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: PakPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file/item name
    #[must_use]
    pub fn with_file(phase: PakPhase, current: usize, total: usize, file: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }
}

/// Phase of PAK operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PakPhase {
    /// Walking the source tree and packing payloads
    CompressingFiles,
    /// Writing header, tables and data blob
    WritingArchive,
    /// Reading header and tables
    ReadingTable,
    /// Writing files to disk (during extraction)
    WritingFiles,
    /// Operation complete
    Complete,
}

impl PakPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompressingFiles => "Compressing files",
            Self::WritingArchive => "Writing archive",
            Self::ReadingTable => "Reading entry table",
            Self::WritingFiles => "Writing files",
            Self::Complete => "Complete",
        }
    }
}

/// Statistics of a finished build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Entries written (files + directories)
    pub entry_count: u64,
    pub file_count: u64,
    pub directory_count: u64,
    /// Files stored with the compressed flag
    pub compressed_count: u64,
    /// Items left out (symlinks, special files, ignored names)
    pub skipped_count: u64,
    /// Sum of original file lengths
    pub raw_bytes: u64,
    /// Sum of stored payload lengths, before padding
    pub stored_bytes: u64,
    /// Total archive length
    pub archive_size: u64,
}

/// Listing record for one node of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakEntryInfo {
    /// Full path, starting with '/'
    pub path: String,
    pub is_dir: bool,
    pub file_id: u64,
    /// Logical size (uncompressed) for files, child count for directories
    pub size: u64,
    /// Stored payload size
    pub stored_size: u64,
    pub compressed: bool,
}

/// Archive-level information
#[derive(Debug, Clone)]
pub struct PakInfo {
    pub header: PakHeader,
    pub file_count: u64,
    pub directory_count: u64,
    pub compressed_count: u64,
    /// Sum of logical file sizes
    pub total_size: u64,
    /// Sum of stored payload sizes
    pub stored_size: u64,
}

impl PakInfo {
    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }
}
