//! PAK archive module
//!
//! Building goes through [`PakBuilder`] (or [`PakOperations::create`]),
//! reading through [`PakArchive`] and its [`PakFile`] sessions.

mod archive;
mod creator;
mod extractor;
mod file;
pub mod format;
mod lister;
mod operations;
mod options;
mod resolve;
mod source;
mod tree;
mod types;

// Primary public API
pub use operations::PakOperations;

pub use archive::PakArchive;
pub use creator::{PakBuilder, create_pak};
pub use file::{PakFile, SeekMode};
pub use options::BuildOptions;
pub use resolve::{Lookup, Resolution};
pub use source::{FsSource, MemorySource, SourceItem, SourceKind, TreeSource};
pub use tree::{Children, Node, NodeId, PakTree};
pub use types::{BuildSummary, PakEntryInfo, PakInfo, PakPhase, PakProgress, ProgressCallback};

// Re-export for convenience
pub use extractor::extract_pak;
pub use format::{Endianness, PakEntry, PakHeader};
pub use lister::list_pak_contents;
