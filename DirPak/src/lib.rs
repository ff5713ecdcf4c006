//! # DirPak
//!
//! Pack a directory tree into a single seekable PAK archive and read it back.
//!
//! An archive holds a fixed header, a preorder table of fixed-width entries,
//! a blob of NUL-terminated names and a blob of file payloads, every section
//! aligned to 32 bytes. Payloads are zlib-compressed when that makes them
//! smaller and stored as-is otherwise.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dirpak::pak::PakOperations;
//!
//! // Pack a directory
//! let summary = PakOperations::create("assets/", "assets.pak")?;
//! println!("Stored {} entries", summary.entry_count);
//!
//! // List and extract
//! for path in PakOperations::list("assets.pak")? {
//!     println!("{path}");
//! }
//! PakOperations::extract("assets.pak", "output/")?;
//! # Ok::<(), dirpak::Error>(())
//! ```
//!
//! ### Random access
//!
//! ```no_run
//! use dirpak::pak::{PakArchive, SeekMode};
//!
//! let mut archive = PakArchive::open("assets.pak")?;
//! if let Some(mut file) = archive.open_file("/assets/header.bin")? {
//!     file.seek(SeekMode::Start(4))?;
//!     let magic = file.read_u32()?;
//!     println!("{magic:#x}");
//! }
//! # Ok::<(), dirpak::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `dirpak` command-line binary

pub mod compression;
pub mod error;
pub mod pak;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::pak::{
        BuildOptions, BuildSummary, Endianness, FsSource, Lookup, MemorySource, NodeId,
        PakArchive, PakBuilder, PakFile, PakOperations, PakTree, SeekMode, TreeSource,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
