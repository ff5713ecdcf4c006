//! Options for PAK creation
//!
//! Options can be built in code or loaded from a JSON file:
//!
//! ```json
//! { "compress": true, "compression_level": 6, "endianness": "big", "ignored_names": [".git", ".DS_Store"] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::format::Endianness;
use crate::compression::BEST_LEVEL;
use crate::error::{Error, Result};

/// Options controlling how a source tree is packed.
///
/// # Example
///
/// ```
/// use dirpak::pak::BuildOptions;
///
/// let options = BuildOptions::new()
///     .with_compression(true)
///     .with_compression_level(6)
///     .with_ignored_name(".DS_Store");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Compress every payload, keeping the result only when it shrinks
    /// Default: true
    pub compress: bool,

    /// Zlib level (0-9)
    /// Default: 9 (best)
    pub compression_level: u32,

    /// Byte order of the written archive
    pub endianness: Endianness,

    /// Entry names skipped wherever they appear in the tree
    /// Default: `.git`
    pub ignored_names: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            compress: true,
            compression_level: BEST_LEVEL,
            endianness: Endianness::Little,
            ignored_names: vec![".git".to_string()],
        }
    }
}

impl BuildOptions {
    /// Create options with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > BEST_LEVEL {
            return Err(Error::InvalidOptions(format!(
                "compression_level must be 0-{BEST_LEVEL}, got {}",
                self.compression_level
            )));
        }
        if self.ignored_names.iter().any(|n| n.is_empty() || n.contains('/')) {
            return Err(Error::InvalidOptions(
                "ignored_names must be plain entry names".to_string(),
            ));
        }
        Ok(())
    }

    /// Set whether payloads are compressed.
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the zlib level.
    #[must_use]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the byte order of the archive.
    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Add a name to skip.
    #[must_use]
    pub fn with_ignored_name(mut self, name: impl Into<String>) -> Self {
        self.ignored_names.push(name.into());
        self
    }

    /// Replace the skip list.
    #[must_use]
    pub fn with_ignored_names(mut self, names: Vec<String>) -> Self {
        self.ignored_names = names;
        self
    }

    /// Compression level to use, or `None` when compression is off
    #[must_use]
    pub fn effective_level(&self) -> Option<u32> {
        self.compress.then_some(self.compression_level)
    }

    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|n| n == name)
    }
}
