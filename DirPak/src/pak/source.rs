//! Tree sources for PAK creation
//!
//! The builder only needs to list one directory level at a time and read a
//! file's bytes. [`FsSource`] serves a real directory, [`MemorySource`] an
//! in-memory tree.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Kind of an item yielded by a [`TreeSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
    /// Symlinks and anything else that is neither a regular file nor a
    /// directory. Never packed.
    Skip,
}

/// One child of a source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Entry name (no separators)
    pub name: String,
    pub kind: SourceKind,
    /// Byte length for files, 0 otherwise
    pub len: u64,
    /// Path relative to the source root, handed back to the source
    pub path: PathBuf,
    /// Whether the origin was writable
    pub writable: bool,
}

/// A tree that can be packed
pub trait TreeSource {
    /// List the immediate children of `dir` in packing order.
    /// The empty path names the source root.
    fn children(&self, dir: &Path) -> Result<Vec<SourceItem>>;

    /// Read the full contents of a file item.
    fn read(&self, item: &SourceItem) -> Result<Vec<u8>>;
}

/// A directory on disk
///
/// Children are listed in file-name order so that packing the same tree
/// twice yields identical archives. Symlinks are never followed.
#[derive(Debug, Clone)]
pub struct FsSource {
    base: PathBuf,
    excluded: Option<PathBuf>,
}

impl FsSource {
    /// # Errors
    /// Returns [`Error::InvalidPath`] if `base` is not a directory.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        if !base.is_dir() {
            return Err(Error::InvalidPath(base));
        }
        Ok(Self {
            base,
            excluded: None,
        })
    }

    /// Treat the file at `path` as a skip item if the walk reaches it.
    ///
    /// Used to keep an archive written inside its own source tree out of
    /// itself. The path must exist; it is compared after canonicalisation.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if `path` cannot be canonicalised.
    pub fn with_excluded(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.excluded = Some(path.as_ref().canonicalize()?);
        Ok(self)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded
            .as_deref()
            .is_some_and(|excluded| path.canonicalize().is_ok_and(|p| p == excluded))
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl TreeSource for FsSource {
    fn children(&self, dir: &Path) -> Result<Vec<SourceItem>> {
        let mut items = Vec::new();

        for entry in WalkDir::new(self.base.join(dir))
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            let file_type = entry.file_type();
            let name = entry.file_name().to_string_lossy().into_owned();

            let kind = if file_type.is_symlink() {
                SourceKind::Skip
            } else if file_type.is_dir() {
                SourceKind::Directory
            } else if file_type.is_file() && !self.is_excluded(entry.path()) {
                SourceKind::File
            } else {
                SourceKind::Skip
            };

            let metadata = entry.metadata()?;
            items.push(SourceItem {
                path: dir.join(&name),
                name,
                kind,
                len: if kind == SourceKind::File { metadata.len() } else { 0 },
                writable: !metadata.permissions().readonly(),
            });
        }

        Ok(items)
    }

    fn read(&self, item: &SourceItem) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.base.join(&item.path))?)
    }
}

#[derive(Debug, Clone)]
enum MemoryKind {
    File(Vec<u8>),
    Directory(Vec<MemoryNode>),
    Symlink,
}

#[derive(Debug, Clone)]
struct MemoryNode {
    name: String,
    kind: MemoryKind,
    writable: bool,
}

/// An in-memory tree
///
/// Children keep insertion order. Parent directories are created on demand.
///
/// # Example
///
/// ```
/// use dirpak::pak::MemorySource;
///
/// let source = MemorySource::new()
///     .with_file("root/a.txt", b"alpha".to_vec())
///     .with_file("root/sub/b.txt", b"beta".to_vec())
///     .with_dir("root/empty");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    root: Vec<MemoryNode>,
}

fn components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating missing parent directories
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, data: Vec<u8>) -> Self {
        self.insert(path.as_ref(), MemoryKind::File(data), true);
        self
    }

    /// Add a file that packs without the writable flag
    #[must_use]
    pub fn with_readonly_file(mut self, path: impl AsRef<Path>, data: Vec<u8>) -> Self {
        self.insert(path.as_ref(), MemoryKind::File(data), false);
        self
    }

    /// Add an empty directory, creating missing parents
    #[must_use]
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), MemoryKind::Directory(Vec::new()), true);
        self
    }

    /// Add a symlink placeholder (skipped when packing)
    #[must_use]
    pub fn with_symlink(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), MemoryKind::Symlink, true);
        self
    }

    fn insert(&mut self, path: &Path, kind: MemoryKind, writable: bool) {
        let mut parts = components(path);
        let Some(name) = parts.pop() else {
            return;
        };

        let mut level = &mut self.root;
        for part in parts {
            let index = match level.iter().position(|n| n.name == part) {
                Some(index) => index,
                None => {
                    level.push(MemoryNode {
                        name: part,
                        kind: MemoryKind::Directory(Vec::new()),
                        writable: true,
                    });
                    level.len() - 1
                }
            };
            level = match &mut level[index].kind {
                MemoryKind::Directory(children) => children,
                // A file or symlink in the way is replaced by a directory
                other => {
                    *other = MemoryKind::Directory(Vec::new());
                    match other {
                        MemoryKind::Directory(children) => children,
                        _ => unreachable!(),
                    }
                }
            };
        }

        match level.iter_mut().find(|n| n.name == name) {
            Some(existing) => {
                existing.kind = kind;
                existing.writable = writable;
            }
            None => level.push(MemoryNode {
                name,
                kind,
                writable,
            }),
        }
    }

    fn level(&self, dir: &Path) -> Option<&[MemoryNode]> {
        let mut level = self.root.as_slice();
        for part in components(dir) {
            let node = level.iter().find(|n| n.name == part)?;
            match &node.kind {
                MemoryKind::Directory(children) => level = children,
                _ => return None,
            }
        }
        Some(level)
    }
}

impl TreeSource for MemorySource {
    fn children(&self, dir: &Path) -> Result<Vec<SourceItem>> {
        let level = self
            .level(dir)
            .ok_or_else(|| Error::InvalidPath(dir.to_path_buf()))?;

        Ok(level
            .iter()
            .map(|node| {
                let (kind, len) = match &node.kind {
                    MemoryKind::File(data) => (SourceKind::File, data.len() as u64),
                    MemoryKind::Directory(_) => (SourceKind::Directory, 0),
                    MemoryKind::Symlink => (SourceKind::Skip, 0),
                };
                SourceItem {
                    name: node.name.clone(),
                    kind,
                    len,
                    path: dir.join(&node.name),
                    writable: node.writable,
                }
            })
            .collect())
    }

    fn read(&self, item: &SourceItem) -> Result<Vec<u8>> {
        let parent = item.path.parent().unwrap_or(Path::new(""));
        self.level(parent)
            .and_then(|level| level.iter().find(|n| n.name == item.name))
            .and_then(|node| match &node.kind {
                MemoryKind::File(data) => Some(data.clone()),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidPath(item.path.clone()))
    }
}
