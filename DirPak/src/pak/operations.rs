//! Core PAK archive operations

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::archive::PakArchive;
use super::creator::PakBuilder;
use super::options::BuildOptions;
use super::source::FsSource;
use super::tree::{NodeId, PakTree};
use super::types::{BuildSummary, PakEntryInfo, PakInfo, PakPhase, PakProgress, ProgressCallback};
use crate::error::{Error, Result};

/// High-level PAK archive operations.
pub struct PakOperations;

impl PakOperations {
    /// Pack a directory with default options
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `source_dir` is not a directory and
    /// [`Error::Io`] if reading the tree or writing the archive fails.
    pub fn create<P: AsRef<Path>>(source_dir: P, output: P) -> Result<BuildSummary> {
        Self::create_with_options(source_dir, output, &BuildOptions::default())
    }

    /// Pack a directory
    ///
    /// # Errors
    ///
    /// As [`PakOperations::create`], plus [`Error::InvalidOptions`].
    pub fn create_with_options<P: AsRef<Path>>(
        source_dir: P,
        output: P,
        options: &BuildOptions,
    ) -> Result<BuildSummary> {
        Self::create_with_progress(source_dir, output, options, &|_| {})
    }

    /// Pack a directory with progress callback
    ///
    /// The output's parent directories are created as needed. An output
    /// placed inside `source_dir` is skipped by the walk. A failed build
    /// leaves no partial archive behind.
    pub fn create_with_progress<P: AsRef<Path>>(
        source_dir: P,
        output: P,
        options: &BuildOptions,
        progress: ProgressCallback,
    ) -> Result<BuildSummary> {
        let source_dir = source_dir.as_ref();
        let output = output.as_ref();

        let builder = PakBuilder::new(options.clone())?;
        let source = FsSource::new(source_dir)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Packing {} -> {}", source_dir.display(), output.display());

        let mut writer = BufWriter::new(File::create(output)?);
        let result = source
            .with_excluded(output)
            .and_then(|source| builder.build_with_progress(&source, &mut writer, progress))
            .and_then(|summary| {
                writer.flush()?;
                Ok(summary)
            });

        if result.is_err() {
            drop(writer);
            let _ = std::fs::remove_file(output);
        }
        result
    }

    /// Extract a PAK file to a directory
    ///
    /// # Errors
    ///
    /// Returns a format error if the archive is invalid and [`Error::Io`] if
    /// the output cannot be written.
    pub fn extract<P: AsRef<Path>>(pak_path: P, output_dir: P) -> Result<()> {
        Self::extract_with_progress(pak_path, output_dir, &|_| {})
    }

    /// Extract a PAK file to a directory with progress callback
    ///
    /// Every directory node is recreated, empty ones included.
    pub fn extract_with_progress<P: AsRef<Path>>(
        pak_path: P,
        output_dir: P,
        progress: ProgressCallback,
    ) -> Result<()> {
        let pak_path = pak_path.as_ref();
        let output_dir = output_dir.as_ref();

        progress(&PakProgress::new(PakPhase::ReadingTable, 1, 1));
        let mut archive = PakArchive::open(pak_path)?;

        std::fs::create_dir_all(output_dir)?;

        let nodes: Vec<NodeId> = archive.tree().walk().collect();
        let total = nodes.len();

        for (i, id) in nodes.into_iter().enumerate() {
            let relative = relative_path(archive.tree(), id)?;
            let target = output_dir.join(&relative);

            progress(&PakProgress::with_file(
                PakPhase::WritingFiles,
                i + 1,
                total,
                relative.to_string_lossy(),
            ));

            if archive.tree().node(id).is_dir {
                std::fs::create_dir_all(&target)?;
                continue;
            }

            let data = archive.read_node(id)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, data)?;
            tracing::debug!("Extracted {}", target.display());
        }

        tracing::info!("Extracted {} entries to {}", total, output_dir.display());
        progress(&PakProgress::new(PakPhase::Complete, total, total));
        Ok(())
    }

    /// Extract one file into `output_dir`, keeping only its file name
    ///
    /// Returns the path written.
    pub fn extract_file<P: AsRef<Path>>(pak_path: P, file_path: &str, output_dir: P) -> Result<PathBuf> {
        let mut archive = PakArchive::open(pak_path)?;
        let id = archive
            .tree()
            .find_file(file_path)
            .ok_or_else(|| missing(archive.tree(), file_path))?;

        let name = checked_name(&archive.tree().node(id).name)?.to_string();
        let data = archive.read_node(id)?;

        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;
        let target = output_dir.join(name);
        std::fs::write(&target, data)?;
        Ok(target)
    }

    /// List all paths in a PAK file, directories included
    pub fn list<P: AsRef<Path>>(pak_path: P) -> Result<Vec<String>> {
        let archive = PakArchive::open(pak_path)?;
        let tree = archive.tree();
        Ok(tree.walk().map(|id| tree.full_path(id)).collect())
    }

    /// List all nodes with sizes and flags
    pub fn list_detailed<P: AsRef<Path>>(pak_path: P) -> Result<Vec<PakEntryInfo>> {
        Ok(PakArchive::open(pak_path)?.list())
    }

    /// Header fields and totals of a PAK file
    pub fn info<P: AsRef<Path>>(pak_path: P) -> Result<PakInfo> {
        Ok(PakArchive::open(pak_path)?.info())
    }

    /// Read a single file from a PAK
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFoundInPak`] if no node has that path and
    /// [`Error::NotAFile`] if the path names a directory.
    pub fn read_file_bytes<P: AsRef<Path>>(pak_path: P, file_path: &str) -> Result<Vec<u8>> {
        PakArchive::open(pak_path)?.read_file(file_path)
    }
}

fn missing(tree: &PakTree, path: &str) -> Error {
    if tree.find_dir(path).is_some() {
        Error::NotAFile(path.to_string())
    } else {
        Error::FileNotFoundInPak(path.to_string())
    }
}

/// Reject names that would escape the output directory
fn checked_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidPath(PathBuf::from(name)));
    }
    Ok(name)
}

/// Output path of a node relative to the extraction root
fn relative_path(tree: &PakTree, id: NodeId) -> Result<PathBuf> {
    let mut names = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current.filter(|&n| n != tree.root()) {
        names.push(checked_name(&tree.node(node).name)?);
        current = tree.parent(node);
    }
    Ok(names.into_iter().rev().collect())
}
