//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! PAK creation functionality
//!
//! The source tree is walked depth-first. Entries and names are staged in
//! memory, payloads in an anonymous temporary file; once the walk is done the
//! header is computed from the staged lengths and the sections are written
//! out in order.
//!
//! A directory's child count is only known after its subtree has been
//! emitted, so its record is reserved before descending and patched
//! afterwards. The entry table stays contiguous and in preorder.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::format::{
    EntryFlags, EntryKind, HEADER_SIZE, PakEntry, PakHeader, padding_len, write_padded,
    write_padding,
};
use super::options::BuildOptions;
use super::source::{SourceItem, SourceKind, TreeSource};
use super::types::{BuildSummary, PakPhase, PakProgress, ProgressCallback};
use crate::compression::StoredPayload;
use crate::error::{Error, Result};

/// Sections collected during the walk
struct Staging {
    entries: Vec<PakEntry>,
    strings: Vec<u8>,
    data: BufWriter<File>,
    data_len: u64,
    summary: BuildSummary,
}

impl Staging {
    fn new() -> Result<Self> {
        Ok(Self {
            entries: Vec::new(),
            strings: Vec::new(),
            data: BufWriter::new(tempfile::tempfile()?),
            data_len: 0,
            summary: BuildSummary::default(),
        })
    }

    /// Append a name to the string blob, returning its offset
    fn push_name(&mut self, name: &str) -> u64 {
        let offset = self.strings.len() as u64;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        offset
    }

    /// Append a padded payload to the data blob, returning its offset
    fn push_payload(&mut self, payload: &StoredPayload) -> io::Result<u64> {
        let offset = self.data_len;
        self.data_len += write_padded(&mut self.data, payload.bytes())?;
        Ok(offset)
    }
}

/// Builds a PAK archive from a [`TreeSource`]
#[derive(Debug, Clone, Default)]
pub struct PakBuilder {
    options: BuildOptions,
}

impl PakBuilder {
    /// # Errors
    /// Returns an error if the options fail validation.
    pub fn new(options: BuildOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Pack `source` into `output`
    pub fn build<S: TreeSource, W: Write>(&self, source: &S, output: &mut W) -> Result<BuildSummary> {
        self.build_with_progress(source, output, &|_| {})
    }

    /// Pack `source` into `output` with progress callback
    pub fn build_with_progress<S: TreeSource, W: Write>(
        &self,
        source: &S,
        output: &mut W,
        progress: ProgressCallback,
    ) -> Result<BuildSummary> {
        let mut staging = Staging::new()?;

        for item in source.children(Path::new(""))? {
            self.pack_item(source, &item, &mut staging, progress)?;
        }

        progress(&PakProgress::new(
            PakPhase::WritingArchive,
            staging.entries.len(),
            staging.entries.len(),
        ));
        let summary = self.write_archive(staging, output)?;

        tracing::info!(
            "Stored {} entries ({} files, {} compressed), {} bytes",
            summary.entry_count,
            summary.file_count,
            summary.compressed_count,
            summary.archive_size
        );
        progress(&PakProgress::new(
            PakPhase::Complete,
            summary.entry_count as usize,
            summary.entry_count as usize,
        ));
        Ok(summary)
    }

    /// Emit one item and, for directories, its whole subtree.
    ///
    /// Returns `false` if the item was skipped and produced no entry.
    fn pack_item<S: TreeSource>(
        &self,
        source: &S,
        item: &SourceItem,
        staging: &mut Staging,
        progress: ProgressCallback,
    ) -> Result<bool> {
        if item.kind == SourceKind::Skip || self.options.is_ignored(&item.name) {
            tracing::debug!("Skipping {}", item.path.display());
            staging.summary.skipped_count += 1;
            return Ok(false);
        }

        let index = staging.entries.len();
        let mut flags = EntryFlags::empty();
        if item.writable {
            flags = flags.with(EntryFlags::WRITABLE);
        }
        let string_offset = staging.push_name(&item.name);

        if item.kind == SourceKind::File {
            progress(&PakProgress::with_file(
                PakPhase::CompressingFiles,
                index + 1,
                0,
                item.path.to_string_lossy(),
            ));

            let raw = source.read(item)?;
            let raw_len = raw.len() as u64;
            if raw_len != item.len {
                return Err(Error::SourceChanged {
                    path: item.path.clone(),
                    listed: item.len,
                    read: raw_len,
                });
            }
            let payload = StoredPayload::encode(raw, self.options.effective_level())?;
            if payload.is_compressed() {
                flags = flags.with(EntryFlags::COMPRESSED);
                staging.summary.compressed_count += 1;
            }
            let payload_offset = staging.push_payload(&payload)?;

            tracing::debug!(
                "{} -> entry {index}, {raw_len} bytes stored as {}",
                item.path.display(),
                payload.stored_len()
            );

            staging.summary.file_count += 1;
            staging.summary.raw_bytes += raw_len;
            staging.summary.stored_bytes += payload.stored_len();
            staging.entries.push(PakEntry {
                flags,
                file_id: index as u64,
                string_offset,
                kind: EntryKind::File {
                    payload_offset,
                    payload_size: payload.stored_len(),
                    uncompressed_size: payload.uncompressed_size(),
                },
            });
            return Ok(true);
        }

        // Reserve the directory slot; the child count is patched in below
        staging.entries.push(PakEntry {
            flags: flags.with(EntryFlags::DIRECTORY),
            file_id: index as u64,
            string_offset,
            kind: EntryKind::Directory {
                first_child: 0,
                child_count: 0,
            },
        });

        let mut child_count = 0u64;
        for child in source.children(&item.path)? {
            if self.pack_item(source, &child, staging, progress)? {
                child_count += 1;
            }
        }

        staging.entries[index].kind = EntryKind::Directory {
            first_child: if child_count == 0 { 0 } else { index as u64 + 1 },
            child_count,
        };
        staging.summary.directory_count += 1;
        Ok(true)
    }

    /// Concatenate the staged sections behind a freshly computed header.
    fn write_archive<W: Write>(&self, staging: Staging, output: &mut W) -> Result<BuildSummary> {
        let Staging {
            entries,
            strings,
            data,
            data_len,
            mut summary,
        } = staging;

        let order = self.options.endianness;
        let header = PakHeader::for_sections(order, entries.len() as u64, strings.len() as u64);

        header.write_to(output)?;
        write_padding(output, header.entry_start - HEADER_SIZE as u64)?;

        for entry in &entries {
            entry.encode(output, order)?;
        }
        write_padding(output, padding_len(header.entry_table_size()))?;

        write_padded(output, &strings)?;

        let mut data = data.into_inner().map_err(io::IntoInnerError::into_error)?;
        data.seek(SeekFrom::Start(0))?;
        let copied = io::copy(&mut data, output)?;
        debug_assert_eq!(copied, data_len);

        output.flush()?;

        summary.entry_count = header.entry_count;
        summary.archive_size = header.data_offset + data_len;
        Ok(summary)
    }
}

/// Pack the directory `source` into the file `pak` with default options
///
/// # Errors
/// Returns an error if the directory cannot be read or the archive cannot be
/// written.
pub fn create_pak<P: AsRef<Path>>(source: P, pak: P) -> Result<BuildSummary> {
    super::operations::PakOperations::create(source, pak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pak::format::{ALIGNMENT, ENTRY_SIZE, PADDING_BYTE, decode_entry_table, string_at};
    use crate::pak::source::MemorySource;

    fn build(source: &MemorySource, options: BuildOptions) -> (Vec<u8>, BuildSummary) {
        let mut out = Vec::new();
        let summary = PakBuilder::new(options).unwrap().build(source, &mut out).unwrap();
        (out, summary)
    }

    fn entries_of(bytes: &[u8]) -> (PakHeader, Vec<PakEntry>) {
        let header = PakHeader::parse(&bytes[..HEADER_SIZE]).unwrap();
        let start = header.entry_start as usize;
        let table = &bytes[start..start + header.entry_count as usize * ENTRY_SIZE];
        let entries = decode_entry_table(table, header.entry_count as usize, header.endianness).unwrap();
        (header, entries)
    }

    #[test]
    fn test_empty_source() {
        let (bytes, summary) = build(&MemorySource::new(), BuildOptions::default());
        let (header, entries) = entries_of(&bytes);

        assert_eq!(summary.entry_count, 0);
        assert!(entries.is_empty());
        assert_eq!(header.entry_start, 64);
        assert_eq!(header.string_table_offset, 64);
        assert_eq!(header.data_offset, 64);
        assert_eq!(bytes.len(), 64);
        assert!(bytes[HEADER_SIZE..].iter().all(|&b| b == PADDING_BYTE));
    }

    #[test]
    fn test_preorder_with_child_counts() {
        let source = MemorySource::new()
            .with_file("root/a.txt", b"alpha".to_vec())
            .with_file("root/sub/b.txt", b"beta".to_vec())
            .with_dir("root/empty");
        let (bytes, summary) = build(&source, BuildOptions::default());
        let (header, entries) = entries_of(&bytes);

        assert_eq!(summary.entry_count, 5);
        assert_eq!(summary.directory_count, 3);
        assert_eq!(summary.file_count, 2);

        let strings = &bytes[header.string_table_offset as usize..];
        let names: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| string_at(strings, e.string_offset, i).unwrap().into_owned())
            .collect();
        assert_eq!(names, ["root", "a.txt", "sub", "b.txt", "empty"]);

        assert_eq!(
            entries[0].kind,
            EntryKind::Directory { first_child: 1, child_count: 3 }
        );
        assert_eq!(
            entries[2].kind,
            EntryKind::Directory { first_child: 3, child_count: 1 }
        );
        assert_eq!(
            entries[4].kind,
            EntryKind::Directory { first_child: 0, child_count: 0 }
        );
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.file_id, i as u64);
        }
    }

    #[test]
    fn test_skipped_items_consume_nothing() {
        let source = MemorySource::new()
            .with_symlink("dir/link")
            .with_file("dir/.git/config", b"x".to_vec())
            .with_file("dir/real.txt", b"real".to_vec());
        let (bytes, summary) = build(&source, BuildOptions::default());
        let (header, entries) = entries_of(&bytes);

        assert_eq!(summary.skipped_count, 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].child_count(), 1);
        assert_eq!(entries[1].file_id, 1);
        assert_eq!(header.string_table_size, "dir\0real.txt\0".len() as u64);
    }

    #[test]
    fn test_payloads_are_padded_and_flagged() {
        let repetitive = vec![b'x'; 1000];
        let source = MemorySource::new()
            .with_file("big.txt", repetitive)
            .with_file("small.txt", b"abc".to_vec());
        let (bytes, _) = build(&source, BuildOptions::default());
        let (header, entries) = entries_of(&bytes);

        let EntryKind::File { payload_offset, payload_size, uncompressed_size } = entries[0].kind else {
            panic!("expected file");
        };
        assert!(entries[0].is_compressed());
        assert_eq!(payload_offset, 0);
        assert_eq!(uncompressed_size, Some(1000));

        let EntryKind::File { payload_offset: second, payload_size: small, .. } = entries[1].kind else {
            panic!("expected file");
        };
        assert!(!entries[1].is_compressed());
        assert_eq!(small, 3);
        assert_eq!(second, payload_size.div_ceil(ALIGNMENT) * ALIGNMENT);
        assert_eq!(bytes.len() as u64, header.data_offset + second + ALIGNMENT);
    }

    #[test]
    fn test_compression_disabled_stores_raw() {
        let source = MemorySource::new().with_file("zeros.bin", vec![0u8; 512]);
        let (bytes, summary) = build(&source, BuildOptions::new().with_compression(false));
        let (_, entries) = entries_of(&bytes);

        assert_eq!(summary.compressed_count, 0);
        assert!(!entries[0].is_compressed());
        assert_eq!(entries[0].payload_size(), 512);
    }

    #[test]
    fn test_writable_flag_follows_source() {
        let source = MemorySource::new()
            .with_readonly_file("dir/locked.txt", b"locked".to_vec())
            .with_file("dir/open.txt", b"open".to_vec());
        let (bytes, _) = build(&source, BuildOptions::default());
        let (_, entries) = entries_of(&bytes);

        assert!(entries[0].is_writable());
        assert!(!entries[1].is_writable());
        assert!(entries[2].is_writable());
    }

    /// Lists one file with a stale length
    struct ShrinkingSource;

    impl TreeSource for ShrinkingSource {
        fn children(&self, dir: &Path) -> Result<Vec<SourceItem>> {
            if !dir.as_os_str().is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![SourceItem {
                name: "log.txt".to_string(),
                kind: SourceKind::File,
                len: 100,
                path: "log.txt".into(),
                writable: true,
            }])
        }

        fn read(&self, _item: &SourceItem) -> Result<Vec<u8>> {
            Ok(b"truncated".to_vec())
        }
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let mut out = Vec::new();
        let err = PakBuilder::default().build(&ShrinkingSource, &mut out).unwrap_err();
        assert!(matches!(
            err,
            Error::SourceChanged { listed: 100, read: 9, .. }
        ));
    }

    #[test]
    fn test_big_endian_archive() {
        let source = MemorySource::new().with_file("a", b"hello".to_vec());
        let options = BuildOptions::new().with_endianness(crate::pak::format::Endianness::Big);
        let (bytes, _) = build(&source, options);
        let (header, entries) = entries_of(&bytes);

        assert_eq!(&bytes[8..10], &[0xFE, 0xFF]);
        assert_eq!(header.entry_count, 1);
        assert_eq!(entries[0].payload_size(), 5);
    }
}
