//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! PAK archive reader
//!
//! Opening an archive reads the header, the whole entry table and the whole
//! string blob, then rebuilds the directory tree. Payloads are read on demand.
//! Any failure during open drops the reader; no half-initialised archive is
//! ever handed out.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use super::file::PakFile;
use super::format::{ENTRY_SIZE, Endianness, EntryKind, PakEntry, PakHeader, decode_entry_table};
use super::resolve::{Lookup, Resolution};
use super::tree::{NodeId, PakTree};
use super::types::{PakEntryInfo, PakInfo};
use crate::error::{Error, Result};

/// Initial buffer cap for section reads, so a corrupt size cannot force a
/// huge allocation before the short read is noticed
const READ_CHUNK: u64 = 1 << 20;

/// An open PAK archive
pub struct PakArchive<R: Read + Seek> {
    reader: BufReader<R>,
    header: PakHeader,
    entries: Vec<PakEntry>,
    strings: Vec<u8>,
    tree: PakTree,
}

impl PakArchive<File> {
    /// Open an archive on disk
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a valid
    /// archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening {}", path.display());
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read + Seek> PakArchive<R> {
    /// Read the header and tables from `reader`
    ///
    /// # Errors
    /// Returns a format error if the header is invalid, a section is shorter
    /// than declared, or the entry table does not describe a tree.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        reader.seek(SeekFrom::Start(0))?;

        let header = PakHeader::read_from(&mut reader)?;
        header.validate_layout()?;

        let count = usize::try_from(header.entry_count).map_err(|_| Error::TooLarge {
            what: "entry count",
            value: header.entry_count,
        })?;
        let table_size = header
            .entry_count
            .checked_mul(ENTRY_SIZE as u64)
            .ok_or(Error::TooLarge {
                what: "entry count",
                value: header.entry_count,
            })?;

        let table = read_section(&mut reader, "entry table", header.entry_start, table_size)?;
        let entries = decode_entry_table(&table, count, header.endianness)?;

        let strings = read_section(
            &mut reader,
            "string table",
            header.string_table_offset,
            header.string_table_size,
        )?;

        let tree = PakTree::from_entries(&entries, &strings)?;

        tracing::debug!(
            "Loaded {} entries ({} endian), data at {:#x}",
            entries.len(),
            header.endianness.as_str(),
            header.data_offset
        );

        Ok(Self {
            reader,
            header,
            entries,
            strings,
            tree,
        })
    }

    #[must_use]
    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    #[must_use]
    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&PakEntry> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Raw string blob
    #[must_use]
    pub fn strings(&self) -> &[u8] {
        &self.strings
    }

    #[must_use]
    pub fn tree(&self) -> &PakTree {
        &self.tree
    }

    /// Entry backing a node, `None` for the root
    #[must_use]
    pub fn node_entry(&self, id: NodeId) -> Option<&PakEntry> {
        self.tree.get(id)?.entry.and_then(|i| self.entries.get(i))
    }

    /// Open a read session on the file at `path`.
    ///
    /// Returns `Ok(None)` if no file has that path.
    pub fn open_file(&mut self, path: &str) -> Result<Option<PakFile<'_, R>>> {
        match self.tree.find_file(path) {
            Some(id) => self.file(id).map(Some),
            None => Ok(None),
        }
    }

    /// Open a read session on a file node.
    ///
    /// # Errors
    /// Returns [`Error::NotAFile`] for directory nodes.
    pub fn file(&mut self, id: NodeId) -> Result<PakFile<'_, R>> {
        let entry = self.node_entry(id).filter(|e| !e.is_dir()).copied();
        match entry {
            Some(entry) => Ok(PakFile::new(self, id, entry)),
            None => Err(Error::NotAFile(self.tree.full_path(id))),
        }
    }

    /// Full, decompressed contents of a file node
    pub fn read_node(&mut self, id: NodeId) -> Result<Vec<u8>> {
        self.file(id)?.read_all()
    }

    /// Full, decompressed contents of the file at `path`
    ///
    /// # Errors
    /// [`Error::FileNotFoundInPak`] if nothing has that path,
    /// [`Error::NotAFile`] if it names a directory.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        match self.tree.lookup(path, Lookup::File) {
            Resolution::Found(id) => self.read_node(id),
            Resolution::WrongKind(_) => Err(Error::NotAFile(path.to_string())),
            Resolution::NotFound => Err(Error::FileNotFoundInPak(path.to_string())),
        }
    }

    /// One listing record per node, in archive order
    #[must_use]
    pub fn list(&self) -> Vec<PakEntryInfo> {
        self.tree
            .walk()
            .filter_map(|id| {
                let entry = self.node_entry(id)?;
                Some(PakEntryInfo {
                    path: self.tree.full_path(id),
                    is_dir: entry.is_dir(),
                    file_id: entry.file_id,
                    size: if entry.is_dir() {
                        entry.child_count()
                    } else {
                        entry.file_size()
                    },
                    stored_size: entry.payload_size(),
                    compressed: entry.is_compressed(),
                })
            })
            .collect()
    }

    /// Archive-level statistics
    #[must_use]
    pub fn info(&self) -> PakInfo {
        let mut info = PakInfo {
            header: self.header,
            file_count: 0,
            directory_count: 0,
            compressed_count: 0,
            total_size: 0,
            stored_size: 0,
        };
        for entry in &self.entries {
            if entry.is_dir() {
                info.directory_count += 1;
                continue;
            }
            info.file_count += 1;
            if entry.is_compressed() {
                info.compressed_count += 1;
            }
            info.total_size += entry.file_size();
            info.stored_size += entry.payload_size();
        }
        info
    }

    /// Fill `buf` from the stored payload of `entry`, starting `pos` bytes in
    pub(crate) fn read_stored_at(&mut self, entry: &PakEntry, pos: u64, buf: &mut [u8]) -> Result<()> {
        let start = self.payload_start(entry)?;
        let expected = buf.len() as u64;
        self.reader.seek(SeekFrom::Start(start + pos))?;
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                Error::Truncated {
                    section: "payload",
                    expected,
                    found: 0,
                }
            } else {
                Error::Io(e)
            }
        })
    }

    /// The whole stored payload of `entry`
    pub(crate) fn read_stored(&mut self, entry: &PakEntry) -> Result<Vec<u8>> {
        let start = self.payload_start(entry)?;
        read_section(&mut self.reader, "payload", start, entry.payload_size())
    }

    fn payload_start(&self, entry: &PakEntry) -> Result<u64> {
        let EntryKind::File { payload_offset, .. } = entry.kind else {
            return Err(Error::InvalidEntry {
                index: entry.file_id as usize,
                message: "directory has no payload".to_string(),
            });
        };
        self.header
            .data_offset
            .checked_add(payload_offset)
            .ok_or_else(|| Error::InvalidEntry {
                index: entry.file_id as usize,
                message: format!("payload offset {payload_offset:#x} overflows"),
            })
    }
}

/// Read exactly `len` bytes at `offset`, reporting a short read as truncation
fn read_section<R: Read + Seek>(
    reader: &mut R,
    section: &'static str,
    offset: u64,
    len: u64,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut buf = Vec::with_capacity(usize::try_from(len.min(READ_CHUNK)).unwrap_or(0));
    reader.take(len).read_to_end(&mut buf)?;

    if (buf.len() as u64) < len {
        return Err(Error::Truncated {
            section,
            expected: len,
            found: buf.len() as u64,
        });
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pak::creator::PakBuilder;
    use crate::pak::options::BuildOptions;
    use crate::pak::source::MemorySource;
    use std::io::Cursor;

    fn pack(source: &MemorySource, options: BuildOptions) -> Vec<u8> {
        let mut out = Vec::new();
        PakBuilder::new(options).unwrap().build(source, &mut out).unwrap();
        out
    }

    fn sample() -> MemorySource {
        MemorySource::new()
            .with_file("root/a.txt", b"alpha".to_vec())
            .with_file("root/sub/b.txt", b"beta beta beta beta beta beta beta beta".to_vec())
            .with_dir("root/empty")
    }

    #[test]
    fn test_open_and_read() {
        let bytes = pack(&sample(), BuildOptions::default());
        let mut archive = PakArchive::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.entry_count(), 5);
        assert_eq!(archive.read_file("/root/a.txt").unwrap(), b"alpha");
        assert_eq!(
            archive.read_file("/root/sub/b.txt").unwrap(),
            b"beta beta beta beta beta beta beta beta"
        );
    }

    #[test]
    fn test_read_file_errors() {
        let bytes = pack(&sample(), BuildOptions::default());
        let mut archive = PakArchive::from_reader(Cursor::new(bytes)).unwrap();

        assert!(matches!(archive.read_file("/root/sub"), Err(Error::NotAFile(_))));
        assert!(matches!(
            archive.read_file("/root/nope"),
            Err(Error::FileNotFoundInPak(_))
        ));
        assert!(archive.open_file("/root/nope").unwrap().is_none());
    }

    #[test]
    fn test_list_records() {
        let bytes = pack(&sample(), BuildOptions::new().with_compression(false));
        let archive = PakArchive::from_reader(Cursor::new(bytes)).unwrap();
        let list = archive.list();

        let paths: Vec<_> = list.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["/root", "/root/a.txt", "/root/sub", "/root/sub/b.txt", "/root/empty"]
        );
        assert_eq!(list[0].size, 3);
        assert_eq!(list[1].size, 5);
        assert!(!list[1].compressed);
    }

    #[test]
    fn test_info_counts() {
        let bytes = pack(&sample(), BuildOptions::default());
        let archive = PakArchive::from_reader(Cursor::new(bytes)).unwrap();
        let info = archive.info();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.directory_count, 3);
        assert_eq!(info.total_size, 5 + 39);
        assert_eq!(info.endianness(), Endianness::Little);
    }

    #[test]
    fn test_truncated_string_table() {
        let bytes = pack(&sample(), BuildOptions::default());
        let archive = PakArchive::from_reader(Cursor::new(bytes.clone())).unwrap();
        let cut = archive.header().string_table_offset as usize + 3;

        let err = PakArchive::from_reader(Cursor::new(bytes[..cut].to_vec())).err().unwrap();
        assert!(matches!(
            err,
            Error::Truncated { section: "string table", found: 3, .. }
        ));
    }

    #[test]
    fn test_truncated_entry_table() {
        let bytes = pack(&sample(), BuildOptions::default());
        let err = PakArchive::from_reader(Cursor::new(bytes[..80].to_vec())).err().unwrap();
        assert!(matches!(err, Error::Truncated { section: "entry table", .. }));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = pack(&sample(), BuildOptions::default());
        bytes[0..4].copy_from_slice(b"ZIP!");
        let err = PakArchive::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, Error::InvalidMagic(_)));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_file_shorter_than_header() {
        let err = PakArchive::from_reader(Cursor::new(b"PAK0".to_vec())).err().unwrap();
        assert!(matches!(err, Error::Truncated { section: "header", found: 4, .. }));
    }

    #[test]
    fn test_lenient_read_of_corrupt_payload() {
        let data = vec![b'z'; 2000];
        let source = MemorySource::new().with_file("z.bin", data);
        let mut bytes = pack(&source, BuildOptions::default());

        let archive = PakArchive::from_reader(Cursor::new(bytes.clone())).unwrap();
        let entry = archive.entries()[0];
        assert!(entry.is_compressed());
        let start = archive.header().data_offset as usize;
        let stored_len = entry.payload_size() as usize;
        drop(archive);

        // Clobber the zlib header so inflation fails
        bytes[start] = 0x00;
        bytes[start + 1] = 0x00;
        let expected = bytes[start..start + stored_len].to_vec();

        let mut archive = PakArchive::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.read_file("/z.bin").unwrap(), expected);
    }
}
