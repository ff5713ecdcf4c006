//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Entry records of the PAK entry table

use std::borrow::Cow;
use std::io::{Cursor, Write};

use super::{ENTRY_SIZE, Endianness};
use crate::error::{Error, Result};

/// Flag bits of an entry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags(u8);

impl EntryFlags {
    /// The node is a directory
    pub const DIRECTORY: Self = Self(1 << 0);
    /// The payload is zlib-compressed
    pub const COMPRESSED: Self = Self(1 << 1);
    /// The source file was writable when packed
    pub const WRITABLE: Self = Self(1 << 2);

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// What an entry describes, selected by the directory flag
///
/// On disk both variants share two signed 64-bit fields; the flag decides
/// which meaning applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File {
        /// Offset of the payload relative to the data blob
        payload_offset: u64,
        /// Stored payload length (the compressed length when compressed)
        payload_size: u64,
        /// Original length, present only for compressed payloads
        uncompressed_size: Option<u64>,
    },
    Directory {
        /// Entry index of the first child, 0 when there are none
        first_child: u64,
        /// Number of immediate children
        child_count: u64,
    },
}

/// A single record of the entry table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakEntry {
    pub flags: EntryFlags,
    /// Sequential id assigned at build time (equal to the entry index)
    pub file_id: u64,
    /// Offset of the NUL-terminated name relative to the string blob
    pub string_offset: u64,
    pub kind: EntryKind,
}

impl PakEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(EntryFlags::COMPRESSED)
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.flags.contains(EntryFlags::WRITABLE)
    }

    /// Number of immediate children (0 for files)
    #[must_use]
    pub fn child_count(&self) -> u64 {
        match self.kind {
            EntryKind::Directory { child_count, .. } => child_count,
            EntryKind::File { .. } => 0,
        }
    }

    /// Stored payload length (0 for directories)
    #[must_use]
    pub fn payload_size(&self) -> u64 {
        match self.kind {
            EntryKind::File { payload_size, .. } => payload_size,
            EntryKind::Directory { .. } => 0,
        }
    }

    /// Logical file length: the uncompressed size when compressed,
    /// otherwise the stored size
    #[must_use]
    pub fn file_size(&self) -> u64 {
        match self.kind {
            EntryKind::File {
                payload_size,
                uncompressed_size,
                ..
            } => uncompressed_size.unwrap_or(payload_size),
            EntryKind::Directory { .. } => 0,
        }
    }

    /// Decode one record. `index` is only used for error reporting.
    pub fn decode(bytes: &[u8], index: usize, order: Endianness) -> Result<Self> {
        if bytes.len() < ENTRY_SIZE {
            return Err(Error::Truncated {
                section: "entry",
                expected: ENTRY_SIZE as u64,
                found: bytes.len() as u64,
            });
        }

        let flags = EntryFlags::from_bits(bytes[0]);
        let mut cursor = Cursor::new(&bytes[1..ENTRY_SIZE]);
        let file_id = order.read_u64(&mut cursor)?;
        let string_offset = order.read_i64(&mut cursor)?;
        let offset_or_first_child = order.read_i64(&mut cursor)?;
        let size_or_child_count = order.read_i64(&mut cursor)?;
        let uncompressed_size = order.read_i64(&mut cursor)?;

        let non_negative = |value: i64, field: &str| {
            u64::try_from(value).map_err(|_| Error::InvalidEntry {
                index,
                message: format!("negative {field}: {value}"),
            })
        };

        let string_offset = non_negative(string_offset, "string offset")?;
        let kind = if flags.contains(EntryFlags::DIRECTORY) {
            EntryKind::Directory {
                first_child: non_negative(offset_or_first_child, "first child")?,
                child_count: non_negative(size_or_child_count, "child count")?,
            }
        } else {
            EntryKind::File {
                payload_offset: non_negative(offset_or_first_child, "payload offset")?,
                payload_size: non_negative(size_or_child_count, "payload size")?,
                uncompressed_size: if flags.contains(EntryFlags::COMPRESSED) {
                    Some(non_negative(uncompressed_size, "uncompressed size")?)
                } else {
                    None
                },
            }
        };

        Ok(Self {
            flags,
            file_id,
            string_offset,
            kind,
        })
    }

    /// Encode the packed record (exactly [`ENTRY_SIZE`] bytes).
    pub fn encode<W: Write>(&self, writer: &mut W, order: Endianness) -> Result<()> {
        let (first, second, uncompressed) = match self.kind {
            EntryKind::File {
                payload_offset,
                payload_size,
                uncompressed_size,
            } => (payload_offset, payload_size, uncompressed_size.unwrap_or(0)),
            EntryKind::Directory {
                first_child,
                child_count,
            } => (first_child, child_count, 0),
        };

        writer.write_all(&[self.flags.bits()])?;
        order.write_u64(writer, self.file_id)?;
        order.write_i64(writer, to_signed(self.string_offset, "string offset")?)?;
        order.write_i64(writer, to_signed(first, "payload offset")?)?;
        order.write_i64(writer, to_signed(second, "payload size")?)?;
        order.write_i64(writer, to_signed(uncompressed, "uncompressed size")?)?;
        Ok(())
    }
}

fn to_signed(value: u64, what: &'static str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::TooLarge { what, value })
}

/// Decode `count` records from a raw entry table.
pub fn decode_entry_table(bytes: &[u8], count: usize, order: Endianness) -> Result<Vec<PakEntry>> {
    let needed = count * ENTRY_SIZE;
    if bytes.len() < needed {
        return Err(Error::Truncated {
            section: "entry table",
            expected: needed as u64,
            found: bytes.len() as u64,
        });
    }

    bytes
        .chunks_exact(ENTRY_SIZE)
        .take(count)
        .enumerate()
        .map(|(index, record)| PakEntry::decode(record, index, order))
        .collect()
}

/// Look up the NUL-terminated name starting at `offset` in the string blob.
pub fn string_at(blob: &[u8], offset: u64, index: usize) -> Result<Cow<'_, str>> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&start| start < blob.len())
        .ok_or_else(|| Error::InvalidEntry {
            index,
            message: format!("string offset {offset} outside string table of {} bytes", blob.len()),
        })?;

    let len = blob[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::InvalidEntry {
            index,
            message: format!("unterminated name at string offset {offset}"),
        })?;

    // Use lossy UTF-8 conversion for cross-platform compatibility
    Ok(String::from_utf8_lossy(&blob[start..start + len]))
}
