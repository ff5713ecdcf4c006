//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Read sessions on single archive files
//!
//! A [`PakFile`] borrows its archive mutably and carries a cursor in
//! `[0, len]`. Whole-file reads work for every payload; cursor reads are
//! served from stored payloads only, since compressed payloads cannot be
//! entered mid-stream. [`PakFile::read_range`] inflates first and then
//! copies out the requested window.

use std::io::{self, Read, Seek, SeekFrom};

use super::archive::PakArchive;
use super::format::{EntryKind, PakEntry};
use super::tree::NodeId;
use crate::compression::inflate_or_raw;
use crate::error::{Error, Result};

/// Cursor origin for [`PakFile::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Absolute position
    Start(u64),
    /// Signed offset from the cursor
    Current(i64),
    /// Distance back from the end: `FromEnd(3)` on a 10-byte file is 7
    FromEnd(u64),
}

/// An open file inside a [`PakArchive`]
pub struct PakFile<'a, R: Read + Seek> {
    archive: &'a mut PakArchive<R>,
    node: NodeId,
    entry: PakEntry,
    pos: u64,
}

impl<'a, R: Read + Seek> PakFile<'a, R> {
    pub(crate) fn new(archive: &'a mut PakArchive<R>, node: NodeId, entry: PakEntry) -> Self {
        Self {
            archive,
            node,
            entry,
            pos: 0,
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn entry(&self) -> &PakEntry {
        &self.entry
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.archive.tree().node(self.node).name
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.archive.tree().full_path(self.node)
    }

    #[must_use]
    pub fn file_id(&self) -> u64 {
        self.entry.file_id
    }

    /// Stored payload length; the cursor range is `0..=len()`
    #[must_use]
    pub fn len(&self) -> u64 {
        self.entry.payload_size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.entry.is_compressed()
    }

    /// Recorded original size of a compressed payload
    #[must_use]
    pub fn uncompressed_len(&self) -> Option<u64> {
        match self.entry.kind {
            EntryKind::File {
                uncompressed_size, ..
            } => uncompressed_size,
            EntryKind::Directory { .. } => None,
        }
    }

    /// Move the cursor.
    ///
    /// # Errors
    /// Returns [`Error::SeekOutOfRange`] if the target lies outside
    /// `[0, len]`; the cursor is left where it was.
    pub fn seek(&mut self, mode: SeekMode) -> Result<u64> {
        let target = match mode {
            SeekMode::Start(offset) => i128::from(offset),
            SeekMode::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekMode::FromEnd(distance) => i128::from(self.len()) - i128::from(distance),
        };
        self.seek_to(target)
    }

    fn seek_to(&mut self, target: i128) -> Result<u64> {
        let len = self.len();
        if target < 0 || target > i128::from(len) {
            return Err(Error::SeekOutOfRange {
                requested: target,
                len,
            });
        }

        // In range, so it fits in u64
        self.pos = target as u64;
        Ok(self.pos)
    }

    /// Read the whole file, inflating compressed payloads.
    ///
    /// A compressed payload that fails to inflate to its recorded size is
    /// returned as stored. The cursor is not moved.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let stored = self.archive.read_stored(&self.entry)?;
        match self.uncompressed_len() {
            Some(expected) if self.is_compressed() => Ok(inflate_or_raw(stored, expected).0),
            _ => Ok(stored),
        }
    }

    /// Read from the cursor into `buf`, advancing it.
    ///
    /// Returns 0 at the end of the file.
    ///
    /// # Errors
    /// Returns [`Error::CompressedPartialRead`] for compressed payloads.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.is_compressed() {
            return Err(Error::CompressedPartialRead(self.path()));
        }

        let remaining = self.len() - self.pos;
        let count = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        if count == 0 {
            return Ok(0);
        }

        let entry = self.entry;
        self.archive.read_stored_at(&entry, self.pos, &mut buf[..count])?;
        self.pos += count as u64;
        Ok(count)
    }

    /// Copy decompressed bytes starting at `offset` into `buf`.
    ///
    /// Offsets count into the file's contents, not the stored payload, and
    /// the cursor is not moved. Compressed payloads are inflated in full on
    /// every call. Returns 0 at the end of the contents.
    ///
    /// # Errors
    /// Returns [`Error::SeekOutOfRange`] if `offset` lies past the end.
    pub fn read_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let contents = self.read_all()?;
        let len = contents.len() as u64;
        if offset > len {
            return Err(Error::SeekOutOfRange {
                requested: i128::from(offset),
                len,
            });
        }

        let window = &contents[offset as usize..];
        let count = window.len().min(buf.len());
        buf[..count].copy_from_slice(&window[..count]);
        Ok(count)
    }

    /// Read a `u32` at the cursor in the archive's byte order
    pub fn read_u32(&mut self) -> Result<u32> {
        if self.is_compressed() {
            return Err(Error::CompressedPartialRead(self.path()));
        }
        let remaining = self.len() - self.pos;
        if remaining < 4 {
            return Err(Error::Truncated {
                section: "file",
                expected: 4,
                found: remaining,
            });
        }
        let order = self.archive.endianness();
        Ok(order.read_u32(self)?)
    }
}

fn into_io(err: Error) -> io::Error {
    match err {
        Error::Io(e) => e,
        other => io::Error::other(other),
    }
}

impl<R: Read + Seek> Read for PakFile<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        PakFile::read(self, buf).map_err(into_io)
    }
}

impl<R: Read + Seek> Seek for PakFile<'_, R> {
    /// `SeekFrom::End` keeps std semantics (`len + offset`)
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len()) + i128::from(delta),
        };
        self.seek_to(target).map_err(into_io)
    }
}
