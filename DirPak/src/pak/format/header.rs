//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! PAK header record

use std::io::{Cursor, Read, Write};

use super::{ALIGNMENT, ENDIAN_MARKER, Endianness, HEADER_SIZE, MAGIC, VERSION, align_up};
use crate::error::{Error, Result};

/// Header of a PAK archive
///
/// Magic and version are implied: a parsed header always carried the
/// current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakHeader {
    /// Byte order of every numeric field
    pub endianness: Endianness,
    /// Absolute offset of the entry table
    pub entry_start: u64,
    /// Number of entry records
    pub entry_count: u64,
    /// Absolute offset of the string blob
    pub string_table_offset: u64,
    /// Unpadded length of the string blob
    pub string_table_size: u64,
    /// Absolute offset of the data blob
    pub data_offset: u64,
}

impl PakHeader {
    /// Compute the layout for an archive whose staged sections have the
    /// given lengths. Each section starts at the next aligned boundary.
    #[must_use]
    pub fn for_sections(endianness: Endianness, entry_count: u64, string_table_size: u64) -> Self {
        let entry_start = align_up(HEADER_SIZE as u64);
        let entry_table_size = entry_count * super::ENTRY_SIZE as u64;
        let string_table_offset = align_up(entry_start + entry_table_size);
        let data_offset = align_up(string_table_offset + string_table_size);

        Self {
            endianness,
            entry_start,
            entry_count,
            string_table_offset,
            string_table_size,
            data_offset,
        }
    }

    /// Byte length of the entry table
    #[must_use]
    pub fn entry_table_size(&self) -> u64 {
        self.entry_count * super::ENTRY_SIZE as u64
    }

    /// Read and validate a header from the start of `reader`.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if fewer than [`HEADER_SIZE`] bytes are
    /// available, [`Error::InvalidMagic`] or [`Error::UnsupportedVersion`] on
    /// a foreign file, and [`Error::InvalidEndianMarker`] if the byte order
    /// cannot be determined.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        reader.take(HEADER_SIZE as u64).read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Parse a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// # Errors
    /// As [`PakHeader::read_from`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Truncated {
                section: "header",
                expected: HEADER_SIZE as u64,
                found: bytes.len() as u64,
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let marker = [bytes[8], bytes[9]];
        let endianness = Endianness::from_marker(marker)
            .ok_or_else(|| Error::InvalidEndianMarker(u16::from_le_bytes(marker)))?;

        let mut cursor = Cursor::new(&bytes[10..HEADER_SIZE]);
        Ok(Self {
            endianness,
            entry_start: endianness.read_u64(&mut cursor)?,
            entry_count: endianness.read_u64(&mut cursor)?,
            string_table_offset: endianness.read_u64(&mut cursor)?,
            string_table_size: endianness.read_u64(&mut cursor)?,
            data_offset: endianness.read_u64(&mut cursor)?,
        })
    }

    /// Write the packed header (exactly [`HEADER_SIZE`] bytes).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let order = self.endianness;
        writer.write_all(&MAGIC)?;
        writer.write_all(&VERSION)?;
        order.write_u16(writer, ENDIAN_MARKER)?;
        order.write_u64(writer, self.entry_start)?;
        order.write_u64(writer, self.entry_count)?;
        order.write_u64(writer, self.string_table_offset)?;
        order.write_u64(writer, self.string_table_size)?;
        order.write_u64(writer, self.data_offset)?;
        Ok(())
    }

    /// Check that every section offset is aligned.
    pub fn validate_layout(&self) -> Result<()> {
        for (field, offset) in [
            ("entry table", self.entry_start),
            ("string table", self.string_table_offset),
            ("data", self.data_offset),
        ] {
            if offset % ALIGNMENT != 0 {
                return Err(Error::Misaligned { field, offset });
            }
        }
        Ok(())
    }
}
