//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! PAK container binary layout
//!
//! ```text
//! +--------------------+ 0
//! | header (50 bytes)  |
//! +--------------------+ entry_start        (32-aligned)
//! | entry table        |  entry_count x 41 bytes, preorder
//! +--------------------+ string_table_offset (32-aligned)
//! | string blob        |  NUL-terminated names
//! +--------------------+ data_offset         (32-aligned)
//! | data blob          |  payloads, each padded to 32 bytes
//! +--------------------+
//! ```
//!
//! Every gap is filled with [`PADDING_BYTE`] rather than zero so that padding
//! stays distinguishable from zero-filled payload bytes.

mod entry;
mod header;

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

pub use entry::{EntryFlags, EntryKind, PakEntry, decode_entry_table, string_at};
pub use header::PakHeader;

/// PAK magic bytes: "PAK" followed by the major version digit
pub const MAGIC: [u8; 4] = [b'P', b'A', b'K', b'0' + VERSION_MAJOR];

/// Major format version
pub const VERSION_MAJOR: u8 = 0;

/// Format version as stored: major, minor, patch, reserved
pub const VERSION: [u8; 4] = [VERSION_MAJOR, 1, 0, 0];

/// Size of the packed header record
pub const HEADER_SIZE: usize = 50;

/// Size of one packed entry record
pub const ENTRY_SIZE: usize = 41;

/// Section and payload alignment
pub const ALIGNMENT: u64 = 32;

/// Fill byte for every alignment gap
pub const PADDING_BYTE: u8 = 0xFF;

/// Endian marker as written in the archive's own byte order
pub const ENDIAN_MARKER: u16 = 0xFEFF;

/// Byte order of every multi-byte field in an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    /// Detect the byte order from the two marker bytes.
    ///
    /// Returns `None` if the bytes are neither `FF FE` nor `FE FF`.
    #[must_use]
    pub fn from_marker(bytes: [u8; 2]) -> Option<Self> {
        match LittleEndian::read_u16(&bytes) {
            ENDIAN_MARKER => Some(Self::Little),
            0xFFFE => Some(Self::Big),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }

    pub(crate) fn read_u32<R: Read>(self, reader: &mut R) -> io::Result<u32> {
        match self {
            Self::Little => reader.read_u32::<LittleEndian>(),
            Self::Big => reader.read_u32::<BigEndian>(),
        }
    }

    pub(crate) fn read_u64<R: Read>(self, reader: &mut R) -> io::Result<u64> {
        match self {
            Self::Little => reader.read_u64::<LittleEndian>(),
            Self::Big => reader.read_u64::<BigEndian>(),
        }
    }

    pub(crate) fn read_i64<R: Read>(self, reader: &mut R) -> io::Result<i64> {
        match self {
            Self::Little => reader.read_i64::<LittleEndian>(),
            Self::Big => reader.read_i64::<BigEndian>(),
        }
    }

    pub(crate) fn write_u16<W: Write>(self, writer: &mut W, value: u16) -> io::Result<()> {
        match self {
            Self::Little => writer.write_u16::<LittleEndian>(value),
            Self::Big => writer.write_u16::<BigEndian>(value),
        }
    }

    pub(crate) fn write_u64<W: Write>(self, writer: &mut W, value: u64) -> io::Result<()> {
        match self {
            Self::Little => writer.write_u64::<LittleEndian>(value),
            Self::Big => writer.write_u64::<BigEndian>(value),
        }
    }

    pub(crate) fn write_i64<W: Write>(self, writer: &mut W, value: i64) -> io::Result<()> {
        match self {
            Self::Little => writer.write_i64::<LittleEndian>(value),
            Self::Big => writer.write_i64::<BigEndian>(value),
        }
    }
}

/// Round `len` up to the next multiple of [`ALIGNMENT`]
#[must_use]
pub const fn align_up(len: u64) -> u64 {
    (len + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Number of padding bytes needed after `len` bytes
#[must_use]
pub const fn padding_len(len: u64) -> u64 {
    align_up(len) - len
}

/// Write `count` padding bytes
pub fn write_padding<W: Write>(writer: &mut W, count: u64) -> io::Result<()> {
    io::copy(&mut io::repeat(PADDING_BYTE).take(count), writer)?;
    Ok(())
}

/// Write `bytes` followed by padding up to the next aligned boundary.
///
/// Returns the number of bytes written including padding.
pub fn write_padded<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<u64> {
    writer.write_all(bytes)?;
    let len = bytes.len() as u64;
    write_padding(writer, padding_len(len))?;
    Ok(align_up(len))
}
