//! Compression utilities
//!
//! Payloads are whole-buffer zlib streams. Building follows a
//! shrink-or-store-raw policy; reading is lenient and hands back the stored
//! bytes when a payload does not inflate to its recorded size.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{Error, Result};
use crate::pak::format::align_up;

/// Highest zlib effort level
pub const BEST_LEVEL: u32 = 9;

/// Compress data using zlib at the given level (0-9)
///
/// # Errors
/// Returns an error if compression fails.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| Error::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::CompressionFailed(e.to_string()))
}

/// Decompress zlib data, requiring exactly `expected_size` bytes of output
///
/// # Errors
/// Returns [`Error::ZlibDecompressionFailed`] if the stream is corrupt and
/// [`Error::DecompressedSizeMismatch`] if it inflates to a different length.
pub fn decompress(data: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    let capacity = usize::try_from(expected_size).unwrap_or(0);
    let mut decompressed = Vec::with_capacity(capacity);

    // Read one byte past the expected size so oversized streams are detected
    // without inflating them completely.
    ZlibDecoder::new(data)
        .take(expected_size.saturating_add(1))
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::ZlibDecompressionFailed {
            message: e.to_string(),
        })?;

    if decompressed.len() as u64 != expected_size {
        return Err(Error::DecompressedSizeMismatch {
            expected: expected_size,
            actual: decompressed.len() as u64,
        });
    }
    Ok(decompressed)
}

/// Inflate a stored payload, falling back to the stored bytes on failure.
///
/// Returns the data and whether it was actually inflated.
pub fn inflate_or_raw(stored: Vec<u8>, expected_size: u64) -> (Vec<u8>, bool) {
    match decompress(&stored, expected_size) {
        Ok(data) => (data, true),
        Err(e) => {
            tracing::warn!("Returning stored bytes of corrupt payload: {e}");
            (stored, false)
        }
    }
}

/// A file payload ready to be appended to the data blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPayload {
    /// Original bytes
    Raw(Vec<u8>),
    /// Zlib stream that is strictly smaller than the original
    Compressed {
        data: Vec<u8>,
        uncompressed_size: u64,
    },
}

impl StoredPayload {
    /// Apply the shrink-or-store-raw policy.
    ///
    /// With `level` set, the payload is compressed and the result kept only
    /// if strictly smaller than the original. `None` stores the bytes as-is.
    pub fn encode(raw: Vec<u8>, level: Option<u32>) -> Result<Self> {
        let Some(level) = level else {
            return Ok(Self::Raw(raw));
        };

        let compressed = compress(&raw, level)?;
        if compressed.len() < raw.len() {
            Ok(Self::Compressed {
                data: compressed,
                uncompressed_size: raw.len() as u64,
            })
        } else {
            Ok(Self::Raw(raw))
        }
    }

    /// Bytes written to the data blob, before padding
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Raw(data) | Self::Compressed { data, .. } => data,
        }
    }

    /// Logical stored length recorded in the entry
    #[must_use]
    pub fn stored_len(&self) -> u64 {
        self.bytes().len() as u64
    }

    /// Space the payload occupies in the data blob
    #[must_use]
    pub fn padded_len(&self) -> u64 {
        align_up(self.stored_len())
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed { .. })
    }

    #[must_use]
    pub fn uncompressed_size(&self) -> Option<u64> {
        match self {
            Self::Raw(_) => None,
            Self::Compressed {
                uncompressed_size, ..
            } => Some(*uncompressed_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift noise; zlib cannot shrink it
    fn noise(len: usize) -> Vec<u8> {
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_compress_decompress() {
        let data = b"hello hello hello hello hello hello".repeat(20);
        let compressed = compress(&data, BEST_LEVEL).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(decompress(&compressed, data.len() as u64).unwrap(), data);
    }

    #[test]
    fn test_decompress_size_mismatch() {
        let data = vec![b'a'; 1000];
        let compressed = compress(&data, BEST_LEVEL).unwrap();
        assert!(matches!(
            decompress(&compressed, 999),
            Err(Error::DecompressedSizeMismatch { expected: 999, actual: 1000 })
        ));
        assert!(matches!(
            decompress(&compressed, 1001),
            Err(Error::DecompressedSizeMismatch { expected: 1001, actual: 1000 })
        ));
    }

    #[test]
    fn test_inflate_or_raw_falls_back() {
        let garbage = vec![1, 2, 3, 4, 5];
        let (data, inflated) = inflate_or_raw(garbage.clone(), 64);
        assert!(!inflated);
        assert_eq!(data, garbage);
    }

    #[test]
    fn test_policy_keeps_compressed_when_smaller() {
        let data = vec![0u8; 4096];
        let payload = StoredPayload::encode(data, Some(BEST_LEVEL)).unwrap();
        assert!(payload.is_compressed());
        assert_eq!(payload.uncompressed_size(), Some(4096));
        assert!(payload.stored_len() < 4096);
        assert_eq!(payload.padded_len() % 32, 0);
    }

    #[test]
    fn test_policy_stores_incompressible_raw() {
        let data = noise(1000);
        let payload = StoredPayload::encode(data.clone(), Some(BEST_LEVEL)).unwrap();
        assert!(!payload.is_compressed());
        assert_eq!(payload.bytes(), data.as_slice());
        assert_eq!(payload.stored_len(), 1000);
        assert_eq!(payload.padded_len(), 1024);
    }

    #[test]
    fn test_policy_disabled() {
        let payload = StoredPayload::encode(vec![0u8; 4096], None).unwrap();
        assert!(!payload.is_compressed());
        assert_eq!(payload.uncompressed_size(), None);
    }

    #[test]
    fn test_empty_payload_stays_raw() {
        let payload = StoredPayload::encode(Vec::new(), Some(BEST_LEVEL)).unwrap();
        assert!(!payload.is_compressed());
        assert_eq!(payload.padded_len(), 0);
    }
}
