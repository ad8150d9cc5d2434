//! Memory Access Trait
//!
//! Core abstraction for reading and writing emulator memory.

use byteorder::{ByteOrder, LE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Memory request failed: {0}")]
    RequestFailed(String),

    #[error("Access of {len} bytes at {address:#x} is outside the memory image")]
    OutOfBounds { address: u32, len: u32 },

    #[error("Expected {expected} bytes from read, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Unsupported integer width: {0}")]
    InvalidWidth(u8),

    #[error("Value {value} does not fit in {width} bytes")]
    ValueTooWide { value: u32, width: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for memory requests
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Trait for reading and writing emulator memory (file-backed RAM, in-memory image, etc.)
///
/// Every request may fail while the emulator connection is unavailable. Writes take
/// `&mut self`: whoever owns the backend owns every read-modify-write span issued
/// through it.
#[allow(async_fn_in_trait)]
pub trait MemoryAccess {
    /// Read exactly `len` bytes starting at `address`
    async fn read(&self, address: u32, len: u32) -> MemoryResult<Vec<u8>>;

    /// Write `data` starting at `address`
    async fn write(&mut self, address: u32, data: &[u8]) -> MemoryResult<()>;

    /// Read a little-endian unsigned integer of `width` bytes (1-4)
    async fn read_uint(&self, address: u32, width: u8) -> MemoryResult<u32> {
        check_width(width)?;
        let bytes = self.read(address, u32::from(width)).await?;
        decode_uint(&bytes, width)
    }

    /// Write a little-endian unsigned integer of `width` bytes (1-4)
    async fn write_uint(&mut self, address: u32, width: u8, value: u32) -> MemoryResult<()> {
        let bytes = encode_uint(value, width)?;
        self.write(address, &bytes).await
    }

    /// Read `count` consecutive integers of `width` bytes in a single request
    async fn read_segments(&self, address: u32, count: u32, width: u8) -> MemoryResult<Vec<u32>> {
        check_width(width)?;
        let len = count
            .checked_mul(u32::from(width))
            .ok_or(MemoryError::OutOfBounds { address, len: u32::MAX })?;
        let bytes = self.read(address, len).await?;
        let expected = count as usize * usize::from(width);
        if bytes.len() != expected {
            return Err(MemoryError::ShortRead {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(bytes
            .chunks_exact(usize::from(width))
            .map(|chunk| LE::read_uint(chunk, usize::from(width)) as u32)
            .collect())
    }
}

fn check_width(width: u8) -> MemoryResult<()> {
    if (1..=4).contains(&width) {
        Ok(())
    } else {
        Err(MemoryError::InvalidWidth(width))
    }
}

/// Decode a little-endian unsigned integer occupying all of `bytes`
pub fn decode_uint(bytes: &[u8], width: u8) -> MemoryResult<u32> {
    check_width(width)?;
    if bytes.len() != usize::from(width) {
        return Err(MemoryError::ShortRead {
            expected: usize::from(width),
            actual: bytes.len(),
        });
    }
    Ok(LE::read_uint(bytes, usize::from(width)) as u32)
}

/// Encode `value` as `width` little-endian bytes, refusing values that would be truncated
pub fn encode_uint(value: u32, width: u8) -> MemoryResult<Vec<u8>> {
    check_width(width)?;
    if width < 4 && u64::from(value) >> (8 * u32::from(width)) != 0 {
        return Err(MemoryError::ValueTooWide { value, width });
    }

    let mut buf = vec![0u8; usize::from(width)];
    LE::write_uint(&mut buf, u64::from(value), usize::from(width));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_uint_little_endian() {
        assert_eq!(decode_uint(&[0x48], 1).unwrap(), 0x48);
        assert_eq!(decode_uint(&[0xD5, 0x32], 2).unwrap(), 13013);
        assert_eq!(decode_uint(&[0x01, 0x02, 0x03, 0x04], 4).unwrap(), 0x04030201);
    }

    #[test]
    fn test_decode_uint_length_mismatch() {
        assert!(matches!(
            decode_uint(&[0x01, 0x02], 4),
            Err(MemoryError::ShortRead {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_encode_uint() {
        assert_eq!(encode_uint(0xFFFF, 2).unwrap(), vec![0xFF, 0xFF]);
        assert_eq!(encode_uint(99, 1).unwrap(), vec![99]);
        assert_eq!(
            encode_uint(999_999_999, 4).unwrap(),
            999_999_999u32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_encode_uint_rejects_truncation() {
        assert!(matches!(
            encode_uint(256, 1),
            Err(MemoryError::ValueTooWide { value: 256, width: 1 })
        ));
        assert!(matches!(
            encode_uint(1, 3).map(|b| b.len()),
            Ok(3)
        ));
    }

    #[test]
    fn test_invalid_width() {
        assert!(matches!(encode_uint(1, 0), Err(MemoryError::InvalidWidth(0))));
        assert!(matches!(decode_uint(&[0; 8], 8), Err(MemoryError::InvalidWidth(8))));
    }
}
