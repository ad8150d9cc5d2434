//! File-backed main RAM
//!
//! Memory backend over a raw main-RAM file (an emulator's RAM export or a
//! dump), where file offset == main RAM address. Every request goes to the
//! file so changes made by the emulator between polls are seen.

use anyhow::{Context, Result};
use dqix::memory::{MemoryAccess, MemoryError, MemoryResult};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct FileRam {
    file: File,
    /// Path to the RAM file
    pub path: PathBuf,
}

impl FileRam {
    /// Open a RAM file for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, true)
    }

    /// Open a RAM file for inspection only; writes will fail
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, false)
    }

    fn open_with<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&path)
            .with_context(|| format!("Failed to open RAM file: {}", path.display()))?;

        Ok(FileRam { file, path })
    }

    fn check_bounds(&self, address: u32, len: u32) -> MemoryResult<()> {
        let size = self.file.metadata()?.len();
        if u64::from(address) + u64::from(len) > size {
            return Err(MemoryError::OutOfBounds { address, len });
        }
        Ok(())
    }
}

impl MemoryAccess for FileRam {
    async fn read(&self, address: u32, len: u32) -> MemoryResult<Vec<u8>> {
        self.check_bounds(address, len)?;

        let mut file = &self.file;
        let mut buffer = vec![0u8; len as usize];
        file.seek(SeekFrom::Start(u64::from(address)))?;
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    async fn write(&mut self, address: u32, data: &[u8]) -> MemoryResult<()> {
        self.check_bounds(address, data.len() as u32)?;

        self.file.seek(SeekFrom::Start(u64::from(address)))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ram_file(dir: &TempDir, data: &[u8]) -> PathBuf {
        let path = dir.path().join("main_ram.bin");
        fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_read_at_offset() {
        let dir = TempDir::new().unwrap();
        let path = ram_file(&dir, &[0, 1, 2, 0xCD, 0x32, 5]);
        let ram = FileRam::open_read_only(&path).unwrap();

        assert_eq!(ram.read(1, 2).await.unwrap(), vec![1, 2]);
        assert_eq!(ram.read_uint(3, 2).await.unwrap(), 13005);
    }

    #[tokio::test]
    async fn test_write_reaches_file() {
        let dir = TempDir::new().unwrap();
        let path = ram_file(&dir, &[0; 8]);
        let mut ram = FileRam::open(&path).unwrap();

        ram.write_uint(2, 4, 999_999_999).await.unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[2..6], &999_999_999u32.to_le_bytes());
        assert_eq!(bytes.len(), 8);
    }

    #[tokio::test]
    async fn test_out_of_bounds() {
        let dir = TempDir::new().unwrap();
        let path = ram_file(&dir, &[0; 8]);
        let mut ram = FileRam::open(&path).unwrap();

        assert!(matches!(
            ram.read(6, 4).await,
            Err(MemoryError::OutOfBounds { address: 6, len: 4 })
        ));
        // Writing past the end must not grow the file
        assert!(ram.write(8, &[1]).await.is_err());
        assert_eq!(fs::read(&path).unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = ram_file(&dir, &[0; 8]);
        let mut ram = FileRam::open_read_only(&path).unwrap();

        assert!(ram.write(0, &[1]).await.is_err());
        assert_eq!(fs::read(&path).unwrap()[0], 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(FileRam::open(dir.path().join("nope.bin")).is_err());
    }
}
