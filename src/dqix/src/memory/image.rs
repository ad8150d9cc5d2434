//! In-Memory RAM Image
//!
//! A memory backend holding a copy of main RAM, for tests and dry runs.

use super::{MemoryAccess, MemoryError, MemoryResult};

/// An in-memory copy of a RAM region starting at `base_address`
#[derive(Debug, Clone)]
pub struct RamImage {
    data: Vec<u8>,
    base_address: u32,
    offline: bool,
    /// Remaining writes before requests start failing (None = unlimited)
    write_budget: Option<usize>,
    writes: Vec<(u32, Vec<u8>)>,
}

impl RamImage {
    /// Create a new image with data at given base address
    pub fn new(data: Vec<u8>, base_address: u32) -> Self {
        Self {
            data,
            base_address,
            offline: false,
            write_budget: None,
            writes: Vec::new(),
        }
    }

    /// Create a zero-filled image of `size` bytes based at address 0
    pub fn zeroed(size: usize) -> Self {
        Self::new(vec![0; size], 0)
    }

    /// Raw image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Every write applied so far, in order
    pub fn writes(&self) -> &[(u32, Vec<u8>)] {
        &self.writes
    }

    /// Make every subsequent request fail as if the emulator had disconnected
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Allow `count` more writes, then fail every request
    pub fn fail_after_writes(&mut self, count: usize) {
        self.write_budget = Some(count);
    }

    /// Lift a limit set by `fail_after_writes`
    pub fn allow_writes(&mut self) {
        self.write_budget = None;
    }

    /// Fill `len` bytes at `address` with `value` directly, bypassing the journal
    pub fn fill(&mut self, address: u32, len: usize, value: u8) -> MemoryResult<()> {
        let range = self.range(address, len as u32)?;
        self.data[range].fill(value);
        Ok(())
    }

    /// Copy `bytes` to `address` directly, bypassing the journal
    pub fn poke(&mut self, address: u32, bytes: &[u8]) -> MemoryResult<()> {
        let range = self.range(address, bytes.len() as u32)?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes at `address` without going through the request interface
    pub fn peek(&self, address: u32, len: u32) -> MemoryResult<&[u8]> {
        let range = self.range(address, len)?;
        Ok(&self.data[range])
    }

    fn range(&self, address: u32, len: u32) -> MemoryResult<std::ops::Range<usize>> {
        let out_of_bounds = MemoryError::OutOfBounds { address, len };
        if address < self.base_address {
            return Err(out_of_bounds);
        }

        let start = (address - self.base_address) as usize;
        let end = start + len as usize;
        if end > self.data.len() {
            return Err(out_of_bounds);
        }
        Ok(start..end)
    }

    fn check_online(&self) -> MemoryResult<()> {
        if self.offline || self.write_budget == Some(0) {
            return Err(MemoryError::RequestFailed(
                "emulator connection unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl MemoryAccess for RamImage {
    async fn read(&self, address: u32, len: u32) -> MemoryResult<Vec<u8>> {
        self.check_online()?;
        let range = self.range(address, len)?;
        Ok(self.data[range].to_vec())
    }

    async fn write(&mut self, address: u32, data: &[u8]) -> MemoryResult<()> {
        self.check_online()?;
        let range = self.range(address, data.len() as u32)?;
        self.data[range].copy_from_slice(data);
        self.writes.push((address, data.to_vec()));
        if let Some(budget) = self.write_budget.as_mut() {
            *budget -= 1;
        }
        Ok(())
    }
}
