use std::collections::BTreeMap;

const PAGE_SIZE: u64 = 4096;

/// Receives staged bytes, one addressable byte at a time.
pub trait MemorySink {
    fn write_byte(&mut self, address: u64, value: u8);
}

impl<M: MemorySink + ?Sized> MemorySink for &mut M {
    fn write_byte(&mut self, address: u64, value: u8) {
        (**self).write_byte(address, value);
    }
}

/// A sparse byte-addressed memory backed by 4 KiB pages allocated on first write.
#[derive(Debug, Default, Clone)]
pub struct SparseMemory {
    pages: BTreeMap<u64, Box<[u8; PAGE_SIZE as usize]>>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a byte; untouched pages read as `None`.
    pub fn read_byte(&self, address: u64) -> Option<u8> {
        self.pages
            .get(&(address / PAGE_SIZE))
            .map(|page| page[(address % PAGE_SIZE) as usize])
    }

    /// Reads `len` bytes starting at `address`, untouched memory reading as zero.
    pub fn read(&self, address: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|i| self.read_byte(address.wrapping_add(i)).unwrap_or(0))
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl MemorySink for SparseMemory {
    fn write_byte(&mut self, address: u64, value: u8) {
        let page = self
            .pages
            .entry(address / PAGE_SIZE)
            .or_insert_with(|| Box::new([0; PAGE_SIZE as usize]));
        page[(address % PAGE_SIZE) as usize] = value;
    }
}
