//! Sparse in-memory address space for tests.
//!
//! Memory is mapped in whole pages like a real process: any byte of a mapped
//! page reads as zero until written, and any access touching an unmapped
//! page fails.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::layout::{scan::BLOCK_SIZE, string};
use super::reader::{ReadMemory, WriteMemory};
use crate::error::{Error, Result};

const PAGE: u64 = BLOCK_SIZE;

#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    pages: HashMap<u64, Vec<u8>>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the pages covering `[address, address + len)`.
    pub fn map(mut self, address: u64, len: u64) -> Self {
        map_pages(&mut self.pages, address, len);
        self
    }

    /// Map and fill `bytes` at `address`.
    pub fn bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        map_pages(&mut self.pages, address, bytes.len() as u64);
        store(&mut self.pages, address, bytes);
        self
    }

    /// Place a length-prefixed string whose first character is at `address`.
    pub fn prefixed_str(self, address: u64, value: &str) -> Self {
        let prefix = string::prefix(value.len()).expect("test string fits one-byte prefix");
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(string::TERMINATOR);
        self.bytes(address - string::PREFIX_LEN as u64, &bytes)
    }

    /// Place a bare zero-terminated string at `address`.
    pub fn plain_str(self, address: u64, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(string::TERMINATOR);
        self.bytes(address, &bytes)
    }

    pub fn build(self) -> MockMemory {
        MockMemory {
            pages: RefCell::new(self.pages),
            reads: Cell::new(0),
            writes: RefCell::new(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct MockMemory {
    pages: RefCell<HashMap<u64, Vec<u8>>>,
    reads: Cell<usize>,
    writes: RefCell<Vec<(u64, Vec<u8>)>>,
}

impl MockMemory {
    pub fn builder() -> MockMemoryBuilder {
        MockMemoryBuilder::new()
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    /// Number of read calls, successful or not.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Bytes currently stored at `[address, address + len)`, if mapped.
    pub fn snapshot(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        load(&self.pages.borrow(), address, len)
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        load(&self.pages.borrow(), address, size).ok_or_else(|| Error::MemoryReadFailed {
            address,
            message: "unmapped".to_string(),
        })
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut pages = self.pages.borrow_mut();
        if !is_mapped(&pages, address, bytes.len()) {
            return Err(Error::MemoryWriteFailed {
                address,
                message: "unmapped".to_string(),
            });
        }
        store(&mut pages, address, bytes);
        self.writes.borrow_mut().push((address, bytes.to_vec()));
        Ok(())
    }
}

fn map_pages(pages: &mut HashMap<u64, Vec<u8>>, address: u64, len: u64) {
    let first = address / PAGE;
    let last = (address + len.max(1) - 1) / PAGE;
    for page in first..=last {
        pages.entry(page).or_insert_with(|| vec![0; PAGE as usize]);
    }
}

fn is_mapped(pages: &HashMap<u64, Vec<u8>>, address: u64, len: usize) -> bool {
    let Some(end) = address.checked_add(len as u64) else {
        return false;
    };
    if len == 0 {
        return pages.contains_key(&(address / PAGE));
    }
    (address / PAGE..=(end - 1) / PAGE).all(|page| pages.contains_key(&page))
}

fn load(pages: &HashMap<u64, Vec<u8>>, address: u64, len: usize) -> Option<Vec<u8>> {
    if !is_mapped(pages, address, len) {
        return None;
    }
    let bytes = (0..len as u64)
        .map(|i| {
            let addr = address + i;
            pages[&(addr / PAGE)][(addr % PAGE) as usize]
        })
        .collect();
    Some(bytes)
}

fn store(pages: &mut HashMap<u64, Vec<u8>>, address: u64, bytes: &[u8]) {
    for (i, byte) in bytes.iter().enumerate() {
        let addr = address + i as u64;
        if let Some(page) = pages.get_mut(&(addr / PAGE)) {
            page[(addr % PAGE) as usize] = *byte;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_page_reads_zero() {
        let mem = MockMemory::builder().map(0x10_0000, 1).build();
        assert_eq!(mem.read_bytes(0x10_0FF0, 16).unwrap(), vec![0; 16]);
    }

    #[test]
    fn test_read_across_unmapped_page_fails() {
        let mem = MockMemory::builder().map(0x10_0000, 1).build();
        assert!(mem.read_bytes(0x10_0FF8, 16).is_err());
        assert_eq!(mem.read_count(), 1);
    }

    #[test]
    fn test_prefixed_str_layout() {
        let mem = MockMemory::builder().prefixed_str(0x2000_0001, "Max").build();
        assert_eq!(
            mem.snapshot(0x2000_0001 - 3, 7).unwrap(),
            vec![3, 0, 0, b'M', b'a', b'x', 0]
        );
    }

    #[test]
    fn test_write_records_and_stores() {
        let mem = MockMemory::builder().map(0x3000, 0x10).build();
        mem.write_bytes(0x3004, b"abc").unwrap();
        assert_eq!(mem.snapshot(0x3004, 3).unwrap(), b"abc".to_vec());
        assert_eq!(mem.writes(), vec![(0x3004, b"abc".to_vec())]);
    }

    #[test]
    fn test_write_to_unmapped_fails() {
        let mem = MockMemory::builder().build();
        assert!(mem.write_bytes(0x3000, b"abc").is_err());
        assert!(mem.writes().is_empty());
    }
}
