//! Forward pattern scan over a bounded address window.
//!
//! Candidates sit every 8 bytes. Memory is fetched one page at a time; a page
//! that cannot be read contributes no matches and the scan moves on.

use crate::memory::ReadMemory;
use crate::memory::layout::{scan, string};

use super::BytePattern;

pub struct PatternScanner<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    search_window: u64,
}

impl<'a, R: ReadMemory + ?Sized> PatternScanner<'a, R> {
    pub fn new(reader: &'a R, search_window: u64) -> Self {
        Self {
            reader,
            search_window,
        }
    }

    pub fn search_window(&self) -> u64 {
        self.search_window
    }

    /// First candidate address for a scan from `start`.
    ///
    /// `start` is moved to the next 8-byte boundary strictly above it, then
    /// `align_offset` is added.
    pub fn effective_start(start: u64, align_offset: u64) -> Option<u64> {
        (start / scan::STRIDE)
            .checked_add(1)?
            .checked_mul(scan::STRIDE)?
            .checked_add(align_offset)
    }

    /// Find the first address at or after the effective start of `start`
    /// holding `pattern`, or `None` when the window is exhausted.
    pub fn find(&self, start: u64, pattern: &BytePattern) -> Option<u64> {
        if pattern.is_empty() {
            return None;
        }
        let prefix = match pattern.required_prefix() {
            Some(None) => return None,
            Some(Some(prefix)) => Some(prefix),
            None => None,
        };

        let first = Self::effective_start(start, pattern.align_offset())?;
        let end = first.saturating_add(self.search_window);

        let mut block_start = first - first % scan::BLOCK_SIZE;
        while block_start < end {
            let block_end = block_start.saturating_add(scan::BLOCK_SIZE);

            if let Ok(block) = self.reader.read_bytes(block_start, scan::BLOCK_SIZE as usize) {
                let mut addr = if block_start < first {
                    first
                } else {
                    block_start + pattern.align_offset()
                };
                while addr < block_end && addr < end {
                    if self.matches_at(addr, &block, block_start, pattern, prefix.as_ref()) {
                        return Some(addr);
                    }
                    match addr.checked_add(scan::STRIDE) {
                        Some(next) => addr = next,
                        None => break,
                    }
                }
            }

            if block_end == u64::MAX {
                break;
            }
            block_start = block_end;
        }

        None
    }

    fn matches_at(
        &self,
        addr: u64,
        block: &[u8],
        block_start: u64,
        pattern: &BytePattern,
        prefix: Option<&[u8; string::PREFIX_LEN]>,
    ) -> bool {
        let offset = (addr - block_start) as usize;
        let bytes = pattern.bytes();

        // First two characters decide most candidates
        if block.get(offset) != Some(&bytes[0]) {
            return false;
        }
        if let (Some(actual), Some(expected)) = (block.get(offset + 1), bytes.get(1)) {
            if actual != expected {
                return false;
            }
        }

        let body_matches = match block.get(offset..offset + bytes.len()) {
            Some(window) => window == bytes,
            None => self.read_equals(addr, bytes),
        };
        if !body_matches {
            return false;
        }

        let Some(prefix) = prefix else {
            return true;
        };
        if offset >= string::PREFIX_LEN {
            &block[offset - string::PREFIX_LEN..offset] == prefix
        } else {
            addr.checked_sub(string::PREFIX_LEN as u64)
                .is_some_and(|prefix_addr| self.read_equals(prefix_addr, prefix))
        }
    }

    fn read_equals(&self, address: u64, expected: &[u8]) -> bool {
        self.reader
            .read_bytes(address, expected.len())
            .is_ok_and(|actual| actual == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;

    const WINDOW: u64 = 0x10_0000;

    #[test]
    fn test_effective_start() {
        assert_eq!(PatternScanner::<MockMemory>::effective_start(0x1003, 1), Some(0x1009));
        // Already aligned starts still advance a full stride
        assert_eq!(PatternScanner::<MockMemory>::effective_start(0x1000, 1), Some(0x1009));
        assert_eq!(PatternScanner::<MockMemory>::effective_start(0x1007, 0), Some(0x1008));
        assert_eq!(PatternScanner::<MockMemory>::effective_start(u64::MAX, 0), None);
    }

    #[test]
    fn test_finds_prefixed_string() {
        let mem = MockMemory::builder().prefixed_str(0x2E56_0041, "Max VERSTAPPEN").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        let found = scanner.find(0x2E56_0000, &BytePattern::prefixed("Max VERSTAPPEN"));
        assert_eq!(found, Some(0x2E56_0041));
    }

    #[test]
    fn test_absent_pattern_is_unresolved() {
        let mem = MockMemory::builder().prefixed_str(0x2E56_0041, "Max VERSTAPPEN").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x2E56_0000, &BytePattern::prefixed("Lando NORRIS")), None);
    }

    #[test]
    fn test_misaligned_string_is_ignored() {
        let mem = MockMemory::builder().prefixed_str(0x4002, "Max").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x4000 - 8, &BytePattern::prefixed("Max")), None);
    }

    #[test]
    fn test_missing_length_prefix_is_rejected() {
        let mem = MockMemory::builder()
            .plain_str(0x4001, "Max")
            .prefixed_str(0x4041, "Max")
            .build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x3FF8, &BytePattern::prefixed("Max")), Some(0x4041));
    }

    #[test]
    fn test_wrong_length_prefix_is_rejected() {
        // "Maxwell" header in front of a "Max" probe
        let mem = MockMemory::builder().prefixed_str(0x4001, "Maxwell").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x3FF8, &BytePattern::prefixed("Max")), None);
    }

    #[test]
    fn test_plain_pattern_on_boundary() {
        let mem = MockMemory::builder().plain_str(0x3_0772_0010, "VERSTAPPEN").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        let found = scanner.find(0x3_0771_C000, &BytePattern::plain("VERSTAPPEN"));
        assert_eq!(found, Some(0x3_0772_0010));
    }

    #[test]
    fn test_start_at_match_skips_it() {
        let mem = MockMemory::builder().prefixed_str(0x5001, "Max").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x5000, &BytePattern::prefixed("Max")), None);
        assert_eq!(scanner.find(0x4FFF, &BytePattern::prefixed("Max")), Some(0x5001));
    }

    #[test]
    fn test_first_match_wins() {
        let mem = MockMemory::builder()
            .prefixed_str(0x6101, "Max")
            .prefixed_str(0x6011, "Max")
            .build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x6000, &BytePattern::prefixed("Max")), Some(0x6011));
    }

    #[test]
    fn test_unreadable_pages_are_skipped() {
        let mem = MockMemory::builder().prefixed_str(0x9_0009, "Max").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x1_0000, &BytePattern::prefixed("Max")), Some(0x9_0009));
    }

    #[test]
    fn test_string_crossing_page_edge() {
        // Body spans two pages
        let mem = MockMemory::builder().prefixed_str(0x7FF9, "Sebastian VETTEL").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(
            scanner.find(0x7000, &BytePattern::prefixed("Sebastian VETTEL")),
            Some(0x7FF9)
        );
    }

    #[test]
    fn test_prefix_crossing_page_edge() {
        // Header sits at the end of the previous page
        let mem = MockMemory::builder().prefixed_str(0x8001, "Max").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0x7000, &BytePattern::prefixed("Max")), Some(0x8001));
    }

    #[test]
    fn test_tail_in_unmapped_page_is_mismatch() {
        let mem = MockMemory::builder().bytes(0xAFF8, b"Sebast").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0xA000, &BytePattern::plain("Sebastian")), None);
    }

    /// Every address reads as zero.
    struct ZeroMemory;

    impl ReadMemory for ZeroMemory {
        fn read_bytes(&self, _address: u64, size: usize) -> crate::error::Result<Vec<u8>> {
            Ok(vec![0; size])
        }
    }

    #[test]
    fn test_scan_at_top_of_address_space() {
        let scanner = PatternScanner::new(&ZeroMemory, WINDOW);
        assert_eq!(scanner.find(u64::MAX - 0x100, &BytePattern::plain("Max")), None);
        assert_eq!(scanner.find(u64::MAX - 0x100, &BytePattern::prefixed("Max")), None);
    }

    #[test]
    fn test_match_beyond_window_is_not_found() {
        let mem = MockMemory::builder().prefixed_str(0x20_0001, "Max").build();
        let scanner = PatternScanner::new(&mem, 0x1000);
        assert_eq!(scanner.find(0x10_0000, &BytePattern::prefixed("Max")), None);
    }

    #[test]
    fn test_single_byte_pattern() {
        let mem = MockMemory::builder().plain_str(0xC010, "X").build();
        let scanner = PatternScanner::new(&mem, WINDOW);
        assert_eq!(scanner.find(0xC000, &BytePattern::plain("X")), Some(0xC010));
    }

    #[test]
    fn test_results_keep_alignment() {
        // "ab" behind a valid header at every residue mod 8
        let mut builder = MockMemory::builder();
        for residue in 0..8u64 {
            builder = builder.prefixed_str(0xE010 + residue * 0x100 + residue, "ab");
        }
        let mem = builder.build();
        let scanner = PatternScanner::new(&mem, WINDOW);

        let plain = scanner.find(0xE000, &BytePattern::plain("ab")).unwrap();
        assert_eq!(plain % 8, 0);
        assert_eq!(plain, 0xE010);

        let prefixed = scanner.find(0xE000, &BytePattern::prefixed("ab")).unwrap();
        assert_eq!(prefixed % 8, 1);
        assert_eq!(prefixed, 0xE111);
    }
}
