//! Memory layout constants for the target's string storage
//!
//! Short display strings live in the target's data regions as
//! length-prefixed, zero-terminated UTF-8:
//!
//! ```text
//!   addr-3  addr-2  addr-1  addr ...            addr+len
//! ┌───────┬───────┬───────┬──────────────────┬──────┐
//! │  len  │  0x00 │  0x00 │  UTF-8 bytes     │ 0x00 │
//! └───────┴───────┴───────┴──────────────────┴──────┘
//! ```
//!
//! String headers are packed on 8-byte boundaries, so the first character
//! sits at `8n + 1`. The recorded address of a string is always the address
//! of its first character.

/// Layout of a length-prefixed string
pub mod string {
    /// Bytes preceding the first character (`{len, 0, 0}`)
    pub const PREFIX_LEN: usize = 3;

    /// Longest value whose length fits the single significant prefix byte
    pub const MAX_LEN: usize = u8::MAX as usize;

    pub const TERMINATOR: u8 = 0;

    /// Build the 3-byte prefix for a string of `len` bytes.
    ///
    /// Returns `None` when `len` does not fit in one byte.
    pub fn prefix(len: usize) -> Option<[u8; PREFIX_LEN]> {
        u8::try_from(len).ok().map(|len| [len, 0, 0])
    }
}

/// Scan geometry
pub mod scan {
    /// Distance between candidate string starts
    pub const STRIDE: u64 = 8;

    /// Offset of the first character from an 8-byte boundary for
    /// length-prefixed strings
    pub const PREFIXED_ALIGN: u64 = 1;

    /// Unit of readability in the target address space (one page)
    pub const BLOCK_SIZE: u64 = 0x1000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_encodes_length_in_first_byte() {
        assert_eq!(string::prefix(3), Some([3, 0, 0]));
        assert_eq!(string::prefix(255), Some([255, 0, 0]));
        assert_eq!(string::prefix(256), None);
    }

    #[test]
    fn test_block_size_is_multiple_of_stride() {
        assert_eq!(scan::BLOCK_SIZE % scan::STRIDE, 0);
    }
}
