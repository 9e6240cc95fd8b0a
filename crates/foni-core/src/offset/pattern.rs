use std::fmt;

use crate::memory::layout::{scan, string};

/// Encoded text to look for, plus where it may sit in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<u8>,
    align_offset: u64,
    embed_length: bool,
}

impl BytePattern {
    /// Length-prefixed string starting one byte past an 8-byte boundary.
    pub fn prefixed(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            align_offset: scan::PREFIXED_ALIGN,
            embed_length: true,
        }
    }

    /// Bare string starting on an 8-byte boundary.
    pub fn plain(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            align_offset: 0,
            embed_length: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn align_offset(&self) -> u64 {
        self.align_offset
    }

    pub fn embed_length(&self) -> bool {
        self.embed_length
    }

    /// The `{len, 0, 0}` header that must precede a match, if any.
    ///
    /// `Some(None)` means a header is required but no header can describe
    /// this length, so the pattern never matches.
    pub(crate) fn required_prefix(&self) -> Option<Option<[u8; string::PREFIX_LEN]>> {
        self.embed_length.then(|| string::prefix(self.len()))
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.bytes))?;
        if self.embed_length {
            write!(f, " (prefixed)")?;
        }
        Ok(())
    }
}
