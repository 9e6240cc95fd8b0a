//! Default scan regions in the target address space
//!
//! The target keeps its driver name strings in three data regions whose base
//! addresses have been stable across runs of the same build:
//!
//! ```text
//!  MAIN_REGION       combined A ─► first ─► last ─► combined B ─► initials
//!  FORMAT_REGION     formatted display string
//!  SECONDARY_REGION  first ─► last   (alert messages, no length header)
//! ```
//!
//! Each arrow is a dependent search that starts right after the previous
//! match, so one chain per region and driver.

/// Driver selection and race directory strings
pub const MAIN_REGION: u64 = 0x2E5600000;

/// Styled display strings
pub const FORMAT_REGION: u64 = 0x2E5800000;

/// Alert message strings (e.g. "__ is out of the session")
pub const SECONDARY_REGION: u64 = 0x30771C000;

/// Address space covered by one search (16 GiB)
pub const SEARCH_WINDOW: u64 = 0x400000000;
