pub mod cache;
pub mod constants;
mod dump;
mod pattern;
mod record;
mod resolver;
mod scanner;

pub use cache::OffsetCache;
pub use dump::*;
pub use pattern::BytePattern;
pub use record::{EntityOffsetMap, OffsetField, OffsetRecord};
pub use resolver::{LookupStep, OffsetResolver, Region, ScanRegions, SearchStart, lookup_plan};
pub use scanner::PatternScanner;
