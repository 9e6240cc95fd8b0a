//! # foni-core
//!
//! Core library for renaming drivers in a running F1 2021 process.
//!
//! This crate provides:
//! - Windows process memory access
//! - Offset discovery for each driver's name strings by pattern scanning
//! - An offset cache keyed by process run
//! - In-place patching from rename instruction files

pub mod config;
pub mod entity;
pub mod error;
pub mod foni;
pub mod memory;
pub mod offset;
pub mod patch;
pub mod roster;

pub use config::{FoniConfig, FoniConfigBuilder, ScanConfig};
pub use entity::{Entity, EntityName};
pub use error::{Error, Result};
pub use foni::{Foni, OffsetSource};
pub use memory::{ProcessHandle, ProcessIdentity, ReadMemory, WriteMemory};
pub use offset::{
    BytePattern, EntityOffsetMap, OffsetCache, OffsetDump, OffsetField, OffsetRecord,
    OffsetResolver, PatternScanner, ScanRegions,
};
pub use patch::{PatchEngine, PatchReport, RenameTarget, parse_rename_file};
pub use roster::{Roster, RosterKind};
