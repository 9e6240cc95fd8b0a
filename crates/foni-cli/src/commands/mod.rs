//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod hex_utils;
pub mod hexdump;
pub mod rename;
pub mod scan;
pub mod show;

use foni_core::offset::read_string;
use foni_core::{EntityOffsetMap, OffsetField, ReadMemory};
use strum::IntoEnumIterator;

/// Print every driver's offsets, with the string currently stored there when
/// a reader is given.
pub fn print_offsets(map: &EntityOffsetMap, reader: Option<&dyn ReadMemory>) {
    for (name, record) in map.iter() {
        println!(
            "{} ({}/{} resolved)",
            name,
            record.resolved_count(),
            OffsetField::iter().count()
        );
        for field in OffsetField::iter() {
            let Some(address) = record.get(field) else {
                println!("  {}: (unresolved)", field);
                continue;
            };
            match reader.and_then(|r| read_string(r, address)) {
                Some(text) => println!("  {}: 0x{:X} {:?}", field, address, text),
                None => println!("  {}: 0x{:X}", field, address),
            }
        }
    }
}
