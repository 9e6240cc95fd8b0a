//! Hexdump command implementation.
//!
//! Displays raw memory bytes in traditional hexdump format, useful for
//! checking what a cached offset points at before patching.
//!
//! # Output Format
//!
//! ```text
//! 0x000: 0E 00 00 4D 61 78 20 56  45 52 53 54 41 50 50 45  |...Max VERSTAPPE|
//! ```

use anyhow::{Context, Result, bail};
use foni_core::memory::layout::string;
use foni_core::offset::cache;
use foni_core::{FoniConfig, OffsetField, ProcessHandle, ReadMemory};

use super::hex_utils::{format_hex_address, format_hexdump};

/// What to dump
pub enum Target {
    Address(u64),
    /// A cached field of a roster driver
    Field(String, OffsetField),
}

/// Run the hexdump command
pub fn run(config: FoniConfig, target: Target, size: usize, ascii: bool) -> Result<()> {
    let process = ProcessHandle::find_and_open(&config.process_name)
        .with_context(|| format!("Could not attach to {}", config.process_name))?;

    let address = match target {
        Target::Address(address) => address,
        Target::Field(entity, field) => {
            let roster = config.roster()?;
            let Some(map) = cache::try_load(&config.cache_path, &process.identity(), &roster)
            else {
                bail!("No offset cache for the running process, run `foni scan` first");
            };
            let Some(record) = map.get(&entity) else {
                bail!("Unknown driver '{}'", entity);
            };
            let Some(address) = record.get(field) else {
                bail!("{} of {} is unresolved", field, entity);
            };
            // Start at the length header
            if field.embeds_length() {
                address.saturating_sub(string::PREFIX_LEN as u64)
            } else {
                address
            }
        }
    };

    let bytes = process.read_bytes(address, size)?;

    println!("Hexdump at {} ({} bytes):", format_hex_address(address), size);
    println!();
    for line in format_hexdump(&bytes, ascii) {
        println!("{}", line);
    }

    Ok(())
}
