//! Scan command implementation.

use anyhow::{Context, Result};
use foni_core::{Foni, FoniConfig, ReadMemory};

use super::print_offsets;

/// Run a full scan, save the cache and print the result
pub fn run(config: FoniConfig) -> Result<()> {
    let process_name = config.process_name.clone();
    let mut foni = Foni::attach(config)
        .with_context(|| format!("Could not attach to {}", process_name))?;

    println!("Found process ({})", foni.identity());
    foni.scan()?;

    println!();
    print_offsets(foni.offsets(), Some(foni.process() as &dyn ReadMemory));
    println!();
    println!("Offsets saved to: {}", foni.config().cache_path.display());
    Ok(())
}
