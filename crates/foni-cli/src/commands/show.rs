//! Show command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use foni_core::{FoniConfig, OffsetCache, OffsetDump, ProcessHandle, ReadMemory};
use tracing::debug;

use super::print_offsets;

/// Print the cached offsets. When the cache belongs to the running process,
/// the strings currently stored at each address are shown too.
pub fn run(config: FoniConfig, dump: Option<&Path>) -> Result<()> {
    let Some(cache) = OffsetCache::load_from_path(&config.cache_path) else {
        bail!("No usable offset cache at {}", config.cache_path.display());
    };
    let roster = config.roster()?;

    println!("Cache: {}", config.cache_path.display());
    println!("Process: {}", cache.process);

    let process = match ProcessHandle::find_and_open(&config.process_name) {
        Ok(process) => Some(process),
        Err(e) => {
            debug!("No live process: {}", e);
            None
        }
    };
    let live = process
        .as_ref()
        .filter(|p| cache.is_valid_for(&p.identity(), &roster));

    match (&process, live) {
        (_, Some(p)) => println!("Status: valid for running process ({})", p.identity()),
        (Some(p), None) => println!("Status: stale, running process is {}", p.identity()),
        (None, None) => println!("Status: {} is not running", config.process_name),
    }
    println!();

    let reader = live.map(|p| p as &dyn ReadMemory);
    print_offsets(&cache.drivers, reader);

    if let Some(path) = dump {
        let Some(reader) = reader else {
            bail!("Dump needs the process the cache was built for");
        };
        OffsetDump::from_offsets(&cache.drivers, reader).save(path)?;
        println!();
        println!("Dump saved to: {}", path.display());
    }

    Ok(())
}
