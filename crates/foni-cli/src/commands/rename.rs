//! Default command: apply a rename file or restore the default names.

use std::path::Path;

use anyhow::{Context, Result};
use foni_core::{Foni, FoniConfig};
use tracing::info;

pub fn run(config: FoniConfig, names_file: Option<&Path>, rescan: bool) -> Result<()> {
    let process_name = config.process_name.clone();
    let mut foni = Foni::attach(config)
        .with_context(|| format!("Could not attach to {}", process_name))?;

    let report = foni.run(names_file, rescan)?;
    info!("Done: {}", report);
    Ok(())
}
