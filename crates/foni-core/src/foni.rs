//! Main application logic.
//!
//! [`Foni`] owns the attached process, the active roster and the offset map.
//! A run either loads the offset map from the cache or rebuilds it with a
//! full scan, then applies a rename file or restores the default names.
//!
//! ## Example
//!
//! ```ignore
//! use foni_core::{Foni, FoniConfig};
//!
//! let config = FoniConfig::builder().roster(RosterKind::Full).build()?;
//! let mut foni = Foni::attach(config)?;
//! foni.run(Some(Path::new("names.txt")), false)?;
//! ```

use std::path::Path;

use tracing::{info, warn};

use crate::config::FoniConfig;
use crate::error::Result;
use crate::memory::{ProcessHandle, ProcessIdentity, ReadMemory, WriteMemory};
use crate::offset::{EntityOffsetMap, OffsetResolver, cache};
use crate::patch::{PatchEngine, PatchReport, parse_rename_file};
use crate::roster::Roster;

/// Where the current offset map came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSource {
    Cache,
    Scan,
}

pub struct Foni<P> {
    process: P,
    identity: ProcessIdentity,
    config: FoniConfig,
    roster: Roster,
    offsets: EntityOffsetMap,
}

impl Foni<ProcessHandle> {
    /// Find the configured process and attach to it.
    pub fn attach(config: FoniConfig) -> Result<Self> {
        let process = ProcessHandle::find_and_open(&config.process_name)?;
        let identity = process.identity();
        info!("Attached to {} ({})", config.process_name, identity);
        Self::new(process, identity, config)
    }
}

impl<P: ReadMemory + WriteMemory> Foni<P> {
    pub fn new(process: P, identity: ProcessIdentity, config: FoniConfig) -> Result<Self> {
        let roster = config.roster()?;
        Ok(Self {
            process,
            identity,
            config,
            roster,
            offsets: EntityOffsetMap::new(),
        })
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn identity(&self) -> ProcessIdentity {
        self.identity
    }

    pub fn config(&self) -> &FoniConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn offsets(&self) -> &EntityOffsetMap {
        &self.offsets
    }

    /// Use the cached offsets if they belong to this process run, otherwise
    /// scan. `rescan` skips the cache.
    pub fn load_or_scan(&mut self, rescan: bool) -> Result<OffsetSource> {
        if !rescan {
            if let Some(offsets) =
                cache::try_load(&self.config.cache_path, &self.identity, &self.roster)
            {
                self.offsets = offsets;
                return Ok(OffsetSource::Cache);
            }
        }

        self.scan()?;
        Ok(OffsetSource::Scan)
    }

    /// Rebuild the offset map from memory and save it to the cache file.
    pub fn scan(&mut self) -> Result<&EntityOffsetMap> {
        info!("Building offsets for {} drivers", self.roster.len());
        let resolver = OffsetResolver::new(
            &self.process,
            self.config.scan.regions(),
            self.config.scan.search_window,
        );
        self.offsets = resolver.resolve_all(&self.roster);

        let resolved: usize = self.offsets.iter().map(|(_, r)| r.resolved_count()).sum();
        info!("Resolved {} fields", resolved);

        if let Err(e) = cache::save(&self.config.cache_path, &self.identity, &self.offsets) {
            warn!("Failed to save offset cache: {}", e);
        }
        Ok(&self.offsets)
    }

    /// Apply the instructions in `path` to the current offsets.
    pub fn apply_file(&self, path: &Path) -> Result<PatchReport> {
        info!("Applying names file: {}", path.display());
        let targets = parse_rename_file(path)?;
        Ok(PatchEngine::new(&self.process).apply_renames(&self.offsets, &self.roster, &targets))
    }

    pub fn restore_defaults(&self) -> PatchReport {
        info!("Restoring default names");
        PatchEngine::new(&self.process).restore_defaults(&self.offsets, &self.roster)
    }

    /// Load or build the offsets, then apply `names_file` or restore the
    /// default names when there is none.
    pub fn run(&mut self, names_file: Option<&Path>, rescan: bool) -> Result<PatchReport> {
        self.load_or_scan(rescan)?;
        match names_file {
            Some(path) => self.apply_file(path),
            None => Ok(self.restore_defaults()),
        }
    }
}
