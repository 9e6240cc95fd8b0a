//! Offset cache for faster startup
//!
//! Saves discovered offsets to a JSON file and reuses them while the same
//! process run is alive, skipping the full memory scan.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::memory::ProcessIdentity;
use crate::roster::Roster;

use super::EntityOffsetMap;

/// Cached offset data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetCache {
    /// Process run the offsets were discovered in
    pub process: ProcessIdentity,
    /// Offsets per driver, in roster order
    pub drivers: EntityOffsetMap,
}

impl OffsetCache {
    pub fn new(process: ProcessIdentity, drivers: EntityOffsetMap) -> Self {
        Self { process, drivers }
    }

    /// Load cache from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!("Cache file not found or unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<OffsetCache>(&content) {
            Ok(cache) => {
                debug!(
                    "Loaded cache: {}, {} drivers",
                    cache.process,
                    cache.drivers.len()
                );
                Some(cache)
            }
            Err(e) => {
                warn!("Failed to parse cache file: {}", e);
                None
            }
        }
    }

    /// Save cache to a specific path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved offset cache to {}", path.as_ref().display());
        Ok(())
    }

    /// Check if the cache belongs to `identity` and covers exactly `roster`
    pub fn is_valid_for(&self, identity: &ProcessIdentity, roster: &Roster) -> bool {
        if self.process != *identity {
            debug!(
                "Cache process mismatch: cached={}, current={}",
                self.process, identity
            );
            return false;
        }

        if !roster.matches(&self.drivers) {
            debug!("Cached drivers differ from the configured roster");
            return false;
        }

        true
    }
}

/// Cached offsets for the live process, if the cache file is valid for it
pub fn try_load<P: AsRef<Path>>(
    path: P,
    identity: &ProcessIdentity,
    roster: &Roster,
) -> Option<EntityOffsetMap> {
    let cache = OffsetCache::load_from_path(path)?;

    if cache.is_valid_for(identity, roster) {
        info!("Using cached offsets ({})", cache.process);
        Some(cache.drivers)
    } else {
        None
    }
}

/// Write `map` as the cache for `identity`
pub fn save<P: AsRef<Path>>(path: P, identity: &ProcessIdentity, map: &EntityOffsetMap) -> Result<()> {
    OffsetCache::new(*identity, map.clone()).save_to_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::OffsetRecord;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn roster() -> Roster {
        Roster::build(&["Max Verstappen", "Player One"], "Player One", &BTreeMap::new()).unwrap()
    }

    fn map() -> EntityOffsetMap {
        let mut map = EntityOffsetMap::new();
        map.insert(
            "Max Verstappen",
            OffsetRecord {
                combined_a: Some(0x2E5600041),
                first: Some(0x2E5600081),
                ..Default::default()
            },
        );
        map.insert("Player One", OffsetRecord::default());
        map
    }

    #[test]
    fn test_cache_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let identity = ProcessIdentity::new(4242, 133_000_000_000_000_000);

        save(temp_file.path(), &identity, &map()).unwrap();

        let loaded = OffsetCache::load_from_path(temp_file.path()).unwrap();
        assert_eq!(loaded.process, identity);
        assert_eq!(loaded.drivers, map());

        let content = fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"timeofstart\": 133000000000000000"));
        assert!(content.contains("\"secondary_last\": null"));
    }

    #[test]
    fn test_try_load_requires_same_process() {
        let temp_file = NamedTempFile::new().unwrap();
        let identity = ProcessIdentity::new(4242, 1000);
        save(temp_file.path(), &identity, &map()).unwrap();

        assert_eq!(try_load(temp_file.path(), &identity, &roster()), Some(map()));

        let restarted = ProcessIdentity::new(4242, 2000);
        assert_eq!(try_load(temp_file.path(), &restarted, &roster()), None);

        let other_pid = ProcessIdentity::new(4243, 1000);
        assert_eq!(try_load(temp_file.path(), &other_pid, &roster()), None);
    }

    #[test]
    fn test_try_load_rejects_other_roster() {
        let temp_file = NamedTempFile::new().unwrap();
        let identity = ProcessIdentity::new(7, 1000);
        save(temp_file.path(), &identity, &map()).unwrap();

        let bigger = Roster::build(
            &["Max Verstappen", "Lando Norris", "Player One"],
            "Player One",
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(try_load(temp_file.path(), &identity, &bigger), None);
    }

    #[test]
    fn test_missing_or_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let identity = ProcessIdentity::new(7, 1000);
        assert_eq!(try_load(dir.path().join("offsets.json"), &identity, &roster()), None);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{\"process\": ").unwrap();
        assert_eq!(try_load(&corrupt, &identity, &roster()), None);
    }
}
