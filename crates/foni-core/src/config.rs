//! Runtime configuration.
//!
//! Loaded from a TOML file where every key is optional:
//!
//! ```toml
//! process_name = "F1_2021_dx12"
//! cache_path = "offsets.json"
//! roster = "reduced"
//! placeholder = "Player One"
//!
//! [scan]
//! main_region = 0x2E5600000
//! search_window = 0x400000000
//!
//! [initials]
//! "Kimi Räikkönen" = "RAI"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::offset::{ScanRegions, constants};
use crate::roster::{DEFAULT_PLACEHOLDER, Roster, RosterKind};

pub const DEFAULT_CONFIG_FILE: &str = "foni.toml";
pub const DEFAULT_CACHE_FILE: &str = "offsets.json";
pub const DEFAULT_PROCESS_NAME: &str = "F1_2021_dx12";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoniConfig {
    /// Executable name of the target, `.exe` optional
    pub process_name: String,
    pub cache_path: PathBuf,
    pub roster: RosterKind,
    /// Driver names for `roster = "custom"`
    pub drivers: Vec<String>,
    pub placeholder: String,
    pub scan: ScanConfig,
    /// Initials overrides by driver name
    pub initials: BTreeMap<String, String>,
}

impl Default for FoniConfig {
    fn default() -> Self {
        Self {
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            roster: RosterKind::default(),
            drivers: Vec::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            scan: ScanConfig::default(),
            initials: BTreeMap::from([("Kimi Räikkönen".to_string(), "RAI".to_string())]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub main_region: u64,
    pub format_region: u64,
    pub secondary_region: u64,
    pub search_window: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            main_region: constants::MAIN_REGION,
            format_region: constants::FORMAT_REGION,
            secondary_region: constants::SECONDARY_REGION,
            search_window: constants::SEARCH_WINDOW,
        }
    }
}

impl ScanConfig {
    pub fn regions(&self) -> ScanRegions {
        ScanRegions {
            main: self.main_region,
            format: self.format_region,
            secondary: self.secondary_region,
        }
    }
}

impl FoniConfig {
    pub fn builder() -> FoniConfigBuilder {
        FoniConfigBuilder::default()
    }

    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.search_window == 0 {
            return Err(Error::InvalidConfig(
                "scan.search_window must be non-zero".to_string(),
            ));
        }
        if self.process_name.trim().is_empty() {
            return Err(Error::InvalidConfig("process_name is empty".to_string()));
        }
        for (name, initials) in &self.initials {
            if initials.chars().count() != 3 {
                return Err(Error::InvalidConfig(format!(
                    "initials '{}' for '{}' must be 3 characters",
                    initials, name
                )));
            }
        }
        self.roster().map(|_| ())
    }

    /// The roster this config selects.
    pub fn roster(&self) -> Result<Roster> {
        match self.roster {
            RosterKind::Custom => {
                Roster::build(self.drivers.as_slice(), &self.placeholder, &self.initials)
            }
            kind => Roster::builtin(kind, &self.placeholder, &self.initials),
        }
    }
}

/// Builder for FoniConfig
///
/// Starts from a base config (defaults unless given) and overrides only the
/// fields that were set.
#[derive(Debug, Clone, Default)]
pub struct FoniConfigBuilder {
    base: Option<FoniConfig>,
    process_name: Option<String>,
    cache_path: Option<PathBuf>,
    roster: Option<RosterKind>,
    drivers: Option<Vec<String>>,
    search_window: Option<u64>,
}

impl FoniConfigBuilder {
    pub fn base(mut self, config: FoniConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn process_name<S: Into<String>>(mut self, name: S) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn roster(mut self, kind: RosterKind) -> Self {
        self.roster = Some(kind);
        self
    }

    pub fn drivers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drivers = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn search_window(mut self, bytes: u64) -> Self {
        self.search_window = Some(bytes);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<FoniConfig> {
        let mut config = self.base.unwrap_or_default();
        if let Some(name) = self.process_name {
            config.process_name = name;
        }
        if let Some(path) = self.cache_path {
            config.cache_path = path;
        }
        if let Some(kind) = self.roster {
            config.roster = kind;
        }
        if let Some(drivers) = self.drivers {
            config.drivers = drivers;
        }
        if let Some(window) = self.search_window {
            config.scan.search_window = window;
        }
        config.validate()?;
        Ok(config)
    }
}
