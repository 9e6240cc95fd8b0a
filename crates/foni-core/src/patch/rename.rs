//! Rename instruction files.
//!
//! One instruction per line:
//!
//! ```text
//! # driver : initials , first , last
//! Max Verstappen : VER , Max , Verstappen
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// New name for one roster driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTarget {
    /// Roster name of the driver to rename
    pub entity: String,
    /// `None` when the initials column is empty
    pub initials: Option<String>,
    pub first: String,
    pub last: String,
}

impl RenameTarget {
    /// First and last name joined by one space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last).trim().to_string()
    }

    /// Initials to write, if they are exactly three characters.
    pub fn valid_initials(&self) -> Option<&str> {
        self.initials
            .as_deref()
            .filter(|initials| initials.chars().count() == 3)
    }
}

/// Parse one line. Comments and lines without exactly one `:` and two `,`
/// yield `None`.
pub fn parse_line(line: &str) -> Option<RenameTarget> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    if line.matches(':').count() != 1 || line.matches(',').count() != 2 {
        return None;
    }

    let (entity, rest) = line.split_once(':')?;
    let mut parts = rest.split(',').map(str::trim);
    let initials = parts.next()?;
    let first = parts.next()?;
    let last = parts.next()?;

    Some(RenameTarget {
        entity: entity.trim().to_string(),
        initials: (!initials.is_empty()).then(|| initials.to_string()),
        first: first.to_string(),
        last: last.to_string(),
    })
}

pub fn parse_rename_file<P: AsRef<Path>>(path: P) -> Result<Vec<RenameTarget>> {
    let content = fs::read_to_string(path)?;
    let targets = content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let target = parse_line(line);
            if target.is_none() && !line.trim().is_empty() && !line.trim().starts_with('#') {
                debug!("Skipping malformed line {}: {}", i + 1, line.trim());
            }
            target
        })
        .collect();
    Ok(targets)
}
