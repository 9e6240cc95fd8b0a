//! In-place string patching.
//!
//! Strings are overwritten in their existing slots. Nothing checks that a new
//! value fits; a longer value spills into whatever follows the slot.

mod rename;

pub use rename::{RenameTarget, parse_line, parse_rename_file};

use std::fmt;

use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::memory::WriteMemory;
use crate::memory::layout::string;
use crate::offset::{EntityOffsetMap, OffsetField, OffsetRecord};
use crate::roster::Roster;

/// Encode `value` as stored in memory. The result starts at the header when
/// `embed_length` is set.
pub fn encode_string(value: &str, embed_length: bool) -> Result<Vec<u8>> {
    let len = value.len();
    let mut bytes = Vec::with_capacity(len + string::PREFIX_LEN + 1);
    if embed_length {
        let prefix = string::prefix(len).ok_or(Error::StringTooLong { len })?;
        bytes.extend_from_slice(&prefix);
    } else if len > string::MAX_LEN {
        return Err(Error::StringTooLong { len });
    }
    bytes.extend_from_slice(value.as_bytes());
    bytes.push(string::TERMINATOR);
    Ok(bytes)
}

/// Outcome of one patch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Fields written
    pub written: usize,
    /// Fields left alone because their address is unknown
    pub unresolved: usize,
    /// Drivers or instructions that were not applied at all
    pub skipped: usize,
    /// Fields whose write was rejected
    pub failed: usize,
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} unresolved, {} skipped, {} failed",
            self.written, self.unresolved, self.skipped, self.failed
        )
    }
}

pub struct PatchEngine<'a, W: WriteMemory + ?Sized> {
    writer: &'a W,
}

impl<'a, W: WriteMemory + ?Sized> PatchEngine<'a, W> {
    pub fn new(writer: &'a W) -> Self {
        Self { writer }
    }

    /// Overwrite the string whose first character is at `address`.
    ///
    /// With `embed_length` the `{len, 0, 0}` header three bytes before
    /// `address` is rewritten too.
    pub fn overwrite(&self, address: u64, value: &str, embed_length: bool) -> Result<()> {
        let bytes = encode_string(value, embed_length)?;
        let start = if embed_length {
            address
                .checked_sub(string::PREFIX_LEN as u64)
                .ok_or_else(|| Error::MemoryWriteFailed {
                    address,
                    message: "no room for length header".to_string(),
                })?
        } else {
            address
        };
        self.writer.write_bytes(start, &bytes)
    }

    /// Apply rename instructions. Unknown drivers and empty last names are
    /// skipped. A failed write is counted and the pass goes on.
    pub fn apply_renames(
        &self,
        map: &EntityOffsetMap,
        roster: &Roster,
        targets: &[RenameTarget],
    ) -> PatchReport {
        let mut report = PatchReport::default();

        for target in targets {
            let (Some(entity), Some(record)) =
                (roster.get(&target.entity), map.get(&target.entity))
            else {
                warn!("Unknown driver '{}', skipping", target.entity);
                report.skipped += 1;
                continue;
            };
            if target.last.is_empty() {
                debug!("Empty last name for '{}', skipping", target.entity);
                report.skipped += 1;
                continue;
            }

            debug!("Renaming {} to {}", entity.name(), target.full_name());
            let full_name = target.full_name();
            let mut writes = vec![
                (OffsetField::First, target.first.as_str()),
                (OffsetField::Last, target.last.as_str()),
                (OffsetField::CombinedA, full_name.as_str()),
                (OffsetField::CombinedB, full_name.as_str()),
                (OffsetField::Formatted, full_name.as_str()),
            ];
            if !entity.is_placeholder() {
                if let Some(initials) = target.valid_initials() {
                    writes.insert(0, (OffsetField::Initials, initials));
                }
                writes.push((OffsetField::SecondaryFirst, target.first.as_str()));
                writes.push((OffsetField::SecondaryLast, target.last.as_str()));
            }

            self.write_fields(entity, record, &writes, &mut report);
        }

        info!("Applied renames: {}", report);
        report
    }

    /// Write every driver's default strings back.
    pub fn restore_defaults(&self, map: &EntityOffsetMap, roster: &Roster) -> PatchReport {
        let mut report = PatchReport::default();

        for (name, record) in map.iter() {
            let Some(entity) = roster.get(name) else {
                warn!("Cached driver '{}' is not in the roster, skipping", name);
                report.skipped += 1;
                continue;
            };

            let texts: Vec<(OffsetField, String)> = OffsetField::iter()
                .filter_map(|field| entity.text(field).map(|text| (field, text)))
                .collect();
            let writes: Vec<(OffsetField, &str)> = texts
                .iter()
                .map(|(field, text)| (*field, text.as_str()))
                .collect();

            self.write_fields(entity, record, &writes, &mut report);
        }

        info!("Restored default names: {}", report);
        report
    }

    fn write_fields(
        &self,
        entity: &Entity,
        record: &OffsetRecord,
        writes: &[(OffsetField, &str)],
        report: &mut PatchReport,
    ) {
        for (field, value) in writes {
            let Some(address) = record.get(*field) else {
                warn!("{}: {} is unresolved, not written", entity.name(), field);
                report.unresolved += 1;
                continue;
            };
            match self.overwrite(address, value, field.embeds_length()) {
                Ok(()) => {
                    debug!(
                        "{}: wrote {:?} to {} at 0x{:X}",
                        entity.name(),
                        value,
                        field,
                        address
                    );
                    report.written += 1;
                }
                Err(e) => {
                    error!("{}: failed to write {}: {}", entity.name(), field, e);
                    report.failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemory;
    use std::collections::BTreeMap;

    fn roster() -> Roster {
        Roster::build(&["Max Verstappen", "Player One"], "Player One", &BTreeMap::new()).unwrap()
    }

    fn full_record() -> OffsetRecord {
        OffsetRecord {
            combined_a: Some(0x1041),
            first: Some(0x1081),
            last: Some(0x10C1),
            combined_b: Some(0x1101),
            initials: Some(0x1141),
            formatted: Some(0x1181),
            secondary_first: Some(0x1200),
            secondary_last: Some(0x1240),
        }
    }

    fn target(line: &str) -> RenameTarget {
        parse_line(line).unwrap()
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(encode_string("Max", true).unwrap(), vec![3, 0, 0, b'M', b'a', b'x', 0]);
        assert_eq!(encode_string("Max", false).unwrap(), vec![b'M', b'a', b'x', 0]);
        assert_eq!(encode_string("", true).unwrap(), vec![0, 0, 0, 0]);
        assert!(matches!(
            encode_string(&"x".repeat(256), true),
            Err(Error::StringTooLong { len: 256 })
        ));
        assert!(encode_string(&"x".repeat(256), false).is_err());
    }

    #[test]
    fn test_overwrite_prefixed() {
        // Header lands on the page below
        let mem = MockMemory::builder().map(0x1FF0, 0x100).build();
        PatchEngine::new(&mem).overwrite(0x2001, "Max", true).unwrap();
        assert_eq!(mem.writes(), vec![(0x1FFE, vec![3, 0, 0, b'M', b'a', b'x', 0])]);
        assert_eq!(mem.snapshot(0x1FFE, 7).unwrap(), b"\x03\0\0Max\0".to_vec());
    }

    #[test]
    fn test_overwrite_plain() {
        let mem = MockMemory::builder().map(0x2000, 0x100).build();
        PatchEngine::new(&mem).overwrite(0x2010, "Max", false).unwrap();
        assert_eq!(mem.snapshot(0x2010, 4).unwrap(), vec![b'M', b'a', b'x', 0]);
    }

    #[test]
    fn test_overwrite_failure_propagates() {
        let mem = MockMemory::builder().build();
        let err = PatchEngine::new(&mem).overwrite(0x2001, "Max", true).unwrap_err();
        assert!(matches!(err, Error::MemoryWriteFailed { address: 0x1FFE, .. }));
    }

    #[test]
    fn test_apply_renames_writes_every_field() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", full_record());

        let report = PatchEngine::new(&mem)
            .apply_renames(&map, &roster(), &[target("Max Verstappen: DUT, Jos, Dutch")]);

        assert_eq!(report.written, 8);
        assert_eq!(report.unresolved, 0);
        assert_eq!(mem.snapshot(0x1141 - 3, 7).unwrap(), b"\x03\0\0DUT\0".to_vec());
        assert_eq!(mem.snapshot(0x1041 - 3, 13).unwrap(), b"\x09\0\0Jos Dutch\0".to_vec());
        assert_eq!(mem.snapshot(0x1181 - 3, 13).unwrap(), b"\x09\0\0Jos Dutch\0".to_vec());
        assert_eq!(mem.snapshot(0x1240, 6).unwrap(), b"Dutch\0".to_vec());
    }

    #[test]
    fn test_rename_with_empty_first_name() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", full_record());

        let report = PatchEngine::new(&mem)
            .apply_renames(&map, &roster(), &[target("Max Verstappen: VER, , Verstappen")]);

        assert_eq!(report.written, 8);
        assert_eq!(mem.snapshot(0x1041 - 3, 14).unwrap(), b"\x0A\0\0Verstappen\0".to_vec());
        assert_eq!(mem.snapshot(0x1101 - 3, 14).unwrap(), b"\x0A\0\0Verstappen\0".to_vec());
        assert_eq!(mem.snapshot(0x1081 - 3, 4).unwrap(), b"\0\0\0\0".to_vec());
    }

    #[test]
    fn test_failed_write_does_not_stop_pass() {
        // Only the second driver's page is mapped
        let mem = MockMemory::builder().map(0x3000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", full_record());
        map.insert(
            "Player One",
            OffsetRecord {
                first: Some(0x3001),
                ..Default::default()
            },
        );

        let report = PatchEngine::new(&mem).restore_defaults(&map, &roster());

        assert_eq!(report.failed, 8);
        assert_eq!(report.written, 1);
        assert_eq!(mem.snapshot(0x3001 - 3, 10).unwrap(), b"\x06\0\0Player\0".to_vec());
    }

    #[test]
    fn test_apply_renames_skips_short_initials_and_unresolved() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert(
            "Max Verstappen",
            OffsetRecord {
                secondary_last: None,
                ..full_record()
            },
        );

        let report = PatchEngine::new(&mem)
            .apply_renames(&map, &roster(), &[target("Max Verstappen: DU, Jos, Dutch")]);

        assert_eq!(report.written, 6);
        assert_eq!(report.unresolved, 1);
        assert!(mem.writes().iter().all(|(addr, _)| *addr != 0x1141 - 3));
        assert!(mem.writes().iter().all(|(addr, _)| *addr != 0x1240));
    }

    #[test]
    fn test_apply_renames_skips_unknown_and_empty_last() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", full_record());

        let report = PatchEngine::new(&mem)
            .apply_renames(
                &map,
                &roster(),
                &[
                    target("Lando Norris: NOR, Lando, Norris"),
                    target("Max Verstappen: VER, Max,"),
                ],
            );

        assert_eq!(report.skipped, 2);
        assert!(mem.writes().is_empty());
    }

    #[test]
    fn test_placeholder_rename_keeps_initials_and_secondary() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Player One", full_record());

        let report = PatchEngine::new(&mem)
            .apply_renames(&map, &roster(), &[target("Player One: ABC, Jane, Doe")]);

        assert_eq!(report.written, 5);
        let written: Vec<u64> = mem.writes().iter().map(|(addr, _)| *addr).collect();
        assert!(!written.contains(&(0x1141 - 3)));
        assert!(!written.contains(&0x1200));
    }

    #[test]
    fn test_restore_defaults() {
        let mem = MockMemory::builder().map(0x1000, 0x1000).build();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", full_record());
        map.insert(
            "Player One",
            OffsetRecord {
                first: Some(0x1301),
                ..Default::default()
            },
        );
        map.insert("Lando Norris", OffsetRecord::default());

        let report = PatchEngine::new(&mem).restore_defaults(&map, &roster());

        assert_eq!(report.written, 9);
        // Player One has four more fields without an address
        assert_eq!(report.unresolved, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(mem.snapshot(0x10C1 - 3, 14).unwrap(), b"\x0A\0\0VERSTAPPEN\0".to_vec());
        assert_eq!(
            mem.snapshot(0x1181 - 3, 44).unwrap(),
            b"\x28\0\0{o:mixed}Max{/o} {o:upper}VERSTAPPEN{/o}\0".to_vec()
        );
        assert_eq!(mem.snapshot(0x1301 - 3, 10).unwrap(), b"\x06\0\0Player\0".to_vec());
    }

    #[test]
    fn test_report_display() {
        let report = PatchReport {
            written: 3,
            unresolved: 1,
            skipped: 0,
            failed: 2,
        };
        assert_eq!(
            report.to_string(),
            "3 written, 1 unresolved, 0 skipped, 2 failed"
        );
    }
}
