//! Per-driver offset discovery.
//!
//! Each driver's strings are found by a fixed chain of scans. A step either
//! starts at a region base or right after the string found by an earlier
//! step, which keeps related strings of the same driver together.

use tracing::{debug, info, warn};

use crate::entity::Entity;
use crate::memory::ReadMemory;
use crate::roster::Roster;

use super::{BytePattern, EntityOffsetMap, OffsetField, OffsetRecord, PatternScanner, constants};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Main,
    Format,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStart {
    Region(Region),
    /// Just past the string found for an earlier field
    After(OffsetField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupStep {
    pub field: OffsetField,
    pub start: SearchStart,
}

const fn step(field: OffsetField, start: SearchStart) -> LookupStep {
    LookupStep { field, start }
}

const fn base(region: Region) -> SearchStart {
    SearchStart::Region(region)
}

const fn after(field: OffsetField) -> SearchStart {
    SearchStart::After(field)
}

const TOKENIZED_PLAN: &[LookupStep] = &[
    step(OffsetField::CombinedA, base(Region::Main)),
    step(OffsetField::First, after(OffsetField::CombinedA)),
    step(OffsetField::Last, after(OffsetField::First)),
    step(OffsetField::CombinedB, after(OffsetField::Last)),
    step(OffsetField::Initials, after(OffsetField::CombinedB)),
    step(OffsetField::Formatted, base(Region::Format)),
    step(OffsetField::SecondaryFirst, base(Region::Secondary)),
    step(OffsetField::SecondaryLast, after(OffsetField::SecondaryFirst)),
];

const LITERAL_PLAN: &[LookupStep] = &[
    step(OffsetField::CombinedA, base(Region::Main)),
    step(OffsetField::CombinedB, after(OffsetField::CombinedA)),
    step(OffsetField::First, base(Region::Main)),
    step(OffsetField::Last, after(OffsetField::First)),
    step(OffsetField::Formatted, base(Region::Format)),
];

/// Scan order for `entity`. Dependencies always precede their dependents.
pub fn lookup_plan(entity: &Entity) -> &'static [LookupStep] {
    if entity.is_placeholder() {
        LITERAL_PLAN
    } else {
        TOKENIZED_PLAN
    }
}

/// Base addresses of the scan regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegions {
    pub main: u64,
    pub format: u64,
    pub secondary: u64,
}

impl Default for ScanRegions {
    fn default() -> Self {
        Self {
            main: constants::MAIN_REGION,
            format: constants::FORMAT_REGION,
            secondary: constants::SECONDARY_REGION,
        }
    }
}

impl ScanRegions {
    pub fn base(&self, region: Region) -> u64 {
        match region {
            Region::Main => self.main,
            Region::Format => self.format,
            Region::Secondary => self.secondary,
        }
    }
}

pub struct OffsetResolver<'a, R: ReadMemory + ?Sized> {
    scanner: PatternScanner<'a, R>,
    regions: ScanRegions,
}

impl<'a, R: ReadMemory + ?Sized> OffsetResolver<'a, R> {
    pub fn new(reader: &'a R, regions: ScanRegions, search_window: u64) -> Self {
        Self {
            scanner: PatternScanner::new(reader, search_window),
            regions,
        }
    }

    /// Discover every field of `entity`. Fields that are not found, or whose
    /// predecessor was not found, stay unresolved.
    pub fn resolve(&self, entity: &Entity) -> OffsetRecord {
        let mut record = OffsetRecord::default();

        for step in lookup_plan(entity) {
            let Some(text) = entity.text(step.field) else {
                continue;
            };

            let start = match step.start {
                SearchStart::Region(region) => self.regions.base(region),
                SearchStart::After(previous) => {
                    let found = record.get(previous).zip(entity.text(previous));
                    let Some((address, previous_text)) = found else {
                        warn!(
                            "{}: skipping {} because {} is unresolved",
                            entity.name(),
                            step.field,
                            previous
                        );
                        continue;
                    };
                    address + previous_text.len() as u64
                }
            };

            let pattern = if step.field.embeds_length() {
                BytePattern::prefixed(&text)
            } else {
                BytePattern::plain(&text)
            };

            let found = self.scanner.find(start, &pattern);
            match found {
                Some(address) => debug!(
                    "{}: {} {} at 0x{:X}",
                    entity.name(),
                    step.field,
                    pattern,
                    address
                ),
                None => warn!(
                    "{}: {} {} not found from 0x{:X}",
                    entity.name(),
                    step.field,
                    pattern,
                    start
                ),
            }
            record.set(step.field, found);
        }

        record
    }

    /// Resolve the whole roster in order.
    pub fn resolve_all(&self, roster: &Roster) -> EntityOffsetMap {
        let total = roster.len();
        let mut map = EntityOffsetMap::new();

        for (i, entity) in roster.entities().iter().enumerate() {
            info!("Scanning for {} ({}/{})", entity.name(), i + 1, total);
            let record = self.resolve(entity);
            debug!("{}:\n{}", entity.name(), record);
            map.insert(entity.name(), record);
        }

        map
    }
}
