use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::memory::layout::scan;

/// Logical string slots discovered for one driver.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum OffsetField {
    /// "First LAST" in the driver selection list
    CombinedA,
    First,
    Last,
    /// Second "First LAST" copy, used by the race directory
    CombinedB,
    Initials,
    /// Styled "{o:mixed}First{/o} {o:upper}LAST{/o}" string
    Formatted,
    /// First name as used by session alert messages (no length header)
    SecondaryFirst,
    /// Last name as used by session alert messages (no length header)
    SecondaryLast,
}

impl OffsetField {
    /// Whether the stored string carries a `{len, 0, 0}` header.
    pub fn embeds_length(&self) -> bool {
        !matches!(self, Self::SecondaryFirst | Self::SecondaryLast)
    }

    pub fn align_offset(&self) -> u64 {
        if self.embeds_length() {
            scan::PREFIXED_ALIGN
        } else {
            0
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Discovered addresses for one driver. `None` means the field was not
/// found (or not searched) and must never be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRecord {
    #[serde(default)]
    pub combined_a: Option<u64>,
    #[serde(default)]
    pub first: Option<u64>,
    #[serde(default)]
    pub last: Option<u64>,
    #[serde(default)]
    pub combined_b: Option<u64>,
    #[serde(default)]
    pub initials: Option<u64>,
    #[serde(default)]
    pub formatted: Option<u64>,
    #[serde(default)]
    pub secondary_first: Option<u64>,
    #[serde(default)]
    pub secondary_last: Option<u64>,
}

impl OffsetRecord {
    pub fn get(&self, field: OffsetField) -> Option<u64> {
        match field {
            OffsetField::CombinedA => self.combined_a,
            OffsetField::First => self.first,
            OffsetField::Last => self.last,
            OffsetField::CombinedB => self.combined_b,
            OffsetField::Initials => self.initials,
            OffsetField::Formatted => self.formatted,
            OffsetField::SecondaryFirst => self.secondary_first,
            OffsetField::SecondaryLast => self.secondary_last,
        }
    }

    pub fn set(&mut self, field: OffsetField, address: Option<u64>) {
        let slot = match field {
            OffsetField::CombinedA => &mut self.combined_a,
            OffsetField::First => &mut self.first,
            OffsetField::Last => &mut self.last,
            OffsetField::CombinedB => &mut self.combined_b,
            OffsetField::Initials => &mut self.initials,
            OffsetField::Formatted => &mut self.formatted,
            OffsetField::SecondaryFirst => &mut self.secondary_first,
            OffsetField::SecondaryLast => &mut self.secondary_last,
        };
        *slot = address;
    }

    pub fn resolved_count(&self) -> usize {
        OffsetField::iter().filter(|f| self.get(*f).is_some()).count()
    }
}

impl fmt::Display for OffsetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in OffsetField::iter() {
            match self.get(field) {
                Some(address) => writeln!(f, "{:<16} 0x{:X}", field.name(), address)?,
                None => writeln!(f, "{:<16} (unresolved)", field.name())?,
            }
        }
        Ok(())
    }
}

/// Offset records per driver name, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityOffsetMap {
    entries: Vec<(String, OffsetRecord)>,
}

impl EntityOffsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `name`, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, record: OffsetRecord) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = record,
            None => self.entries.push((name, record)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OffsetRecord> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, record)| record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OffsetRecord)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for EntityOffsetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EntityOffsetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = EntityOffsetMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of driver name to offset record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = EntityOffsetMap::new();
                while let Some((name, record)) = access.next_entry::<String, OffsetRecord>()? {
                    map.insert(name, record);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
