//! Driver rosters.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::offset::EntityOffsetMap;

/// The 2021 grid plus the two legends, in scan order. The placeholder is
/// appended separately.
pub const FULL_ROSTER: &[&str] = &[
    "Carlos Sainz",
    "Daniel Ricciardo",
    "Fernando Alonso",
    "Kimi Räikkönen",
    "Lewis Hamilton",
    "Max Verstappen",
    "Sebastian Vettel",
    "Sergio Perez",
    "Valtteri Bottas",
    "Esteban Ocon",
    "Lance Stroll",
    "George Russell",
    "Lando Norris",
    "Charles Leclerc",
    "Pierre Gasly",
    "Nicholas Latifi",
    "Antonio Giovinazzi",
    "Nikita Mazepin",
    "Mick Schumacher",
    "Yuki Tsunoda",
    "Michael Schumacher",
    "Felipe Massa",
];

/// Short roster for quick rebuilds.
pub const REDUCED_ROSTER: &[&str] = &[
    "Carlos Sainz",
    "Nikita Mazepin",
    "Michael Schumacher",
    "Felipe Massa",
];

pub const DEFAULT_PLACEHOLDER: &str = "Player One";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RosterKind {
    Full,
    #[default]
    Reduced,
    /// Names taken from the `drivers` config list
    Custom,
}

/// Ordered set of entities to scan and patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    entities: Vec<Entity>,
}

impl Roster {
    /// Built-in roster of `kind` followed by the placeholder.
    ///
    /// `Custom` has no built-in names; use [`Roster::build`] with the
    /// configured list instead.
    pub fn builtin(
        kind: RosterKind,
        placeholder: &str,
        initials: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let names = match kind {
            RosterKind::Full => FULL_ROSTER,
            RosterKind::Reduced => REDUCED_ROSTER,
            RosterKind::Custom => {
                return Err(Error::InvalidConfig(
                    "custom roster needs an explicit driver list".to_string(),
                ));
            }
        };
        let mut names: Vec<&str> = names.to_vec();
        names.push(placeholder);
        Self::build(&names, placeholder, initials)
    }

    /// Roster from explicit names. A name equal to `placeholder` becomes the
    /// literal placeholder entity; every other name must have a first and a
    /// last name.
    pub fn build<S: AsRef<str>>(
        names: &[S],
        placeholder: &str,
        initials: &BTreeMap<String, String>,
    ) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::InvalidConfig("roster is empty".to_string()));
        }

        let placeholder = placeholder.trim();
        let mut seen = HashSet::new();
        let mut entities = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            if !seen.insert(name) {
                return Err(Error::InvalidConfig(format!(
                    "driver '{}' is listed twice",
                    name
                )));
            }
            let entity = if name == placeholder {
                Entity::literal(name)?
            } else {
                Entity::tokenized(name, initials.get(name).map(String::as_str))?
            };
            entities.push(entity);
        }

        Ok(Self { entities })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(Entity::name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `map` has a record for exactly the drivers of this roster.
    pub fn matches(&self, map: &EntityOffsetMap) -> bool {
        map.len() == self.len() && self.names().all(|name| map.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::OffsetRecord;

    fn default_initials() -> BTreeMap<String, String> {
        BTreeMap::from([("Kimi Räikkönen".to_string(), "RAI".to_string())])
    }

    #[test]
    fn test_full_roster() {
        let roster = Roster::builtin(RosterKind::Full, DEFAULT_PLACEHOLDER, &default_initials())
            .unwrap();
        assert_eq!(roster.len(), 23);
        assert_eq!(roster.names().next(), Some("Carlos Sainz"));
        assert!(roster.entities().last().unwrap().is_placeholder());
        assert_eq!(roster.get("Kimi Räikkönen").unwrap().initials(), Some("RAI"));
        assert_eq!(roster.get("Lando Norris").unwrap().initials(), Some("NOR"));
    }

    #[test]
    fn test_reduced_roster() {
        let roster =
            Roster::builtin(RosterKind::Reduced, DEFAULT_PLACEHOLDER, &BTreeMap::new()).unwrap();
        let names: Vec<_> = roster.names().collect();
        assert_eq!(
            names,
            [
                "Carlos Sainz",
                "Nikita Mazepin",
                "Michael Schumacher",
                "Felipe Massa",
                "Player One"
            ]
        );
    }

    #[test]
    fn test_custom_kind_has_no_builtin_list() {
        assert!(Roster::builtin(RosterKind::Custom, DEFAULT_PLACEHOLDER, &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_build_rejects_duplicates_and_single_names() {
        let empty = BTreeMap::new();
        assert!(matches!(
            Roster::build(&["Max Verstappen", " Max Verstappen"], "Player One", &empty),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Roster::build(&["Verstappen"], "Player One", &empty),
            Err(Error::InvalidEntity(_))
        ));
        assert!(Roster::build::<&str>(&[], "Player One", &empty).is_err());
    }

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!("full".parse::<RosterKind>().unwrap(), RosterKind::Full);
        assert_eq!(RosterKind::Custom.to_string(), "custom");
        assert_eq!(RosterKind::default(), RosterKind::Reduced);
    }

    #[test]
    fn test_matches_map_keys() {
        let roster = Roster::build(&["Max Verstappen", "Player One"], "Player One", &BTreeMap::new())
            .unwrap();
        let mut map = EntityOffsetMap::new();
        map.insert("Max Verstappen", OffsetRecord::default());
        assert!(!roster.matches(&map));

        map.insert("Player One", OffsetRecord::default());
        assert!(roster.matches(&map));

        map.insert("Lando Norris", OffsetRecord::default());
        assert!(!roster.matches(&map));
    }
}
