//! Drivers and the text the target stores for them.

use crate::error::{Error, Result};
use crate::offset::OffsetField;

/// How a roster name maps onto first/last name strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityName {
    /// A real driver. The last name is shown uppercased.
    Tokenized { first: String, last: String },
    /// The placeholder identity. Both words are used verbatim and the
    /// driver has no initials or alert-message strings.
    Literal { first: String, last: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    kind: EntityName,
    initials: Option<String>,
}

impl Entity {
    /// A real driver. `name` is split at the first whitespace run; the rest
    /// is the last name.
    pub fn tokenized(name: &str, initials_override: Option<&str>) -> Result<Self> {
        let (first, last) = split_name(name)?;
        let initials = match initials_override {
            Some(initials) => initials.to_string(),
            None => default_initials(&last),
        };
        Ok(Self {
            name: name.trim().to_string(),
            kind: EntityName::Tokenized { first, last },
            initials: Some(initials),
        })
    }

    /// The placeholder identity (e.g. "Player One").
    pub fn literal(name: &str) -> Result<Self> {
        let (first, last) = split_name(name)?;
        Ok(Self {
            name: name.trim().to_string(),
            kind: EntityName::Literal { first, last },
            initials: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EntityName {
        &self.kind
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, EntityName::Literal { .. })
    }

    pub fn first(&self) -> &str {
        match &self.kind {
            EntityName::Tokenized { first, .. } | EntityName::Literal { first, .. } => first,
        }
    }

    /// Last name as the target displays it.
    pub fn last(&self) -> String {
        match &self.kind {
            EntityName::Tokenized { last, .. } => last.to_uppercase(),
            EntityName::Literal { last, .. } => last.clone(),
        }
    }

    pub fn combined(&self) -> String {
        match &self.kind {
            EntityName::Tokenized { .. } => format!("{} {}", self.first(), self.last()),
            EntityName::Literal { .. } => self.name.clone(),
        }
    }

    pub fn formatted(&self) -> String {
        formatted_display(self.first(), &self.last())
    }

    pub fn initials(&self) -> Option<&str> {
        self.initials.as_deref()
    }

    /// Canonical text stored in `field`, or `None` if this driver has no
    /// such string.
    pub fn text(&self, field: OffsetField) -> Option<String> {
        let placeholder = self.is_placeholder();
        match field {
            OffsetField::CombinedA | OffsetField::CombinedB => Some(self.combined()),
            OffsetField::First => Some(self.first().to_string()),
            OffsetField::Last => Some(self.last()),
            OffsetField::Formatted => Some(self.formatted()),
            OffsetField::Initials => self.initials.clone(),
            OffsetField::SecondaryFirst if !placeholder => Some(self.first().to_string()),
            OffsetField::SecondaryLast if !placeholder => Some(self.last()),
            OffsetField::SecondaryFirst | OffsetField::SecondaryLast => None,
        }
    }
}

/// The styled name string used by the driver overview.
pub fn formatted_display(first: &str, last: &str) -> String {
    format!("{{o:mixed}}{}{{/o}} {{o:upper}}{}{{/o}}", first, last)
}

fn split_name(name: &str) -> Result<(String, String)> {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, last)) if !last.trim().is_empty() => {
            Ok((first.to_string(), last.trim().to_string()))
        }
        _ => Err(Error::InvalidEntity(format!(
            "'{}' needs a first and a last name",
            name
        ))),
    }
}

fn default_initials(last: &str) -> String {
    last.to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect()
}
