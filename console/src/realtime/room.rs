//! Room naming

use std::fmt;
use std::str::FromStr;

use crate::models::entity::EntityKind;

/// A channel scoped to one entity, named `<kind>:<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Room {
    pub kind: EntityKind,
    pub id: String,
}

impl Room {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid room name: {}", s))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("Invalid room name: {}", s));
        }
        Ok(Room::new(kind.parse()?, id))
    }
}
