use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A database schema version.
///
/// Versions only ever increase. Version 0 is the oldest layout an upgrade
/// can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

/// The schema version this build of canzona writes.
///
/// Whenever the schema changes this must be incremented and a step for the
/// new number added to the registry.
pub const CURRENT_VERSION: SchemaVersion = SchemaVersion(19);

impl SchemaVersion {
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The version directly after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Iterate the versions strictly after `self` up to and including `to`.
    pub fn successors_through(self, to: Self) -> impl Iterator<Item = Self> {
        (self.0 + 1..=to.0).map(Self)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}
