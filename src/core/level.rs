//! # Access Levels
//!
//! Ranked access levels gating which commands a caller may run.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Explicit ranks and stable names; ordering no longer follows declaration order
//! - 1.1.0: Add Moderator between Developer and Administrator
//! - 1.0.0: Initial release

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// An access level. Persisted and configured by name, compared by [`AccessLevel::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Callers in channels without a configured level. Ranks below every other level.
    Unrecognized,
    None,
    Vip,
    Developer,
    Moderator,
    Administrator,
    Management,
}

impl AccessLevel {
    /// All levels that commands can be registered at, lowest first.
    pub const REGISTRABLE: [AccessLevel; 6] = [
        AccessLevel::None,
        AccessLevel::Vip,
        AccessLevel::Developer,
        AccessLevel::Moderator,
        AccessLevel::Administrator,
        AccessLevel::Management,
    ];

    /// Crew levels, highest first.
    pub const CREW: [AccessLevel; 4] = [
        AccessLevel::Management,
        AccessLevel::Administrator,
        AccessLevel::Moderator,
        AccessLevel::Developer,
    ];

    /// Explicit rank. Gaps leave room for new levels without renumbering.
    pub const fn rank(self) -> i16 {
        match self {
            AccessLevel::Unrecognized => -1,
            AccessLevel::None => 0,
            AccessLevel::Vip => 10,
            AccessLevel::Developer => 20,
            AccessLevel::Moderator => 30,
            AccessLevel::Administrator => 40,
            AccessLevel::Management => 50,
        }
    }

    /// Stable lowercase identifier.
    pub const fn name(self) -> &'static str {
        match self {
            AccessLevel::Unrecognized => "unrecognized",
            AccessLevel::None => "none",
            AccessLevel::Vip => "vip",
            AccessLevel::Developer => "developer",
            AccessLevel::Moderator => "moderator",
            AccessLevel::Administrator => "administrator",
            AccessLevel::Management => "management",
        }
    }

    /// Whether this level satisfies a command's required level
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self >= required
    }

    pub fn is_crew(self) -> bool {
        self >= AccessLevel::Developer
    }

    /// Translate a gamemode level name into an access level.
    ///
    /// Unknown names are treated as regular players; a developer flag lifts a
    /// regular player to [`AccessLevel::Developer`].
    pub fn from_gamemode(level: &str, is_developer: bool) -> Self {
        match level {
            "Management" => AccessLevel::Management,
            "Administrator" => AccessLevel::Administrator,
            "Moderator" => AccessLevel::Moderator,
            _ if is_developer => AccessLevel::Developer,
            _ => AccessLevel::None,
        }
    }
}

impl Ord for AccessLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for AccessLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(AccessLevel::None),
            "vip" => Ok(AccessLevel::Vip),
            "developer" => Ok(AccessLevel::Developer),
            "moderator" => Ok(AccessLevel::Moderator),
            "administrator" | "admin" => Ok(AccessLevel::Administrator),
            "management" => Ok(AccessLevel::Management),
            _ => Err(anyhow::anyhow!("Invalid access level: {}", s)),
        }
    }
}
