//! # Channel Level Table
//!
//! Minimum access level per community channel. Commands issued in a channel
//! run at that channel's level; channels missing from the table run at
//! [`AccessLevel::Unrecognized`].
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Load from YAML with built-in defaults
//! - 1.0.0: Initial release

use crate::core::level::AccessLevel;
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Resolves the level a channel grants to callers
pub trait ChannelLevelLookup: Send + Sync {
    /// `None` for channels that are not part of the community
    fn channel_level(&self, channel: &str) -> Option<AccessLevel>;
}

/// YAML schema: `channels: { "#name": level }`
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ChannelFile {
    channels: BTreeMap<String, AccessLevel>,
}

/// Case-insensitive channel to level mapping
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    levels: HashMap<String, AccessLevel>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The community's standard channel set
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (name, level) in [
            ("#LVP", AccessLevel::None),
            ("#LVP.Beta", AccessLevel::None),
            ("#LVP.echo", AccessLevel::None),
            ("#LVP.NL", AccessLevel::None),
            ("#LVP.Radio", AccessLevel::None),
            ("#LVP.VIP", AccessLevel::Vip),
            ("#LVP.Dev", AccessLevel::Developer),
            ("#LVP.crew", AccessLevel::Moderator),
            ("#LVP.Managers", AccessLevel::Management),
            ("#LVP.Management", AccessLevel::Management),
            ("#Bot", AccessLevel::Management),
        ] {
            table.add(name, level);
        }
        table
    }

    /// Load from a YAML file, falling back to [`ChannelTable::builtin`] when it does not exist
    pub fn load_or_builtin(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("📄 No channel table at {path}, using built-in channels");
            return Ok(Self::builtin());
        }
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_yaml(&contents)?;
        info!("📄 Loaded {} channels from {path}", table.len());
        Ok(table)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let file: ChannelFile = serde_yaml::from_str(contents)?;
        let mut table = Self::new();
        for (name, level) in file.channels {
            if !name.starts_with('#') {
                return Err(anyhow::anyhow!("Channel name must start with '#': {}", name));
            }
            if level == AccessLevel::Unrecognized {
                return Err(anyhow::anyhow!(
                    "Channel {} cannot be configured at the unrecognized level",
                    name
                ));
            }
            table.add(&name, level);
        }
        Ok(table)
    }

    pub fn add(&mut self, name: &str, level: AccessLevel) {
        self.levels.insert(name.to_lowercase(), level);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.levels.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl ChannelLevelLookup for ChannelTable {
    fn channel_level(&self, channel: &str) -> Option<AccessLevel> {
        self.levels.get(&channel.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let table = ChannelTable::builtin();
        assert_eq!(table.channel_level("#lvp.crew"), Some(AccessLevel::Moderator));
        assert_eq!(table.channel_level("#LVP.CREW"), Some(AccessLevel::Moderator));
        assert_eq!(table.channel_level("#bot"), Some(AccessLevel::Management));
        assert_eq!(table.channel_level("#elsewhere"), None);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r##"
channels:
  "#general": none
  "#staff": moderator
"##;
        let table = ChannelTable::from_yaml(yaml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.channel_level("#General"), Some(AccessLevel::None));
        assert_eq!(table.channel_level("#staff"), Some(AccessLevel::Moderator));
    }

    #[test]
    fn test_from_yaml_rejects_bad_names() {
        let yaml = "channels:\n  general: none\n";
        assert!(ChannelTable::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_yaml_rejects_unknown_level() {
        let yaml = "channels:\n  \"#general\": superuser\n";
        assert!(ChannelTable::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file_uses_builtin() {
        let table = ChannelTable::load_or_builtin("/nonexistent/channels.yaml").unwrap();
        assert!(table.contains("#lvp.echo"));
    }
}
