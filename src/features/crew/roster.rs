//! # Crew Roster
//!
//! Permanent crew loaded from the `users` table plus the in-game temporary
//! crew: temp moderators, temp administrators and undercover logins. The
//! temporary part survives restarts through a versioned snapshot.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Versioned snapshot of the in-game crew
//! - 1.1.0: Undercover logins resolve to the real name's level
//! - 1.0.0: Initial release

use crate::core::error::SnapshotError;
use crate::core::level::AccessLevel;
use crate::core::snapshot::SnapshotFile;
use crate::database::QueryOutput;
use dashmap::DashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version of [`IngameCrewState`] snapshots
pub const INGAME_CREW_VERSION: u32 = 1;

/// Query used by `!updatecrew`
pub const UPDATE_CREW_QUERY: &str = "SELECT user_id, username, level, is_developer \
     FROM users \
     WHERE level != 'Player' OR is_developer <> 0 \
     ORDER BY username ASC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewMember {
    pub profile_id: i64,
    /// Nickname with its registered capitalisation
    pub nickname: String,
    pub level: AccessLevel,
}

/// Temporary crew, persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngameCrewState {
    /// Real name -> name in game
    #[serde(default)]
    pub mod_logins: BTreeMap<String, String>,
    /// Temp moderator -> crew member who granted it
    #[serde(default)]
    pub temp_mods: BTreeMap<String, String>,
    /// Temp administrator -> crew member who granted it
    #[serde(default)]
    pub temp_admins: BTreeMap<String, String>,
}

/// Number of permanent crew members per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrewCounts {
    pub management: usize,
    pub administrators: usize,
    pub moderators: usize,
    pub developers: usize,
}

impl CrewCounts {
    pub fn total(&self) -> usize {
        self.management + self.administrators + self.moderators + self.developers
    }
}

impl fmt::Display for CrewCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} management, {} administrator, {} moderator, {} developer",
            self.management, self.administrators, self.moderators, self.developers
        )
    }
}

#[derive(Debug, Default)]
pub struct CrewRoster {
    /// Keyed by lowercase nickname
    permanent: DashMap<String, CrewMember>,
    mod_logins: DashMap<String, String>,
    temp_mods: DashMap<String, String>,
    temp_admins: DashMap<String, String>,
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build crew members from `users` rows; players without crew rights are skipped
    pub fn members_from_rows(output: &QueryOutput) -> Vec<CrewMember> {
        output
            .rows
            .iter()
            .filter_map(|row| {
                let nickname = row.get("username")?.to_string();
                let level = AccessLevel::from_gamemode(
                    row.get("level").unwrap_or_default(),
                    row.get_bool("is_developer"),
                );
                if !level.is_crew() {
                    return None;
                }
                Some(CrewMember {
                    profile_id: row.get_i64("user_id").unwrap_or_default(),
                    nickname,
                    level,
                })
            })
            .collect()
    }

    /// Replace the permanent crew
    pub fn replace_permanent(&self, members: Vec<CrewMember>) -> CrewCounts {
        self.permanent.clear();
        for member in members {
            self.permanent.insert(member.nickname.to_lowercase(), member);
        }
        let counts = self.counts();
        info!("👥 Crew updated: {counts}");
        counts
    }

    pub fn counts(&self) -> CrewCounts {
        let mut counts = CrewCounts::default();
        for member in self.permanent.iter() {
            match member.level {
                AccessLevel::Management => counts.management += 1,
                AccessLevel::Administrator => counts.administrators += 1,
                AccessLevel::Moderator => counts.moderators += 1,
                AccessLevel::Developer => counts.developers += 1,
                _ => {}
            }
        }
        counts
    }

    /// Level of a permanent crew member. The nickname must match the
    /// registered capitalisation exactly.
    pub fn permanent_level(&self, nickname: &str) -> Option<AccessLevel> {
        self.permanent
            .get(&nickname.to_lowercase())
            .filter(|member| member.nickname == nickname)
            .map(|member| member.level)
    }

    pub fn is_permanent_crew(&self, nickname: &str) -> bool {
        self.permanent_level(nickname).is_some()
    }

    /// Level granted in game: temp rights, or an undercover login's real level
    pub fn temporary_level(&self, nickname: &str) -> Option<AccessLevel> {
        if self.temp_admins.contains_key(nickname) {
            return Some(AccessLevel::Administrator);
        }
        if self.temp_mods.contains_key(nickname) {
            return Some(AccessLevel::Moderator);
        }
        self.real_name_of(nickname)
            .map(|real| self.permanent_level(&real).unwrap_or(AccessLevel::Moderator))
    }

    /// Level used for commands from the in-game crew chat
    pub fn level(&self, nickname: &str) -> AccessLevel {
        self.permanent_level(nickname)
            .or_else(|| self.temporary_level(nickname))
            .unwrap_or(AccessLevel::None)
    }

    pub fn is_ingame_crew(&self, nickname: &str) -> bool {
        self.is_permanent_crew(nickname) || self.temporary_level(nickname).is_some()
    }

    fn real_name_of(&self, ingame: &str) -> Option<String> {
        self.mod_logins
            .iter()
            .find(|entry| entry.value() == ingame)
            .map(|entry| entry.key().clone())
    }

    pub fn add_temp_mod(&self, nickname: &str, granted_by: &str) {
        debug!("{nickname} given temporary moderator rights by {granted_by}");
        self.temp_mods
            .insert(nickname.to_string(), granted_by.to_string());
    }

    pub fn add_temp_admin(&self, nickname: &str, granted_by: &str) {
        debug!("{nickname} given temporary administrator rights by {granted_by}");
        self.temp_admins
            .insert(nickname.to_string(), granted_by.to_string());
    }

    /// Register an undercover login. Ignored when both names are the same.
    pub fn add_mod_login(&self, ingame: &str, real: &str) -> bool {
        if ingame == real {
            return false;
        }
        self.mod_logins.insert(real.to_string(), ingame.to_string());
        true
    }

    /// Drop every temporary right held under `nickname`. Returns whether any was held.
    pub fn remove_temporary(&self, nickname: &str) -> bool {
        let mut removed = self.temp_mods.remove(nickname).is_some();
        removed |= self.temp_admins.remove(nickname).is_some();
        if let Some(real) = self.real_name_of(nickname) {
            removed |= self.mod_logins.remove(&real).is_some();
        }
        removed
    }

    pub fn clear_ingame(&self) {
        self.mod_logins.clear();
        self.temp_mods.clear();
        self.temp_admins.clear();
    }

    pub fn ingame_state(&self) -> IngameCrewState {
        let collect = |map: &DashMap<String, String>| {
            map.iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect::<BTreeMap<_, _>>()
        };
        IngameCrewState {
            mod_logins: collect(&self.mod_logins),
            temp_mods: collect(&self.temp_mods),
            temp_admins: collect(&self.temp_admins),
        }
    }

    pub fn restore_ingame(&self, state: IngameCrewState) {
        self.clear_ingame();
        for (real, ingame) in state.mod_logins {
            self.mod_logins.insert(real, ingame);
        }
        for (nickname, granted_by) in state.temp_mods {
            self.temp_mods.insert(nickname, granted_by);
        }
        for (nickname, granted_by) in state.temp_admins {
            self.temp_admins.insert(nickname, granted_by);
        }
    }

    pub fn save_state(&self, file: &SnapshotFile) -> Result<(), SnapshotError> {
        file.save(&self.ingame_state())
    }

    /// Restore the in-game crew from `file`. Returns whether a snapshot was found.
    pub fn load_state(&self, file: &SnapshotFile) -> Result<bool, SnapshotError> {
        match file.load::<IngameCrewState>()? {
            Some(state) => {
                info!(
                    "👥 Restored in-game crew: {} temp mods, {} temp admins, {} undercover",
                    state.temp_mods.len(),
                    state.temp_admins.len(),
                    state.mod_logins.len()
                );
                self.restore_ingame(state);
                Ok(true)
            }
            None => {
                debug!("No in-game crew snapshot at {}, starting empty", file.path().display());
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Row;

    fn roster() -> CrewRoster {
        let roster = CrewRoster::new();
        roster.replace_permanent(vec![
            CrewMember {
                profile_id: 1,
                nickname: "Gunther".to_string(),
                level: AccessLevel::Management,
            },
            CrewMember {
                profile_id: 2,
                nickname: "Russell".to_string(),
                level: AccessLevel::Moderator,
            },
        ]);
        roster
    }

    #[test]
    fn test_permanent_level_is_case_exact() {
        let roster = roster();
        assert_eq!(roster.permanent_level("Gunther"), Some(AccessLevel::Management));
        assert_eq!(roster.permanent_level("gunther"), None);
        assert_eq!(roster.level("Nobody"), AccessLevel::None);
    }

    #[test]
    fn test_members_from_rows() {
        let output = QueryOutput::from_rows(vec![
            Row::from([
                ("user_id", Some("10")),
                ("username", Some("Gunther")),
                ("level", Some("Management")),
                ("is_developer", Some("0")),
            ]),
            Row::from([
                ("user_id", Some("11")),
                ("username", Some("Coder")),
                ("level", Some("Player")),
                ("is_developer", Some("1")),
            ]),
            Row::from([
                ("user_id", Some("12")),
                ("username", Some("Regular")),
                ("level", Some("Player")),
                ("is_developer", Some("0")),
            ]),
        ]);

        let members = CrewRoster::members_from_rows(&output);
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].level, AccessLevel::Developer);

        let roster = CrewRoster::new();
        let counts = roster.replace_permanent(members);
        assert_eq!(counts.management, 1);
        assert_eq!(counts.developers, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_temporary_rights() {
        let roster = roster();
        roster.add_temp_mod("Helper", "Russell");
        roster.add_temp_admin("Trusted", "Gunther");

        assert_eq!(roster.level("Helper"), AccessLevel::Moderator);
        assert_eq!(roster.level("Trusted"), AccessLevel::Administrator);
        assert!(roster.is_ingame_crew("Helper"));

        assert!(roster.remove_temporary("Helper"));
        assert!(!roster.remove_temporary("Helper"));
        assert_eq!(roster.level("Helper"), AccessLevel::None);
    }

    #[test]
    fn test_mod_login_uses_real_level() {
        let roster = roster();
        assert!(!roster.add_mod_login("Gunther", "Gunther"));
        assert!(roster.add_mod_login("Incognito", "Gunther"));

        assert_eq!(roster.level("Incognito"), AccessLevel::Management);
        assert!(roster.remove_temporary("Incognito"));
        assert!(!roster.is_ingame_crew("Incognito"));
    }

    #[test]
    fn test_state_round_trip_through_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("ingame_crew.json"), INGAME_CREW_VERSION);

        let roster = roster();
        roster.add_temp_mod("Helper", "Russell");
        roster.add_mod_login("Incognito", "Gunther");
        roster.save_state(&file).unwrap();

        let restored = CrewRoster::new();
        assert!(restored.load_state(&file).unwrap());
        assert_eq!(restored.ingame_state(), roster.ingame_state());
        assert!(!file.exists());
        assert!(!restored.load_state(&file).unwrap());
    }
}
