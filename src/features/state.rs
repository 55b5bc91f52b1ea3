//! # Bot State
//!
//! Shared runtime state of the features together with the snapshot files it
//! is written to between runs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use super::crew::{CrewRoster, INGAME_CREW_VERSION};
use super::directives::{DirectiveStore, DIRECTIVES_VERSION};
use crate::core::error::SnapshotError;
use crate::core::snapshot::SnapshotFile;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

pub const INGAME_CREW_FILE: &str = "ingame_crew.json";
pub const DIRECTIVES_FILE: &str = "directives.json";

pub struct BotState {
    pub roster: Arc<CrewRoster>,
    pub directives: Arc<DirectiveStore>,
    crew_snapshot: SnapshotFile,
    directives_snapshot: SnapshotFile,
}

impl BotState {
    /// Fresh state whose snapshots live under `state_dir`
    pub fn new(state_dir: &Path) -> Self {
        Self {
            roster: Arc::new(CrewRoster::new()),
            directives: Arc::new(DirectiveStore::new()),
            crew_snapshot: SnapshotFile::new(state_dir.join(INGAME_CREW_FILE), INGAME_CREW_VERSION),
            directives_snapshot: SnapshotFile::new(
                state_dir.join(DIRECTIVES_FILE),
                DIRECTIVES_VERSION,
            ),
        }
    }

    /// Restore every snapshot that exists. A snapshot that fails to load is
    /// reported and left on disk; the rest still load. Returns the number restored.
    pub fn restore(&self) -> usize {
        let mut restored = 0;
        match self.roster.load_state(&self.crew_snapshot) {
            Ok(found) => restored += usize::from(found),
            Err(e) => error!(
                "❌ Could not restore {}: {e}",
                self.crew_snapshot.path().display()
            ),
        }
        match self.directives.load_state(&self.directives_snapshot) {
            Ok(found) => restored += usize::from(found),
            Err(e) => error!(
                "❌ Could not restore {}: {e}",
                self.directives_snapshot.path().display()
            ),
        }
        restored
    }

    /// Write every snapshot. Returns the names of the files written.
    pub fn save(&self) -> Result<Vec<&'static str>, SnapshotError> {
        self.roster.save_state(&self.crew_snapshot)?;
        self.directives.save_state(&self.directives_snapshot)?;
        info!("💾 State written to {}", self.state_dir_display());
        Ok(vec![INGAME_CREW_FILE, DIRECTIVES_FILE])
    }

    fn state_dir_display(&self) -> String {
        self.crew_snapshot
            .path()
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}
