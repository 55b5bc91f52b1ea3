//! # Crew Feature
//!
//! Permanent and in-game crew tracking used for crew chat levels.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod roster;

pub use roster::{
    CrewCounts, CrewMember, CrewRoster, IngameCrewState, INGAME_CREW_VERSION, UPDATE_CREW_QUERY,
};
