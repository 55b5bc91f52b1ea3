//! # Features Module
//!
//! Crew tracking, runtime directives and the state they persist.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Crew roster and directives with versioned snapshots
//! - 1.0.0: Initial feature layout

pub mod crew;
pub mod directives;
pub mod state;

pub use crew::{CrewCounts, CrewMember, CrewRoster, IngameCrewState};
pub use directives::{DirectiveError, DirectiveStore, DirectiveValue};
pub use state::BotState;
