//! # Directives Feature
//!
//! Runtime configuration switches changeable from chat.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod store;

pub use store::{
    DirectiveChange, DirectiveError, DirectiveStore, DirectiveValue, DIRECTIVES_VERSION,
    PARSER_REPORTS, RELAY_CREW_CHAT, RELAY_MAIN_CHAT,
};
