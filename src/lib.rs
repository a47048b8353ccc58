// Public API for integration tests and the CLI binary

pub mod config;
pub mod error;
pub mod handlers;
pub mod prefs;
pub mod protocol;
pub mod reveal;
pub mod roles;
pub mod state;
pub mod timer;
pub mod types;
pub mod words;
