//! recruit_chat: conversational job-seeking assistant.
//!
//! This library crate re-exports modules so integration tests
//! (under `tests/`) can access them.

pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session;
pub mod store;
pub mod tools;
pub mod utils;

/// Return the application home directory.
///
/// Resolution order:
/// 1. `RECRUIT_CHAT_HOME` environment variable
/// 2. `$HOME/.recruit_chat`
pub fn app_home() -> std::path::PathBuf {
    if let Ok(p) = std::env::var("RECRUIT_CHAT_HOME") {
        std::path::PathBuf::from(p)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".recruit_chat")
    }
}
