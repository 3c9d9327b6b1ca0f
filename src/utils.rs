//! Utility functions for the sauce bot
//!
//! - `utils::url` for URL parsing and log-safe obfuscation
//! - `utils::text` for reply text helpers

pub mod text;
pub mod url;
