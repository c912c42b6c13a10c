//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod links;
pub mod presets;
pub mod transform;
pub mod url;
