//! CLI command handlers.

pub mod auth;
pub mod cleanup;
pub mod config;
