//! Core authgate library (config, logging, session store, cleanup, identity backend).

pub mod backend;
pub mod cleanup;
pub mod config;
pub mod logging;
pub mod store;
