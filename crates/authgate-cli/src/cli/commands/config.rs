//! Config command handlers.

use anyhow::{Context, Result};
use authgate_core::config::{self, ANON_KEY_ENV, BACKEND_URL_ENV};

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    println!(
        "Set url and anon_key under [backend], or export {BACKEND_URL_ENV} and {ANON_KEY_ENV}."
    );
    println!("Sessions are stored in {}", config::paths::session_store_path().display());
    Ok(())
}
