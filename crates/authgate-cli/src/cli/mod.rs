//! CLI entry and dispatch.

use anyhow::{Context, Result};
use authgate_core::backend::SignOutScope;
use authgate_core::config::{self, Config};
use authgate_core::logging::{self, WorkerGuard};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(version = "0.1")]
#[command(about = "Sign-in and consent gate for a Supabase-style identity backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password (password is read from stdin)
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
    },

    /// Send a password reset email
    ResetPassword {
        /// Account email
        #[arg(short, long)]
        email: String,
    },

    /// Remove stale session artifacts from the local session store
    Cleanup,

    /// Sign out and forget the local session
    Logout {
        /// Only revoke this client's session instead of every session
        #[arg(long)]
        local: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email } => {
            let (config, _log_guard) = load_config()?;
            commands::auth::login(&config, &email).await
        }
        Commands::ResetPassword { email } => {
            let (config, _log_guard) = load_config()?;
            commands::auth::reset_password(&config, &email).await
        }
        Commands::Cleanup => {
            let (config, _log_guard) = load_config()?;
            commands::cleanup::run(&config).await
        }
        Commands::Logout { local } => {
            let (config, _log_guard) = load_config()?;
            let scope = if local {
                SignOutScope::Local
            } else {
                SignOutScope::Global
            };
            commands::auth::logout(&config, scope).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

/// Loads the config and starts file logging. Keep the guard for the whole command.
fn load_config() -> Result<(Config, WorkerGuard)> {
    let config = Config::load().context("load config")?;
    let guard = logging::init(&config.logging, &config::paths::logs_dir())?;
    Ok((config, guard))
}
