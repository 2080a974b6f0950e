//! Local session cleanup.

use anyhow::Result;
use authgate_core::cleanup::cleanup_session_artifacts;
use authgate_core::config::Config;
use authgate_core::store::FileSessionStore;

pub async fn run(config: &Config) -> Result<()> {
    let store = FileSessionStore::open_default();
    let report = cleanup_session_artifacts(&store, &config.session.cleanup_markers).await;

    if let Some(failure) = report.failure {
        anyhow::bail!("Session cleanup failed: {failure}");
    }

    if report.removed.is_empty() {
        println!("No session artifacts found.");
    } else {
        println!("Removed {} session artifact(s):", report.removed.len());
        for key in &report.removed {
            println!("  {key}");
        }
    }
    Ok(())
}
