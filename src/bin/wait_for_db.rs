//! Administrative command: block until the configured database accepts
//! connections. Exits 0 when ready, 1 on a non-retryable error.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use accounts_api::config::Config;
use accounts_api::readiness::{wait_for_db, SqliteProbe, TokioDelay};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let probe = SqliteProbe::new(config.database_url);

    match wait_for_db(&probe, &TokioDelay, config.db_wait_interval).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already logged by wait_for_db.
        Err(_) => ExitCode::FAILURE,
    }
}
