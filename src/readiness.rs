//! Startup gate that blocks until the database accepts connections.
//!
//! `wait_for_db` keeps calling a [`StoreProbe`] until it reports ready. Only
//! [`ProbeError::Unavailable`] is retried, after one [`Delay`] per failed
//! attempt. A [`ProbeError::Fatal`] is returned straight to the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, SqliteConnection};

use crate::db::connect_options;

// Primary SQLite result codes that mean "try again later".
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CANTOPEN: i32 = 14;

#[derive(Debug)]
pub enum ProbeError {
    /// The store is not reachable yet.
    Unavailable(String),
    Fatal(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Unavailable(msg) => write!(f, "database unavailable: {msg}"),
            ProbeError::Fatal(msg) => write!(f, "fatal database error: {msg}"),
        }
    }
}

impl std::error::Error for ProbeError {}

#[async_trait]
pub trait StoreProbe: Send + Sync {
    async fn probe(&self) -> Result<(), ProbeError>;
}

#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Block until `probe` succeeds, sleeping `interval` between failed attempts.
pub async fn wait_for_db(
    probe: &dyn StoreProbe,
    delay: &dyn Delay,
    interval: Duration,
) -> Result<(), ProbeError> {
    tracing::info!("Waiting for database...");

    let mut attempt: u64 = 1;
    loop {
        match probe.probe().await {
            Ok(()) => {
                tracing::info!(attempts = attempt, "Database available");
                return Ok(());
            }
            Err(ProbeError::Unavailable(msg)) => {
                tracing::warn!(
                    attempt,
                    error = %msg,
                    retry_in_ms = interval.as_millis() as u64,
                    "Database unavailable, retrying"
                );
                delay.wait(interval).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Database probe failed, giving up");
                return Err(e);
            }
        }
    }
}

/// Map a sqlx error onto the retryable / fatal split.
pub fn classify(err: sqlx::Error) -> ProbeError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ProbeError::Unavailable(err.to_string()),
        sqlx::Error::Database(db) => {
            let primary = db
                .code()
                .and_then(|c| c.parse::<i32>().ok())
                .map(|c| c & 0xff);
            match primary {
                Some(SQLITE_BUSY | SQLITE_LOCKED | SQLITE_CANTOPEN) => {
                    ProbeError::Unavailable(err.to_string())
                }
                _ => ProbeError::Fatal(err.to_string()),
            }
        }
        _ => ProbeError::Fatal(err.to_string()),
    }
}

/// Opens one connection with the service's connect options and runs `SELECT 1`.
pub struct SqliteProbe {
    database_url: String,
}

impl SqliteProbe {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl StoreProbe for SqliteProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        let options = connect_options(&self.database_url).map_err(classify)?;
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(classify)?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(classify)?;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "probe: failed to close connection cleanly");
        }
        Ok(())
    }
}
