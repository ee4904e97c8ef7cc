//! Database pool setup
//!
//! Connection acquisition at startup is retried with exponential backoff.
//! This is the only retry in the system: once a mutating transaction has
//! begun, failures are surfaced to the caller, never replayed.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(16);

/// Create the PostgreSQL connection pool, retrying a bounded number of times.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let attempts = config.connect_attempts.max(1);
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=attempts {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    attempt,
                    attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "database connection failed, retrying: {}",
                    err
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("connect loop returns on the final attempt")
}
