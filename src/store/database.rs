use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyConnection, AnyPool, Transaction};

use crate::config::{Backend, DatabaseSettings};
use crate::health::{ComponentHealth, HealthCheckable, HealthStatus};

use super::errors::StoreError;
use super::schema;

// ============================================================================
// Database Handle - owned connection pool
// ============================================================================
//
// Created once at startup, handed to the order service, closed at shutdown.
// Cloning is cheap; all clones share the same pool.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    backend: Backend,
}

const INITIAL_CONNECT_DELAY: Duration = Duration::from_millis(200);
const MAX_CONNECT_DELAY: Duration = Duration::from_secs(5);

impl Database {
    /// Open the pool, retrying with exponential backoff.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();

        let mut attempt = 0;
        let mut delay = INITIAL_CONNECT_DELAY;

        loop {
            attempt += 1;

            let result = AnyPoolOptions::new()
                .max_connections(settings.max_connections)
                .acquire_timeout(settings.acquire_timeout)
                .connect(&settings.url)
                .await;

            match result {
                Ok(pool) => {
                    tracing::info!(
                        backend = settings.backend.as_str(),
                        attempt = attempt,
                        max_connections = settings.max_connections,
                        "✅ Connected to database"
                    );
                    return Ok(Self {
                        pool,
                        backend: settings.backend,
                    });
                }
                Err(e) if attempt >= settings.connect_attempts => {
                    tracing::error!(
                        attempt = attempt,
                        error = %e,
                        "Giving up connecting to database"
                    );
                    return Err(StoreError::from_sqlx("connect", e));
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt,
                        error = %e,
                        delay_ms = delay.as_millis(),
                        "Database connection failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_CONNECT_DELAY);
                }
            }
        }
    }

    /// Single-connection in-memory SQLite database with the schema applied.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        sqlx::any::install_default_drivers();

        // Every SQLite memory connection is its own database, so pin one.
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");

        let db = Self {
            pool,
            backend: Backend::Sqlite,
        };
        db.ensure_schema().await.expect("schema");
        db
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        schema::ensure_schema(&self.pool, self.backend).await
    }

    #[cfg(test)]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Any>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| StoreError::from_sqlx("acquire", e))
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Any>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::from_sqlx("begin", e))
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.acquire().await?;
        let conn: &mut AnyConnection = &mut conn;
        sqlx::query("SELECT 1")
            .execute(conn)
            .await
            .map_err(|e| StoreError::from_sqlx("ping", e))?;
        Ok(())
    }

    pub async fn close(&self) {
        tracing::info!("Closing database pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl HealthCheckable for Database {
    async fn check_health(&self) -> ComponentHealth {
        let started = Instant::now();
        let status = match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                HealthStatus::Unhealthy(e.to_string())
            }
        };
        ComponentHealth::new(self.component_name(), status).with_latency(started.elapsed())
    }

    fn component_name(&self) -> &str {
        "database"
    }
}
