//! Database service for usage-service.
//!
//! PostgreSQL implementation of the cycle and usage store ports. Queries are
//! written out explicitly: closed-interval containment, inclusive windows and
//! the history ordering are all visible in the SQL below.

use crate::models::{Cycle, DailyUsageRecord, SubscriberKey};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{CycleStore, UsageStore};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "usage-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one created lazily or shared with a test harness.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl CycleStore for Database {
    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    async fn find_active_cycle(
        &self,
        subscriber: &SubscriberKey,
        instant: i64,
    ) -> Result<Option<Cycle>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_active_cycle"])
            .start_timer();

        // Two rows are enough to notice overlapping cycles.
        let cycles = sqlx::query_as::<_, Cycle>(
            r#"
            SELECT cycle_id, user_id, mdn, start_date, end_date
            FROM cycles
            WHERE user_id = $1 AND mdn = $2 AND start_date <= $3 AND end_date >= $3
            LIMIT 2
            "#,
        )
        .bind(&subscriber.user_id)
        .bind(&subscriber.device_number)
        .bind(instant)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find active cycle: {}", e)))?;

        timer.observe_duration();

        if cycles.len() > 1 {
            warn!(
                instant = instant,
                "Overlapping cycles contain the reference instant"
            );
        }

        Ok(cycles.into_iter().next())
    }

    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    async fn find_all_by_subscriber(
        &self,
        subscriber: &SubscriberKey,
    ) -> Result<Vec<Cycle>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_all_cycles"])
            .start_timer();

        let cycles = sqlx::query_as::<_, Cycle>(
            r#"
            SELECT cycle_id, user_id, mdn, start_date, end_date
            FROM cycles
            WHERE user_id = $1 AND mdn = $2
            ORDER BY start_date DESC
            "#,
        )
        .bind(&subscriber.user_id)
        .bind(&subscriber.device_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list cycles: {}", e)))?;

        timer.observe_duration();

        Ok(cycles)
    }
}

#[async_trait]
impl UsageStore for Database {
    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    async fn find_in_window(
        &self,
        subscriber: &SubscriberKey,
        start_inclusive: i64,
        end_inclusive: i64,
    ) -> Result<Vec<DailyUsageRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_usage_in_window"])
            .start_timer();

        let records = sqlx::query_as::<_, DailyUsageRecord>(
            r#"
            SELECT usage_id, user_id, mdn, usage_date, used_in_mb
            FROM daily_usage
            WHERE user_id = $1 AND mdn = $2 AND usage_date >= $3 AND usage_date <= $4
            "#,
        )
        .bind(&subscriber.user_id)
        .bind(&subscriber.device_number)
        .bind(start_inclusive)
        .bind(end_inclusive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch daily usage: {}", e)))?;

        timer.observe_duration();

        Ok(records)
    }
}
