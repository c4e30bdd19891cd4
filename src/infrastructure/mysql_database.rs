use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions};
use sqlx::{ConnectOptions, Connection, QueryBuilder};
use std::str::FromStr;
use tracing::instrument;

use crate::config::{Backend, DatabaseConfig};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{
    to_row_count, with_connection, ClimateStore, ConnectionSnapshot, ConnectionStats, RowId,
};
use crate::models::ClimateRecord;

/// MySQL implementation of the climate store
pub struct MySqlStore {
    options: MySqlConnectOptions,
    stats: ConnectionStats,
}

impl MySqlStore {
    pub fn new(options: MySqlConnectOptions) -> Self {
        Self {
            options,
            stats: ConnectionStats::new(),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        let options = match &config.url {
            Some(url) => MySqlConnectOptions::from_str(url).map_err(|e| {
                AppError::ConfigurationError(format!("Invalid MySQL connection URL: {}", e))
            })?,
            None => MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.database),
        };
        Ok(Self::new(options))
    }
}

#[async_trait]
impl ClimateStore for MySqlStore {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    #[instrument(skip(self, record), fields(location = %record.location))]
    async fn insert_record(&self, record: &ClimateRecord) -> AppResult<RowId> {
        let record = record.clone();
        with_connection(&self.stats, self.options.connect(), |conn| {
            Box::pin(async move {
                let mut tx = conn.begin().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to begin transaction: {}", e))
                })?;
                let result = sqlx::query(
                    r#"
                    INSERT INTO ClimateData (location, record_date, temperature, precipitation, humidity)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&record.location)
                .bind(record.record_date)
                .bind(record.temperature)
                .bind(record.precipitation)
                .bind(record.humidity)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to insert record: {}", e)))?;
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to commit insert: {}", e))
                })?;
                Ok(result.last_insert_id())
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn count_hot_days(&self, threshold: f64) -> AppResult<u64> {
        let count = with_connection(&self.stats, self.options.connect(), |conn| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ClimateData WHERE temperature > ?")
                    .bind(threshold)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(format!("Failed to count hot days: {}", e))
                    })
            })
        })
        .await?;
        to_row_count(count)
    }

    #[instrument(skip(self, locations))]
    async fn raise_humidity(&self, locations: &[String], step: f64, cap: f64) -> AppResult<u64> {
        if locations.is_empty() {
            return Ok(0);
        }
        let locations = locations.to_vec();
        with_connection(&self.stats, self.options.connect(), |conn| {
            Box::pin(async move {
                let mut qb = QueryBuilder::<MySql>::new(
                    "UPDATE ClimateData SET humidity = LEAST(humidity + ",
                );
                qb.push_bind(step);
                qb.push(", ");
                qb.push_bind(cap);
                qb.push(") WHERE location IN (");
                let mut separated = qb.separated(", ");
                for location in locations {
                    separated.push_bind(location);
                }
                separated.push_unseparated(")");

                let mut tx = conn.begin().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to begin transaction: {}", e))
                })?;
                let result = qb.build().execute(&mut *tx).await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to update humidity: {}", e))
                })?;
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to commit update: {}", e))
                })?;
                Ok(result.rows_affected())
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn count_rows(&self) -> AppResult<u64> {
        let count = with_connection(&self.stats, self.options.connect(), |conn| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ClimateData")
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| AppError::DatabaseError(format!("Failed to count rows: {}", e)))
            })
        })
        .await?;
        to_row_count(count)
    }

    fn connection_stats(&self) -> ConnectionSnapshot {
        self.stats.snapshot()
    }
}
