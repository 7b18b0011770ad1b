//! Read-only access to the AQI star schema.
//!
//! The warehouse is populated upstream; this layer only creates the schema
//! when it is missing and runs the queries built by [`crate::query`].
//! Every call is bounded by the configured query timeout.

use std::time::Duration;

use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, warn};

use crate::error::DashboardError;
use crate::filter::DATE_FORMAT;
use crate::model::{NationalSnapshotRow, TrendRow};
use crate::query::BoundQuery;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Warehouse {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl Warehouse {
    /// Connect to the warehouse and make sure the schema exists.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:aqi.db" or "sqlite::memory:")
    /// * `query_timeout` - Upper bound on each query
    pub async fn connect(database_url: &str, query_timeout: Duration) -> Result<Self, DashboardError> {
        // Each in-memory connection is its own database, so keep exactly one alive.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options
            .acquire_timeout(query_timeout)
            .connect(database_url)
            .await
            .map_err(DashboardError::Connection)?;

        let warehouse = Self {
            pool,
            query_timeout,
        };
        warehouse.initialize_schema().await?;

        Ok(warehouse)
    }

    /// Create the star schema if it doesn't exist.
    async fn initialize_schema(&self) -> Result<(), DashboardError> {
        const STATEMENTS: [&str; 5] = [
            r#"
            CREATE TABLE IF NOT EXISTS location_dim (
                location_pk INTEGER PRIMARY KEY,
                state TEXT NOT NULL,
                city TEXT NOT NULL,
                station TEXT NOT NULL,
                latitude NUMERIC,
                longitude NUMERIC
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS date_dim (
                date_pk INTEGER PRIMARY KEY,
                measurement_time TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS aqi_fact (
                date_fk INTEGER NOT NULL REFERENCES date_dim(date_pk),
                location_fk INTEGER NOT NULL REFERENCES location_dim(location_pk),
                pm25_avg REAL,
                pm10_avg REAL,
                so2_avg REAL,
                no2_avg REAL,
                nh3_avg REAL,
                co_avg REAL,
                o3_avg REAL,
                prominent_pollutant TEXT,
                aqi INTEGER,
                PRIMARY KEY (date_fk, location_fk)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_location_dim_path
            ON location_dim(state, city, station)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_date_dim_time
            ON date_dim(measurement_time)
            "#,
        ];

        for statement in STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DashboardError::from_sqlx("initialize_schema", e))?;
        }

        Ok(())
    }

    /// Replace the per-query timeout.
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// The underlying pool, for loading fixtures.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection. Later queries fail as connection errors.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a query and return its rows in warehouse order.
    async fn fetch_rows(&self, query: &BoundQuery) -> Result<Vec<SqliteRow>, DashboardError> {
        let mut statement = sqlx::query(query.sql);
        for param in &query.params {
            statement = statement.bind(param.as_str());
        }

        let rows = match tokio::time::timeout(self.query_timeout, statement.fetch_all(&self.pool))
            .await
        {
            Ok(result) => result.map_err(|e| DashboardError::from_sqlx(query.name, e))?,
            Err(_) => {
                warn!(query = query.name, "Warehouse query timed out");
                return Err(DashboardError::Timeout {
                    query: query.name,
                    seconds: self.query_timeout.as_secs(),
                });
            }
        };

        debug!(query = query.name, rows = rows.len(), "Warehouse query finished");
        Ok(rows)
    }

    /// Fetch a single-column options list (states, cities or stations).
    pub async fn fetch_options(&self, query: &BoundQuery) -> Result<Vec<String>, DashboardError> {
        self.fetch_rows(query)
            .await?
            .iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map_err(|e| DashboardError::from_sqlx(query.name, e))
            })
            .collect()
    }

    /// Fetch a calendar-date options list.
    pub async fn fetch_dates(&self, query: &BoundQuery) -> Result<Vec<NaiveDate>, DashboardError> {
        self.fetch_options(query)
            .await?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    DashboardError::TypeCoercion {
                        row: i,
                        column: "measurement_date",
                        value: raw.clone(),
                    }
                })
            })
            .collect()
    }

    /// Fetch hourly readings for the trend views.
    pub async fn fetch_trend(&self, query: &BoundQuery) -> Result<Vec<TrendRow>, DashboardError> {
        self.fetch_rows(query)
            .await?
            .iter()
            .map(|row| trend_row(row).map_err(|e| DashboardError::from_sqlx(query.name, e)))
            .collect()
    }

    /// Fetch the all-India snapshot.
    pub async fn fetch_national_snapshot(
        &self,
        query: &BoundQuery,
    ) -> Result<Vec<NationalSnapshotRow>, DashboardError> {
        self.fetch_rows(query)
            .await?
            .iter()
            .map(|row| {
                Ok(NationalSnapshotRow {
                    latitude: row.try_get("latitude")?,
                    longitude: row.try_get("longitude")?,
                    aqi: row.try_get("aqi")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| DashboardError::from_sqlx(query.name, e))
    }
}

fn trend_row(row: &SqliteRow) -> Result<TrendRow, sqlx::Error> {
    Ok(TrendRow {
        hour: row.try_get("hour")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        pm25_avg: row.try_get("pm25_avg")?,
        pm10_avg: row.try_get("pm10_avg")?,
        so2_avg: row.try_get("so2_avg")?,
        no2_avg: row.try_get("no2_avg")?,
        nh3_avg: row.try_get("nh3_avg")?,
        co_avg: row.try_get("co_avg")?,
        o3_avg: row.try_get("o3_avg")?,
        prominent_pollutant: row.try_get("prominent_pollutant")?,
        aqi: row.try_get("aqi")?,
    })
}
