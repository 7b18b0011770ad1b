//! Read queries against the AQI star schema.
//!
//! Every query is a static SQL template plus bound parameters. Selector
//! values are never spliced into SQL text.
//!
//! # Schema
//!
//! - `aqi_fact`: one row per station-hour, keyed by `date_fk` and `location_fk`
//! - `date_dim`: `date_pk`, `measurement_time`
//! - `location_dim`: `location_pk`, `state`, `city`, `station`, `latitude`, `longitude`

use chrono::NaiveDate;

use crate::filter::DATE_FORMAT;
use crate::model::LocationKey;

/// A static query template with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    /// Stable identity used in logs and error messages.
    pub name: &'static str,
    pub sql: &'static str,
    pub params: Vec<String>,
}

impl BoundQuery {
    fn new(name: &'static str, sql: &'static str, params: Vec<String>) -> Self {
        debug_assert_eq!(
            sql.matches('?').count(),
            params.len(),
            "placeholder count mismatch in {}",
            name
        );
        Self { name, sql, params }
    }
}

const STATE_OPTIONS_SQL: &str = r#"
    SELECT state
    FROM location_dim
    GROUP BY state
    ORDER BY 1
"#;

const CITY_OPTIONS_SQL: &str = r#"
    SELECT city
    FROM location_dim
    WHERE state = ?
    GROUP BY city
    ORDER BY 1 DESC
"#;

const STATION_OPTIONS_SQL: &str = r#"
    SELECT station
    FROM location_dim
    WHERE state = ? AND city = ?
    GROUP BY station
    ORDER BY 1 DESC
"#;

const DATE_OPTIONS_SQL: &str = r#"
    SELECT date(d.measurement_time) AS measurement_date
    FROM aqi_fact f
    JOIN date_dim d ON d.date_pk = f.date_fk
    JOIN location_dim l ON l.location_pk = f.location_fk
    WHERE l.state = ? AND l.city = ? AND l.station = ?
    GROUP BY 1
    ORDER BY 1 DESC
"#;

const GLOBAL_DATE_OPTIONS_SQL: &str = r#"
    SELECT date(measurement_time) AS measurement_date
    FROM date_dim
    GROUP BY 1
    ORDER BY 1 DESC
"#;

const TREND_SQL: &str = r#"
    SELECT
        CAST(strftime('%H', d.measurement_time) AS INTEGER) AS hour,
        CAST(l.latitude AS TEXT) AS latitude,
        CAST(l.longitude AS TEXT) AS longitude,
        f.pm25_avg,
        f.pm10_avg,
        f.so2_avg,
        f.no2_avg,
        f.nh3_avg,
        f.co_avg,
        f.o3_avg,
        f.prominent_pollutant,
        f.aqi
    FROM aqi_fact f
    JOIN date_dim d
        ON d.date_pk = f.date_fk
        AND date(d.measurement_time) = ?
    JOIN location_dim l
        ON l.location_pk = f.location_fk
        AND l.state = ?
        AND l.city = ?
        AND l.station = ?
    ORDER BY d.measurement_time
"#;

// One row per station reporting on the latest date: its last reading that day.
const NATIONAL_SNAPSHOT_SQL: &str = r#"
    WITH latest_day AS (
        SELECT date(MAX(d.measurement_time)) AS day
        FROM aqi_fact f
        JOIN date_dim d ON d.date_pk = f.date_fk
    ),
    ranked AS (
        SELECT
            l.state,
            l.city,
            l.station,
            l.latitude,
            l.longitude,
            f.aqi,
            ROW_NUMBER() OVER (
                PARTITION BY l.location_pk
                ORDER BY d.measurement_time DESC
            ) AS rn
        FROM aqi_fact f
        JOIN date_dim d ON d.date_pk = f.date_fk
        JOIN location_dim l ON l.location_pk = f.location_fk
        WHERE date(d.measurement_time) = (SELECT day FROM latest_day)
    )
    SELECT
        CAST(latitude AS TEXT) AS latitude,
        CAST(longitude AS TEXT) AS longitude,
        aqi
    FROM ranked
    WHERE rn = 1
    ORDER BY state, city, station
"#;

/// Distinct states, ascending.
pub fn options_for_state() -> BoundQuery {
    BoundQuery::new("state_options", STATE_OPTIONS_SQL, vec![])
}

/// Distinct cities of `state`, descending.
pub fn options_for_city(state: &str) -> BoundQuery {
    BoundQuery::new("city_options", CITY_OPTIONS_SQL, vec![state.to_string()])
}

/// Distinct stations of `(state, city)`, descending.
pub fn options_for_station(state: &str, city: &str) -> BoundQuery {
    BoundQuery::new(
        "station_options",
        STATION_OPTIONS_SQL,
        vec![state.to_string(), city.to_string()],
    )
}

/// Distinct calendar dates with readings for `location`, descending.
pub fn options_for_date(location: &LocationKey) -> BoundQuery {
    BoundQuery::new(
        "date_options",
        DATE_OPTIONS_SQL,
        vec![
            location.state.clone(),
            location.city.clone(),
            location.station.clone(),
        ],
    )
}

/// Every calendar date in `date_dim`, descending, regardless of station.
pub fn options_for_date_global() -> BoundQuery {
    BoundQuery::new("date_options_global", GLOBAL_DATE_OPTIONS_SQL, vec![])
}

/// Hourly readings of `location` on `date`, ordered by measurement time.
pub fn trend_query(location: &LocationKey, date: NaiveDate) -> BoundQuery {
    BoundQuery::new(
        "trend",
        TREND_SQL,
        vec![
            date.format(DATE_FORMAT).to_string(),
            location.state.clone(),
            location.city.clone(),
            location.station.clone(),
        ],
    )
}

/// Latest reading of every station reporting on the most recent date.
pub fn national_snapshot_query() -> BoundQuery {
    BoundQuery::new("national_snapshot", NATIONAL_SNAPSHOT_SQL, vec![])
}
