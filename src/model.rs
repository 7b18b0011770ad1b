//! Data models for the AQI dashboard.
//!
//! Rows mirror the star schema read by [`crate::query`]: one fact row per
//! station-hour, joined to the `location_dim` and `date_dim` dimensions.
//! View types are what the presentation layer consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aqi::AqiBand;

/// Identifies a monitoring station.
///
/// `city` is only meaningful within `state`, and `station` within
/// `(state, city)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub state: String,
    pub city: String,
    pub station: String,
}

/// One hourly reading for a station-day, as returned by the trend query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    /// Hour of the measurement time, 0-23.
    pub hour: u32,

    /// Latitude as the warehouse renders its decimal column; `None` for NULL.
    pub latitude: Option<String>,

    /// Longitude as the warehouse renders its decimal column; `None` for NULL.
    pub longitude: Option<String>,

    pub pm25_avg: Option<f64>,
    pub pm10_avg: Option<f64>,
    pub so2_avg: Option<f64>,
    pub no2_avg: Option<f64>,
    pub nh3_avg: Option<f64>,
    pub co_avg: Option<f64>,
    pub o3_avg: Option<f64>,
    pub prominent_pollutant: Option<String>,
    pub aqi: Option<i64>,
}

/// A station's reading on the most recent reporting date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalSnapshotRow {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub aqi: Option<i64>,
}

/// Query parameters carrying the current drill-down selection.
///
/// Absent, empty, and placeholder values all mean "unset"; see
/// [`crate::filter::FilterSelection::from_query`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionQuery {
    pub state: Option<String>,
    pub city: Option<String>,
    pub station: Option<String>,
    pub date: Option<String>,
}

/// Single-metric chart input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiPoint {
    pub hour: u32,
    pub aqi: Option<i64>,
}

/// Multi-pollutant chart and table input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantRow {
    pub hour: u32,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub nh3: Option<f64>,
    pub o3: Option<f64>,
    pub prominent_pollutant: Option<String>,
}

/// Map layer input: a point weighted and colored by AQI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub aqi: Option<i64>,
    pub band: AqiBand,
    pub color: &'static str,
}

/// A row whose coordinates could not be placed on a map.
///
/// Only that row's point is missing; every other view of the row is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoError {
    pub row: usize,
    pub column: &'static str,

    /// The raw value, `None` when the warehouse returned NULL.
    pub value: Option<String>,
    pub message: String,
}

/// Everything the presentation layer needs for one station-day.
#[derive(Debug, Clone, Serialize)]
pub struct TrendView {
    pub location: LocationKey,
    pub date: NaiveDate,

    /// (hour, aqi) pairs, hour-ascending.
    pub aqi_series: Vec<AqiPoint>,

    /// Pollutant rows, hour-ascending, for the bar and line charts.
    pub pollutant_table: Vec<PollutantRow>,

    /// Pollutant rows, hour-descending, for the tabular display.
    pub pollutant_table_descending: Vec<PollutantRow>,

    pub geo_series: Vec<GeoPoint>,

    /// Rows left off the map because of unusable coordinates.
    pub geo_errors: Vec<GeoError>,

    /// AQI of the latest reading, shown as the "current AQI" scalar.
    pub current_aqi: Option<i64>,
    pub current_band: AqiBand,
    pub latest: Option<TrendRow>,
}

/// The all-India map.
#[derive(Debug, Clone, Serialize)]
pub struct NationalView {
    pub points: Vec<GeoPoint>,
    pub geo_errors: Vec<GeoError>,
}

/// One drill-down selector as it should be rendered.
#[derive(Debug, Clone, Serialize)]
pub struct FilterLevelView {
    pub level: crate::filter::FilterLevel,
    pub enabled: bool,
    pub options: Vec<String>,
    pub selected: Option<String>,

    /// Set when the options query for this level failed.
    pub error: Option<String>,
}

/// Full dashboard render for the current selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters: Vec<FilterLevelView>,

    /// The first level still to be chosen after stale selections are cleared.
    pub next_level: Option<crate::filter::FilterLevel>,
    pub trend: Option<TrendView>,
    pub trend_error: Option<String>,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// An options list for a single selector.
#[derive(Debug, Clone, Serialize)]
pub struct OptionsResponse {
    pub level: crate::filter::FilterLevel,
    pub options: Vec<String>,
}
