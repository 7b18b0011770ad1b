//! Per-view slices of trend and snapshot rows.
//!
//! All functions borrow their input and preserve its order; the trend query
//! returns rows hour-ascending and charts rely on that.

use chrono::NaiveDate;

use crate::aqi::AqiBand;
use crate::model::{
    AqiPoint, GeoError, GeoPoint, LocationKey, NationalSnapshotRow, NationalView, PollutantRow,
    TrendRow, TrendView,
};

/// (hour, aqi) pairs in input order.
pub fn aqi_series(rows: &[TrendRow]) -> Vec<AqiPoint> {
    rows.iter()
        .map(|row| AqiPoint {
            hour: row.hour,
            aqi: row.aqi,
        })
        .collect()
}

/// Pollutant columns in input order.
pub fn pollutant_table(rows: &[TrendRow]) -> Vec<PollutantRow> {
    rows.iter().map(pollutant_row).collect()
}

/// Pollutant columns, latest hour first, for the tabular display.
pub fn pollutant_table_descending(rows: &[TrendRow]) -> Vec<PollutantRow> {
    rows.iter().rev().map(pollutant_row).collect()
}

fn pollutant_row(row: &TrendRow) -> PollutantRow {
    PollutantRow {
        hour: row.hour,
        pm25: row.pm25_avg,
        pm10: row.pm10_avg,
        so2: row.so2_avg,
        co: row.co_avg,
        no2: row.no2_avg,
        nh3: row.nh3_avg,
        o3: row.o3_avg,
        prominent_pollutant: row.prominent_pollutant.clone(),
    }
}

/// Map points plus the rows that could not be placed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoSeries {
    pub points: Vec<GeoPoint>,
    pub errors: Vec<GeoError>,
}

/// Map points for a station-day, colored by AQI band.
///
/// A row with a NULL or non-numeric coordinate is reported in `errors` and
/// left off the map; every other row still gets its point.
pub fn geo_series(rows: &[TrendRow]) -> GeoSeries {
    collect_points(
        rows.iter()
            .map(|row| (row.latitude.as_deref(), row.longitude.as_deref(), row.aqi)),
    )
}

/// The last reading of the day.
///
/// This is the last row in query order, not an independent `max(hour)`, so
/// duplicate hours resolve to the later row.
pub fn latest_reading(rows: &[TrendRow]) -> Option<&TrendRow> {
    rows.last()
}

/// Map points for the all-India snapshot.
pub fn national_snapshot(rows: &[NationalSnapshotRow]) -> NationalView {
    let GeoSeries { points, errors } = collect_points(
        rows.iter()
            .map(|row| (row.latitude.as_deref(), row.longitude.as_deref(), row.aqi)),
    );
    NationalView {
        points,
        geo_errors: errors,
    }
}

/// Build every view of a station-day.
pub fn project_trend(location: LocationKey, date: NaiveDate, rows: &[TrendRow]) -> TrendView {
    let latest = latest_reading(rows).cloned();
    let current_aqi = latest.as_ref().and_then(|row| row.aqi);
    let GeoSeries { points, errors } = geo_series(rows);

    TrendView {
        location,
        date,
        aqi_series: aqi_series(rows),
        pollutant_table: pollutant_table(rows),
        pollutant_table_descending: pollutant_table_descending(rows),
        geo_series: points,
        geo_errors: errors,
        current_aqi,
        current_band: AqiBand::classify_reading(current_aqi),
        latest,
    }
}

fn collect_points<'a>(
    rows: impl Iterator<Item = (Option<&'a str>, Option<&'a str>, Option<i64>)>,
) -> GeoSeries {
    let mut series = GeoSeries::default();
    for (i, (latitude, longitude, aqi)) in rows.enumerate() {
        let lat = coerce_coordinate(i, "latitude", latitude);
        let lon = coerce_coordinate(i, "longitude", longitude);
        match (lat, lon) {
            (Ok(lat), Ok(lon)) => {
                let band = AqiBand::classify_reading(aqi);
                series.points.push(GeoPoint {
                    lat,
                    lon,
                    aqi,
                    band,
                    color: band.color(),
                });
            }
            (lat, lon) => series
                .errors
                .extend([lat.err(), lon.err()].into_iter().flatten()),
        }
    }
    series
}

fn coerce_coordinate(
    row: usize,
    column: &'static str,
    raw: Option<&str>,
) -> Result<f64, GeoError> {
    let Some(raw) = raw else {
        return Err(GeoError {
            row,
            column,
            value: None,
            message: format!("row {}: column '{}' is NULL", row, column),
        });
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeoError {
            row,
            column,
            value: Some(raw.to_string()),
            message: format!("row {}: column '{}' value {:?} is not a number", row, column, raw),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hour: u32, aqi: i64) -> TrendRow {
        TrendRow {
            hour,
            latitude: Some("28.6469655".to_string()),
            longitude: Some("77.3152".to_string()),
            pm25_avg: Some(aqi as f64 * 0.5),
            pm10_avg: Some(aqi as f64),
            so2_avg: Some(10.0),
            no2_avg: Some(20.0),
            nh3_avg: Some(5.0),
            co_avg: Some(1.2),
            o3_avg: Some(30.0),
            prominent_pollutant: Some("PM10".to_string()),
            aqi: Some(aqi),
        }
    }

    fn location() -> LocationKey {
        LocationKey {
            state: "Delhi".to_string(),
            city: "Delhi".to_string(),
            station: "Anand Vihar".to_string(),
        }
    }

    #[test]
    fn test_aqi_series_preserves_order() {
        let rows = vec![row(0, 42), row(1, 55), row(2, 120)];
        let series = aqi_series(&rows);
        let hours: Vec<u32> = series.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![0, 1, 2]);
        assert_eq!(series[2].aqi, Some(120));
    }

    #[test]
    fn test_descending_table_is_reversed() {
        let rows = vec![row(0, 42), row(1, 55), row(2, 120)];
        let table = pollutant_table_descending(&rows);
        assert_eq!(table[0].hour, 2);
        assert_eq!(table[2].hour, 0);
        assert_eq!(table[0].pm10, Some(120.0));
    }

    #[test]
    fn test_geo_series_colors_by_band() {
        let rows = vec![row(0, 42), row(1, 55), row(2, 120), row(3, 410)];
        let GeoSeries { points, errors } = geo_series(&rows);
        assert!(errors.is_empty());
        let bands: Vec<AqiBand> = points.iter().map(|p| p.band).collect();
        assert_eq!(
            bands,
            vec![
                AqiBand::Good,
                AqiBand::Satisfactory,
                AqiBand::Moderate,
                AqiBand::Severe
            ]
        );
        assert_eq!(points[0].color, "#00B150");
        assert!((points[0].lat - 28.6469655).abs() < 1e-9);
        assert!((points[0].lon - 77.3152).abs() < 1e-9);
    }

    #[test]
    fn test_bad_coordinate_skips_only_its_row() {
        let mut rows = vec![row(0, 42), row(1, 55), row(2, 120)];
        rows[1].longitude = Some("n/a".to_string());

        let series = geo_series(&rows);

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[1].aqi, Some(120));
        assert_eq!(
            series.errors,
            vec![GeoError {
                row: 1,
                column: "longitude",
                value: Some("n/a".to_string()),
                message: "row 1: column 'longitude' value \"n/a\" is not a number".to_string(),
            }]
        );
    }

    #[test]
    fn test_null_coordinate_is_reported_as_null() {
        let mut rows = vec![row(0, 42)];
        rows[0].latitude = None;

        let series = geo_series(&rows);

        assert!(series.points.is_empty());
        assert_eq!(series.errors.len(), 1);
        assert_eq!(series.errors[0].column, "latitude");
        assert_eq!(series.errors[0].value, None);
        assert!(series.errors[0].message.contains("is NULL"));
    }

    #[test]
    fn test_bad_coordinates_keep_charts() {
        let mut rows = vec![row(0, 42), row(1, 55)];
        for r in rows.iter_mut() {
            r.latitude = None;
        }
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let view = project_trend(location(), date, &rows);

        assert_eq!(view.aqi_series.len(), 2);
        assert_eq!(view.pollutant_table.len(), 2);
        assert_eq!(view.current_aqi, Some(55));
        assert!(view.geo_series.is_empty());
        assert_eq!(view.geo_errors.len(), 2);
    }

    #[test]
    fn test_integer_coordinates_coerce() {
        let mut rows = vec![row(0, 42)];
        rows[0].latitude = Some("28".to_string());
        let series = geo_series(&rows);
        assert_eq!(series.points[0].lat, 28.0);
    }

    #[test]
    fn test_latest_reading_is_last_row_with_duplicate_hours() {
        let rows = vec![row(22, 100), row(23, 150), row(23, 160)];
        let latest = latest_reading(&rows).unwrap();
        assert_eq!(latest.hour, 23);
        assert_eq!(latest.aqi, Some(160));
    }

    #[test]
    fn test_projection_does_not_mutate_input() {
        let rows = vec![row(0, 42), row(1, 55), row(2, 120)];
        let before = rows.clone();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let first = project_trend(location(), date, &rows);
        let second = project_trend(location(), date, &rows);

        assert_eq!(rows, before);
        assert_eq!(first.aqi_series, second.aqi_series);
        assert_eq!(first.pollutant_table, second.pollutant_table);
        assert_eq!(first.geo_series, second.geo_series);
    }

    #[test]
    fn test_empty_rows_project_to_empty_views() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let view = project_trend(location(), date, &[]);
        assert!(view.aqi_series.is_empty());
        assert!(view.pollutant_table.is_empty());
        assert!(view.geo_series.is_empty());
        assert!(view.geo_errors.is_empty());
        assert!(view.latest.is_none());
        assert_eq!(view.current_band, AqiBand::Unknown);
    }

    #[test]
    fn test_national_snapshot_one_point_per_row() {
        let rows = vec![
            NationalSnapshotRow {
                latitude: Some("28.6".to_string()),
                longitude: Some("77.3".to_string()),
                aqi: Some(310),
            },
            NationalSnapshotRow {
                latitude: Some("19.07".to_string()),
                longitude: Some("72.87".to_string()),
                aqi: None,
            },
        ];
        let view = national_snapshot(&rows);
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.points[0].band, AqiBand::Severe);
        assert_eq!(view.points[1].band, AqiBand::Unknown);
    }

    #[test]
    fn test_national_snapshot_keeps_stations_with_coordinates() {
        let rows = vec![
            NationalSnapshotRow {
                latitude: Some("28.6".to_string()),
                longitude: Some("77.3".to_string()),
                aqi: Some(310),
            },
            NationalSnapshotRow {
                latitude: None,
                longitude: Some("77.24".to_string()),
                aqi: Some(190),
            },
        ];
        let view = national_snapshot(&rows);
        assert_eq!(view.points.len(), 1);
        assert_eq!(view.points[0].aqi, Some(310));
        assert_eq!(view.geo_errors.len(), 1);
        assert_eq!(view.geo_errors[0].row, 1);
    }
}
