//! Render pipeline: filter chain, trend fetch and view projection.
//!
//! Each render walks the drill-down levels top to bottom and re-issues every
//! query still relevant to the current selection. Nothing is cached.
//!
//! # Failure policy
//!
//! - Warehouse unreachable or timed out: the whole render fails, so the page
//!   shows an error instead of a blank dashboard.
//! - A level's options query fails: that level carries the error and every
//!   level below it is disabled with no options.
//! - A row with unusable coordinates is left off the map and reported in
//!   `geo_errors`; charts and tables keep the row.
//! - A selection that is no longer offered is cleared along with its
//!   descendants, so stale options are never shown.

use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::filter::{DATE_FORMAT, FilterLevel, FilterSelection};
use crate::model::{DashboardView, FilterLevelView, NationalView, TrendView};
use crate::projector;
use crate::query;
use crate::warehouse::Warehouse;

/// Options for one drill-down level given the ancestors in `selection`.
///
/// Returns an empty list when an ancestor is unset.
pub async fn level_options(
    warehouse: &Warehouse,
    level: FilterLevel,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> Result<Vec<String>, DashboardError> {
    match level {
        FilterLevel::State => warehouse.fetch_options(&query::options_for_state()).await,
        FilterLevel::City => match selection.state() {
            Some(state) => warehouse.fetch_options(&query::options_for_city(state)).await,
            None => Ok(vec![]),
        },
        FilterLevel::Station => match (selection.state(), selection.city()) {
            (Some(state), Some(city)) => {
                warehouse
                    .fetch_options(&query::options_for_station(state, city))
                    .await
            }
            _ => Ok(vec![]),
        },
        FilterLevel::Date => {
            let Some(location) = selection.location() else {
                return Ok(vec![]);
            };
            let date_query = if config.global_date_options {
                query::options_for_date_global()
            } else {
                query::options_for_date(&location)
            };
            let dates = warehouse.fetch_dates(&date_query).await?;
            Ok(dates
                .iter()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .collect())
        }
    }
}

/// Fetch and project the trend views for a complete selection.
///
/// Returns `Ok(None)` until state, city, station and date are all selected.
pub async fn trend_view(
    warehouse: &Warehouse,
    selection: &FilterSelection,
) -> Result<Option<TrendView>, DashboardError> {
    let (Some(location), Some(date)) = (selection.location(), selection.date()) else {
        return Ok(None);
    };

    let rows = warehouse
        .fetch_trend(&query::trend_query(&location, date))
        .await?;

    info!(
        station = %location.station,
        date = %date,
        rows = rows.len(),
        "Trend fetched"
    );

    let view = projector::project_trend(location, date, &rows);
    for error in &view.geo_errors {
        warn!(row = error.row, column = error.column, "{}", error.message);
    }
    Ok(Some(view))
}

/// Render every selector and, once the chain is complete, the trend views.
pub async fn render(
    warehouse: &Warehouse,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> Result<DashboardView, DashboardError> {
    let mut selection = selection.clone();
    let mut filters = Vec::with_capacity(FilterLevel::ALL.len());
    let mut blocked = false;

    for level in FilterLevel::ALL {
        if blocked {
            filters.push(disabled(level));
            continue;
        }

        match level_options(warehouse, level, &selection, config).await {
            Ok(options) => {
                let mut selected = selection.value(level);
                if let Some(value) = &selected {
                    if !options.contains(value) {
                        info!(
                            level = level.name(),
                            value = %value,
                            "Selection no longer offered; clearing"
                        );
                        selection.truncate_to(level);
                        selected = None;
                    }
                }

                blocked = selected.is_none();
                filters.push(FilterLevelView {
                    level,
                    enabled: true,
                    options,
                    selected,
                    error: None,
                });
            }
            Err(e) if e.is_unavailable() => {
                warn!(level = level.name(), error = %e, "Warehouse unavailable");
                return Err(e);
            }
            Err(e) => {
                warn!(level = level.name(), error = %e, "Options query failed");
                selection.truncate_to(level);
                blocked = true;
                filters.push(FilterLevelView {
                    level,
                    enabled: false,
                    options: vec![],
                    selected: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let (trend, trend_error) = match trend_view(warehouse, &selection).await {
        Ok(trend) => (trend, None),
        Err(e) if e.is_unavailable() => return Err(e),
        Err(e) => {
            warn!(error = %e, "Trend render failed");
            (None, Some(e.to_string()))
        }
    };

    Ok(DashboardView {
        filters,
        next_level: selection.next_level(),
        trend,
        trend_error,
    })
}

/// Render the all-India map from the latest reporting date.
pub async fn render_national(warehouse: &Warehouse) -> Result<NationalView, DashboardError> {
    let rows = warehouse
        .fetch_national_snapshot(&query::national_snapshot_query())
        .await?;
    let view = projector::national_snapshot(&rows);
    for error in &view.geo_errors {
        warn!(row = error.row, column = error.column, "{}", error.message);
    }
    info!(
        stations = rows.len(),
        points = view.points.len(),
        "National snapshot fetched"
    );
    Ok(view)
}

fn disabled(level: FilterLevel) -> FilterLevelView {
    FilterLevelView {
        level,
        enabled: false,
        options: vec![],
        selected: None,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::AqiBand;
    use crate::warehouse::testing::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    const DAY_AQI: [i64; 24] = [
        42, 55, 120, 410, 160, 230, 300, 95, 88, 76, 64, 50, 51, 100, 101, 150, 151, 200, 201,
        250, 251, 400, 180, 137,
    ];

    async fn delhi_warehouse() -> Warehouse {
        let warehouse = memory_warehouse().await;
        insert_location(&warehouse, 1, "Delhi", "Delhi", "Anand Vihar", 28.6469655, 77.3152).await;
        insert_location(&warehouse, 2, "Delhi", "Delhi", "ITO", 28.6284, 77.2410).await;
        insert_location(&warehouse, 3, "Maharashtra", "Mumbai", "Bandra", 19.0544, 72.8405).await;
        for (hour, aqi) in DAY_AQI.iter().enumerate() {
            insert_reading(&warehouse, 1, "2024-01-01", hour as u32, *aqi).await;
        }
        insert_reading(&warehouse, 2, "2024-01-01", 23, 190).await;
        insert_reading(&warehouse, 3, "2024-01-01", 22, 70).await;
        warehouse
    }

    fn full_selection() -> FilterSelection {
        let mut selection = FilterSelection::new();
        selection.set_state("Delhi");
        selection.set_city("Delhi").unwrap();
        selection.set_station("Anand Vihar").unwrap();
        selection
            .set_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        selection
    }

    #[tokio::test]
    async fn test_initial_render_offers_only_states() {
        let warehouse = delhi_warehouse().await;
        let view = render(&warehouse, &FilterSelection::new(), &DashboardConfig::default())
            .await
            .unwrap();

        assert_eq!(view.filters.len(), 4);
        assert!(view.filters[0].enabled);
        assert_eq!(view.filters[0].options, vec!["Delhi", "Maharashtra"]);
        assert!(view.filters[1..].iter().all(|f| !f.enabled));
        assert_eq!(view.next_level, Some(FilterLevel::State));
        assert!(view.trend.is_none());
    }

    #[tokio::test]
    async fn test_full_chain_renders_trend() {
        let warehouse = delhi_warehouse().await;
        let view = render(&warehouse, &full_selection(), &DashboardConfig::default())
            .await
            .unwrap();

        assert!(view.filters.iter().all(|f| f.enabled));
        assert_eq!(view.filters[2].options, vec!["ITO", "Anand Vihar"]);
        assert_eq!(view.filters[3].selected.as_deref(), Some("2024-01-01"));

        let trend = view.trend.unwrap();
        assert_eq!(trend.aqi_series.len(), 24);
        let hours: Vec<u32> = trend.aqi_series.iter().map(|p| p.hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<u32>>());

        let bands: Vec<AqiBand> = trend.geo_series.iter().take(4).map(|p| p.band).collect();
        assert_eq!(
            bands,
            vec![
                AqiBand::Good,
                AqiBand::Satisfactory,
                AqiBand::Moderate,
                AqiBand::Severe
            ]
        );
        assert_eq!(trend.current_aqi, Some(DAY_AQI[23]));
        assert_eq!(trend.latest.unwrap().hour, 23);
        assert_eq!(trend.pollutant_table_descending[0].hour, 23);
    }

    #[tokio::test]
    async fn test_day_without_data_renders_empty_views() {
        let warehouse = delhi_warehouse().await;
        let mut selection = full_selection();
        selection
            .set_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .unwrap();

        let trend = trend_view(&warehouse, &selection).await.unwrap().unwrap();

        assert!(trend.aqi_series.is_empty());
        assert!(trend.pollutant_table.is_empty());
        assert!(trend.geo_series.is_empty());
        assert!(trend.current_aqi.is_none());
    }

    #[tokio::test]
    async fn test_stale_selection_is_cleared() {
        let warehouse = delhi_warehouse().await;
        let mut selection = FilterSelection::new();
        selection.set_state("Delhi");
        selection.set_city("Atlantis").unwrap();
        selection.set_station("Nowhere").unwrap();

        let view = render(&warehouse, &selection, &DashboardConfig::default())
            .await
            .unwrap();

        assert!(view.filters[1].enabled);
        assert!(view.filters[1].selected.is_none());
        assert!(!view.filters[2].enabled);
        assert!(view.filters[2].options.is_empty());
        assert!(!view.filters[3].enabled);
        assert_eq!(view.next_level, Some(FilterLevel::City));
        assert!(view.trend.is_none());
    }

    #[tokio::test]
    async fn test_failed_level_disables_descendants() {
        let warehouse = delhi_warehouse().await;
        // Breaks the date options query; location_dim still answers.
        sqlx::query("DROP TABLE aqi_fact")
            .execute(warehouse.pool())
            .await
            .unwrap();

        let view = render(&warehouse, &full_selection(), &DashboardConfig::default())
            .await
            .unwrap();

        assert!(view.filters[..3].iter().all(|f| f.enabled && f.error.is_none()));
        let date = &view.filters[3];
        assert!(!date.enabled);
        assert!(date.options.is_empty());
        assert!(date.selected.is_none());
        assert!(date.error.as_deref().unwrap().contains("date_options"));
        assert_eq!(view.next_level, Some(FilterLevel::Date));
        assert!(view.trend.is_none());
    }

    #[tokio::test]
    async fn test_failed_city_level_disables_station_and_date() {
        let warehouse = delhi_warehouse().await;
        sqlx::query("ALTER TABLE location_dim RENAME COLUMN city TO town")
            .execute(warehouse.pool())
            .await
            .unwrap();

        let view = render(&warehouse, &full_selection(), &DashboardConfig::default())
            .await
            .unwrap();

        assert!(view.filters[0].enabled);
        assert!(!view.filters[1].enabled);
        assert!(view.filters[1].error.is_some());
        for level in &view.filters[2..] {
            assert!(!level.enabled);
            assert!(level.options.is_empty());
            assert!(level.error.is_none());
        }
        assert!(view.trend.is_none());
    }

    #[tokio::test]
    async fn test_timed_out_query_fails_render() {
        let warehouse = delhi_warehouse()
            .await
            .with_query_timeout(Duration::from_millis(50));
        let _held = warehouse.pool().acquire().await.unwrap();

        let err = render(&warehouse, &full_selection(), &DashboardConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::Timeout { .. }));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_null_coordinate_keeps_charts_and_other_stations() {
        let warehouse = delhi_warehouse().await;
        sqlx::query("UPDATE location_dim SET latitude = NULL WHERE station = 'ITO'")
            .execute(warehouse.pool())
            .await
            .unwrap();

        let national = render_national(&warehouse).await.unwrap();
        assert_eq!(national.points.len(), 2);
        assert_eq!(national.geo_errors.len(), 1);
        assert_eq!(national.geo_errors[0].value, None);

        let mut selection = full_selection();
        selection.set_station("ITO").unwrap();
        selection
            .set_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        let view = render(&warehouse, &selection, &DashboardConfig::default())
            .await
            .unwrap();

        assert!(view.trend_error.is_none());
        let trend = view.trend.unwrap();
        assert_eq!(trend.aqi_series.len(), 1);
        assert_eq!(trend.pollutant_table.len(), 1);
        assert_eq!(trend.current_aqi, Some(190));
        assert!(trend.geo_series.is_empty());
        assert_eq!(trend.geo_errors[0].column, "latitude");
    }

    #[tokio::test]
    async fn test_global_date_options_flag() {
        let warehouse = delhi_warehouse().await;
        insert_reading(&warehouse, 3, "2024-01-05", 1, 80).await;

        let mut selection = full_selection();
        selection.truncate_to(FilterLevel::Date);

        let scoped = level_options(
            &warehouse,
            FilterLevel::Date,
            &selection,
            &DashboardConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(scoped, vec!["2024-01-01"]);

        let config = DashboardConfig {
            global_date_options: true,
            ..DashboardConfig::default()
        };
        let global = level_options(&warehouse, FilterLevel::Date, &selection, &config)
            .await
            .unwrap();
        assert_eq!(global, vec!["2024-01-05", "2024-01-01"]);
    }

    #[tokio::test]
    async fn test_unreachable_warehouse_fails_render() {
        let warehouse = delhi_warehouse().await;
        warehouse.close().await;
        let err = render(&warehouse, &full_selection(), &DashboardConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_national_snapshot_one_point_per_station() {
        let warehouse = delhi_warehouse().await;
        let view = render_national(&warehouse).await.unwrap();
        // Anand Vihar, ITO and Bandra all report on 2024-01-01.
        assert_eq!(view.points.len(), 3);
    }
}
