//! HTTP API handlers for the AQI dashboard.
//!
//! Every endpoint takes the current drill-down selection as query
//! parameters (`state`, `city`, `station`, `date`) and re-runs the queries
//! it depends on. Responses are the render inputs for the page served at `/`.
//!
//! - **GET /api/options/:level**: options for `states`, `cities`, `stations` or `dates`
//! - **GET /api/trend**: hourly AQI and pollutant views for a station-day
//! - **GET /api/dashboard**: every selector plus the trend views
//! - **GET /api/national**: latest AQI of every station on the most recent date
//! - **GET /api/legend**: the AQI color scale
//!
//! Errors are JSON bodies `{ "error": kind, "message": ... }`: 400 for bad
//! selections, 503 when the warehouse is unreachable, 500 otherwise.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use tracing::{info, instrument, warn};

use crate::aqi::{LegendEntry, legend};
use crate::config::DashboardConfig;
use crate::dashboard::{level_options, render, render_national, trend_view};
use crate::error::{DashboardError, FilterError};
use crate::filter::{FilterLevel, FilterSelection};
use crate::model::{
    DashboardView, ErrorBody, NationalView, OptionsResponse, SelectionQuery, TrendView,
};
use crate::warehouse::Warehouse;

/// The dashboard page.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Warehouse,
    pub config: DashboardConfig,
}

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the router with every dashboard route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/options/:level", get(get_options))
        .route("/api/trend", get(get_trend))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/national", get(get_national))
        .route("/api/legend", get(get_legend))
        .with_state(state)
}

fn dashboard_error(err: DashboardError) -> ApiError {
    let status = if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorBody {
            error: err.kind(),
            message: err.to_string(),
        }),
    )
}

fn filter_error(err: FilterError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "invalid_selection",
            message: err.to_string(),
        }),
    )
}

fn parse_selection(query: &SelectionQuery) -> Result<FilterSelection, ApiError> {
    FilterSelection::from_query(query).map_err(|e| {
        warn!(error = %e, "Rejected selection");
        filter_error(e)
    })
}

/// GET / - The dashboard page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /api/options/:level - Options for one selector.
///
/// `level` is one of `states`, `cities`, `stations`, `dates`. Every level
/// above it must be selected.
///
/// # Response
///
/// ```json
/// { "level": "city", "options": ["New Delhi", "Delhi"] }
/// ```
#[instrument(skip(state))]
pub async fn get_options(
    State(state): State<AppState>,
    Path(level): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> ApiResult<OptionsResponse> {
    let level = match level.as_str() {
        "states" | "state" => FilterLevel::State,
        "cities" | "city" => FilterLevel::City,
        "stations" | "station" => FilterLevel::Station,
        "dates" | "date" => FilterLevel::Date,
        _ => {
            warn!(level = %level, "Unknown filter level");
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: "unknown_level",
                    message: format!("unknown filter level '{}'", level),
                }),
            ));
        }
    };

    let selection = parse_selection(&query)?;
    selection.require_ancestors(level).map_err(filter_error)?;

    match level_options(&state.warehouse, level, &selection, &state.config).await {
        Ok(options) => {
            info!(
                level = level.name(),
                option_count = options.len(),
                "Options queried"
            );
            Ok(Json(OptionsResponse { level, options }))
        }
        Err(e) => {
            warn!(level = level.name(), error = %e, "Failed to fetch options");
            Err(dashboard_error(e))
        }
    }
}

/// GET /api/trend - Hourly views for the selected station-day.
///
/// Requires `state`, `city`, `station` and `date`. A day without readings
/// returns empty series, not an error.
#[instrument(skip(state))]
pub async fn get_trend(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> ApiResult<TrendView> {
    let selection = parse_selection(&query)?;
    selection
        .require_ancestors(FilterLevel::Date)
        .map_err(filter_error)?;

    match trend_view(&state.warehouse, &selection).await {
        Ok(Some(view)) => Ok(Json(view)),
        Ok(None) => Err(filter_error(FilterError::AncestorUnset {
            level: "trend",
            missing: "date",
        })),
        Err(e) => {
            warn!(error = %e, "Failed to fetch trend");
            Err(dashboard_error(e))
        }
    }
}

/// GET /api/dashboard - Every selector plus, once complete, the trend views.
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> ApiResult<DashboardView> {
    let selection = parse_selection(&query)?;

    match render(&state.warehouse, &selection, &state.config).await {
        Ok(view) => {
            info!(
                next_level = ?view.next_level,
                has_trend = view.trend.is_some(),
                "Dashboard rendered"
            );
            Ok(Json(view))
        }
        Err(e) => {
            warn!(error = %e, "Failed to render dashboard");
            Err(dashboard_error(e))
        }
    }
}

/// GET /api/national - Latest AQI of every station on the most recent date.
#[instrument(skip(state))]
pub async fn get_national(State(state): State<AppState>) -> ApiResult<NationalView> {
    render_national(&state.warehouse).await.map(Json).map_err(|e| {
        warn!(error = %e, "Failed to render national snapshot");
        dashboard_error(e)
    })
}

/// GET /api/legend - The AQI color scale.
pub async fn get_legend() -> Json<Vec<LegendEntry>> {
    Json(legend())
}
