//! AQI Dashboard server.
//!
//! # Endpoints
//!
//! - `GET /` - The dashboard page
//! - `GET /api/options/:level` - Selector options
//! - `GET /api/trend` - Hourly views for a station-day
//! - `GET /api/dashboard` - Full render for the current selection
//! - `GET /api/national` - All-India latest AQI map
//! - `GET /api/legend` - AQI color scale
//! - `GET /health` - Health check

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aqi_dashboard::api::{AppState, router};
use aqi_dashboard::config::DashboardConfig;
use aqi_dashboard::warehouse::Warehouse;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("aqi_dashboard=info".parse()?))
        .init();

    let config = DashboardConfig::from_env();

    // The database URL may carry credentials; log only the port.
    info!(
        port = config.port,
        query_timeout_secs = config.query_timeout.as_secs(),
        global_date_options = config.global_date_options,
        "Starting AQI dashboard"
    );

    let warehouse = Warehouse::connect(&config.database_url, config.query_timeout).await?;
    info!("Warehouse connected");

    let port = config.port;
    let app = router(AppState { warehouse, config }).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "AQI dashboard is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
