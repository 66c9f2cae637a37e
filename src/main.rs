// Weather Ingestor API v0.1
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod locations;
mod routes;
mod services;
mod timestamps;

use config::{AppConfig, LogFormat};
use locations::LocationTable;
use routes::weather::AppState;
use services::open_meteo::OpenMeteoClient;

/// OpenAPI document for the Weather Ingestor API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Ingestor API",
        version = "0.1.0",
        description = "Ingests hourly temperature forecasts from Open-Meteo into SQLite, \
            keyed by location and hour, and reports daytime (06:00-18:00) averages \
            for the coming week.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Forecast ingestion and temperature reports"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::sync_weather,
        routes::weather::get_week,
        routes::weather::get_locations,
        routes::weather::get_weather,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::SyncResponse,
            routes::weather::WeekResponse,
            routes::weather::LocationsResponse,
            routes::weather::WeatherRow,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weather_ingestor_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    let locations = LocationTable::load(config.locations_file.as_deref())
        .expect("Failed to load locations table");
    if locations.is_empty() {
        tracing::warn!("Locations table is empty; every sync will use coordinate names");
    } else {
        tracing::info!("Loaded {} known locations", locations.len());
    }

    // Set up database connection pool
    let pool = db::connect(&config.db_path)
        .await
        .expect("Failed to open database");

    db::queries::ensure_schema(&pool)
        .await
        .expect("Failed to create weather_data table");

    tracing::info!("Database ready at {}", config.db_path);

    let forecast_client = OpenMeteoClient::new(&config.open_meteo_url, config.forecast_timeout)
        .expect("Failed to build HTTP client");

    let app_state = AppState {
        pool,
        forecast_client,
        locations: Arc::new(locations),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = routes::router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
