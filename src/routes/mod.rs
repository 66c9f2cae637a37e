pub mod health;
pub mod weather;

use axum::routing::{get, post};
use axum::Router;

use weather::AppState;

/// All API routes. Documentation and middleware layers are added in `main`.
pub(crate) fn router(state: AppState) -> Router {
    // Health check only needs the pool; weather routes use the full AppState.
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(state.pool.clone());

    let weather_routes = Router::new()
        .route("/sync-weather", post(weather::sync_weather))
        .route("/week", get(weather::get_week))
        .route("/locations", get(weather::get_locations))
        .route("/weather", get(weather::get_weather))
        .with_state(state);

    Router::new().merge(health_routes).merge(weather_routes)
}
