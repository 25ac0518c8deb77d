pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use narrative_core::sharing::NarrativeEngine;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Construct the Axum router for the share request API.
///
/// Routes live under `/v1/` and the router carries `Arc<NarrativeEngine>`
/// as shared state. `cors_origins` lists the browser origins allowed to call
/// the API; `*` allows any and an empty list allows none.
pub fn router(engine: Arc<NarrativeEngine>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/v1/share-requests", post(handlers::request_share_handler))
        .route("/v1/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(engine)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
