use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use schulaufgabe_core::config::ServerConfig;

use crate::handlers;
use crate::metrics::track_requests;
use crate::state::AppState;

/// Create the application router with all routes and middleware.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/api/upload", post(handlers::upload))
        .route("/api/generate-latex", post(handlers::generate_latex))
        .route("/api/compile-pdf", post(handlers::compile_pdf))
        .route("/api/render-pdf", get(handlers::render_pdf))
        .route("/metrics", get(handlers::metrics))
        .route("/api/metrics", get(handlers::metrics))
        .route_layer(from_fn_with_state(state.clone(), track_requests))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Allow-listed origins with credentials. Methods and headers mirror the
/// preflight request, since wildcards are not permitted alongside credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("[Bootstrap] Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
