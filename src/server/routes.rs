//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// CORS policy for the configured browser origins, with credentials allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.options.cors_origins);
    let body_limit = DefaultBodyLimit::max(state.options.max_upload_bytes);

    Router::new()
        // Intake and registry
        .route("/upload", post(handlers::upload_document))
        .route("/classified-documents", get(handlers::list_documents))
        .route("/update-label", post(handlers::update_label))
        .route("/save-to-drive", post(handlers::save_to_drive))
        // Older client paths
        .route("/get_classified_docs", get(handlers::list_documents))
        .route("/update_label", post(handlers::update_label))
        .route("/save_todrive", post(handlers::save_to_drive))
        // Storage authorization
        .route("/authorize", get(handlers::authorize))
        .route("/oauth2callback", get(handlers::oauth_callback))
        .route("/auth/status", get(handlers::auth_status))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
