//! Axum router construction.

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// CORS is the outermost layer so every response, including 404s, timeouts
/// and recovered panics, carries the access-control headers. It also answers
/// every `OPTIONS` request itself with an empty 200 before routing.
pub fn build(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();
    let timeout = state.config.request_timeout();
    let cors = middleware::cors_layer(&state.config);

    Router::new()
        .route(
            "/",
            get(handlers::health)
                .post(handlers::remove_password)
                .fallback(handlers::method_invalid),
        )
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_invalid),
        )
        .route(
            "/remove-pdf-password",
            post(handlers::remove_password).fallback(handlers::method_invalid),
        )
        .route(
            "/pdf-to-image",
            post(handlers::pdf_to_image).fallback(handlers::method_invalid),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(middleware::timeout_response))
                .timeout(timeout),
        )
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(cors)
        .with_state(state)
}
