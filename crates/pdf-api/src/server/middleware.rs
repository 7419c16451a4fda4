//! Axum middleware layers applied to the router.
//!
//! Includes CORS, panic recovery and the request timeout response.

use std::any::Any;

use axum::http::{header, HeaderValue, Method};
use axum::response::Response;
use axum::BoxError;
use common::ServiceError;
use tower::timeout::error::Elapsed;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tracing::{error, warn};

use super::handlers::error_response;
use crate::config::Config;

/// CORS layer for the configured origins. `*` anywhere in the list allows any
/// origin.
pub fn cors_layer(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let origins = cfg.cors_origins();
    if origins.contains(&"*") {
        return base.allow_origin(AnyOrigin);
    }
    let allowed: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Response for a panic caught by `CatchPanicLayer`. The panic payload is
/// logged and never sent to the caller.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };
    error!(panic = %detail, "handler panicked");
    error_response(&ServiceError::Internal(detail), false)
}

/// Response for an error raised by the timeout layer.
///
/// Work already handed to the blocking pool is not interrupted; its result is
/// discarded when it finishes.
pub async fn timeout_response(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        warn!("request timed out");
        let err = ServiceError::Processing {
            message: "the request did not complete in time".into(),
            details: None,
        };
        return error_response(&err, false);
    }
    error!(error = %err, "middleware error");
    error_response(&ServiceError::Internal(err.to_string()), false)
}
