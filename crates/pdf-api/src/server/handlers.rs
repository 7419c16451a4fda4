//! Axum request handlers for all service endpoints.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{ErrorResponse, HealthResponse, RenderResponse, UnlockResponse};
use common::ServiceError;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::state::AppState;
use crate::config::BYTES_PER_MB;
use crate::document::{self, render::Rendered, Operation};

const HEALTH_MESSAGE: &str = "PDF password removal service is running";

const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>PDF service</title></head>
<body>
<h1>PDF service</h1>
<p>Status: <strong>ok</strong></p>
<ul>
<li><code>POST /remove-pdf-password</code> &mdash; remove a PDF password</li>
<li><code>POST /pdf-to-image</code> &mdash; render PDF pages to PNG</li>
</ul>
</body>
</html>
"#;

/// `POST /remove-pdf-password` (and `POST /`): strip the password from a PDF.
///
/// Body: `{"pdf_base64" | "pdfBase64": string, "password": string}`.
/// Success: `200 {"message", "pdf_base64"}`.
pub async fn remove_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let expose = state.config.expose_error_details;

    let outcome = unlock_outcome(state, &headers, body)
        .instrument(info_span!("remove_password", %request_id))
        .await;
    respond(outcome, started, request_id, expose)
}

async fn unlock_outcome(
    state: AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UnlockResponse, ServiceError> {
    let body = read_body(body, headers, &state)?;
    let envelope = document::normalize(
        &body,
        Operation::RemovePassword,
        state.config.max_document_bytes(),
    )?;
    log_received(envelope.document.len());

    let password = envelope
        .password
        .ok_or(ServiceError::ParameterMissing("password"))?;
    let decryptor = state.decryptor.clone();
    let bytes = envelope.document;
    let decrypted = run_blocking(move || {
        document::unlock::remove_password(decryptor.as_ref(), &bytes, &password)
    })
    .await?;

    Ok(UnlockResponse {
        message: "password removed successfully".into(),
        pdf_base64: STANDARD.encode(decrypted),
    })
}

/// `POST /pdf-to-image`: rasterise every page to PNG.
///
/// Body: `{"pdf_base64" | "pdfBase64": string, "password"?: string}`.
/// Success: `200 {"type": "image", "image_base64"}` for one page, or
/// `200 {"type": "zip", "zip_base64", "page_count"}` for several.
pub async fn pdf_to_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let expose = state.config.expose_error_details;

    let outcome = render_outcome(state, &headers, body)
        .instrument(info_span!("pdf_to_image", %request_id))
        .await;
    respond(outcome, started, request_id, expose)
}

async fn render_outcome(
    state: AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<RenderResponse, ServiceError> {
    let body = read_body(body, headers, &state)?;
    let envelope = document::normalize(&body, Operation::Render, state.config.max_document_bytes())?;
    log_received(envelope.document.len());

    let rasterizer = state.rasterizer.clone();
    let rendered = run_blocking(move || {
        document::render::render(rasterizer.as_ref(), &envelope.document, envelope.password)
    })
    .await?;

    Ok(match rendered {
        Rendered::Image(png) => RenderResponse::Image {
            message: "document rendered to a single image".into(),
            image_base64: STANDARD.encode(png),
        },
        Rendered::Archive { zip, pages } => RenderResponse::Zip {
            message: format!("document with {pages} pages rendered to a zip of images"),
            zip_base64: STANDARD.encode(zip),
            page_count: pages,
        },
    })
}

/// `GET /` and `GET /health`: liveness check.
///
/// Returns an HTML status page when the caller accepts `text/html`, JSON otherwise.
pub async fn health(headers: HeaderMap) -> Response {
    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        return Html(STATUS_PAGE).into_response();
    }
    let body = HealthResponse {
        status: "ok".into(),
        message: HEALTH_MESSAGE.into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Any method a route does not serve.
pub async fn method_invalid(method: Method) -> Response {
    warn!(%method, "method not supported");
    error_response(&ServiceError::MethodInvalid(method.to_string()), false)
}

/// Catch-all 404 handler.
pub async fn not_found() -> Response {
    error_response(&ServiceError::NotFound, false)
}

/// Render `err` as its status code and JSON [`ErrorResponse`] body.
pub fn error_response(err: &ServiceError, expose_details: bool) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from_error(err, expose_details))).into_response()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn an operation outcome into a response, logging how it ended.
fn respond<T: Serialize>(
    outcome: Result<T, ServiceError>,
    started: Instant,
    request_id: Uuid,
    expose_details: bool,
) -> Response {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(body) => {
            info!(%request_id, elapsed_ms, "request completed");
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            let code = err.code().as_str();
            if err.http_status() >= 500 {
                error!(
                    %request_id,
                    elapsed_ms,
                    code,
                    error = %err,
                    details = err.details().unwrap_or_default(),
                    "request failed"
                );
            } else {
                warn!(%request_id, elapsed_ms, code, error = %err, "request rejected");
            }
            error_response(&err, expose_details)
        }
    }
}

/// Unwrap the buffered body, mapping an over-limit body to `SIZE_EXCEEDED`.
fn read_body(
    body: Result<Bytes, BytesRejection>,
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Bytes, ServiceError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::RequestTooLarge {
                body_mb: declared_length(headers).map(|len| len as f64 / BYTES_PER_MB),
                limit_mb: state.config.max_pdf_size_mb,
            }
        } else {
            ServiceError::InvalidFormat(rejection.body_text())
        }
    })
}

/// `Content-Length` as sent by the client, if it parses.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn log_received(len: usize) {
    info!(size_mb = len as f64 / BYTES_PER_MB, "document received");
}

/// Run a document operation on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("document task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health))
            .with_state(AppState::default())
    }

    #[tokio::test]
    async fn health_returns_ok_json() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn health_returns_html_when_accepted() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn error_response_uses_designated_status() {
        let resp = error_response(&ServiceError::WrongPassword, false);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "WRONG_PASSWORD");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn error_response_exposes_details_when_enabled() {
        let err = ServiceError::processing("could not render document", "page 2: bad stream");
        let resp = error_response(&err, true);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.details.as_deref(), Some("page 2: bad stream"));
    }

    #[tokio::test]
    async fn blocking_panic_is_internal_error() {
        let err = run_blocking::<(), _>(|| panic!("renderer blew up"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), common::ErrorCode::InternalError);
    }
}
