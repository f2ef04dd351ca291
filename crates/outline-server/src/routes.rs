//! Router and request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use outline_pipeline::{TransportImages, codec};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::startup::{StartupStatus, panic_message};

/// Multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

/// `error` text of the catch-all 404 body.
pub const NOT_FOUND_ERROR: &str = "Path not found by Flask routing";

/// Shared, immutable application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Outcome of the startup self-check.
    pub startup: Arc<StartupStatus>,
    /// Attach tracebacks to internal error responses.
    pub debug: bool,
}

impl AppState {
    /// Create state from a probe outcome.
    #[must_use]
    pub fn new(startup: StartupStatus, debug: bool) -> Self {
        Self {
            startup: Arc::new(startup),
            debug,
        }
    }
}

/// Build the application router.
///
/// Every route answers unsupported methods with the same 404 body as
/// unknown paths.
pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health).fallback(not_found))
        .route("/api/health", get(health).fallback(not_found))
        .route(
            "/process",
            post(process_image).get(health).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An uploaded file pulled out of the multipart body.
struct Upload {
    filename: String,
    bytes: Bytes,
}

/// POST /process - run the outline pipeline on an uploaded image.
///
/// # Request
/// - multipart field `image`: the file to process
///
/// # Response
/// - `original`, `edges`, `contours`: PNG data URIs
///
/// # Errors
/// - 400: missing field, empty file, or undecodable image
/// - 413: body over the configured limit
/// - 500: pipeline unavailable, processing failure, or worker panic
pub async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TransportImages>, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::NoImage);
    };
    let upload = read_upload(&mut multipart).await?;
    debug!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "upload received"
    );

    if let StartupStatus::Unavailable { reason } = state.startup.as_ref() {
        return Err(ApiError::Unavailable(reason.clone()));
    }

    let debug_mode = state.debug;
    let job = tokio::task::spawn_blocking(move || run_pipeline(&upload.bytes, debug_mode));
    match job.await {
        Ok(result) => result.map(Json),
        Err(join_err) if join_err.is_panic() => {
            let payload = join_err.into_panic();
            Err(ApiError::panicked(&panic_message(&*payload), debug_mode))
        }
        Err(join_err) => Err(ApiError::internal(&join_err, debug_mode)),
    }
}

/// Find the first `image` field that carries a file.
///
/// Fields without a filename are form values, not files, and are
/// skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(invalid_upload)?;
        if filename.is_empty() || bytes.is_empty() {
            return Err(ApiError::NoSelectedFile);
        }
        return Ok(Upload { filename, bytes });
    }
    Err(ApiError::NoImage)
}

#[allow(clippy::needless_pass_by_value)]
fn invalid_upload(err: MultipartError) -> ApiError {
    ApiError::InvalidUpload {
        status: err.status(),
        message: err.body_text(),
    }
}

/// Decode, process, and encode on the blocking pool.
fn run_pipeline(bytes: &[u8], debug_mode: bool) -> Result<TransportImages, ApiError> {
    let image = codec::decode(bytes).map_err(ApiError::InvalidImage)?;
    let result = outline_pipeline::process(&image).map_err(|e| ApiError::internal(&e, debug_mode))?;

    let summary = &result.diagnostics.summary;
    debug!(
        width = summary.image_width,
        height = summary.image_height,
        edge_pixels = summary.edge_pixel_count,
        contours = summary.contour_count,
        total_ms = result.diagnostics.total_duration.as_secs_f64() * 1000.0,
        "image processed"
    );

    TransportImages::encode(&result).map_err(|e| ApiError::internal(&e, debug_mode))
}

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// `"ok"` or `"error"`.
    pub status: &'static str,
    /// Human-readable detail.
    pub message: String,
}

/// GET /, /api/health, /process - report whether the pipeline loaded.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match state.startup.as_ref() {
        StartupStatus::Ready => (
            StatusCode::OK,
            Json(HealthBody {
                status: "ok",
                message: "Image processing pipeline loaded".to_owned(),
            }),
        ),
        StartupStatus::Unavailable { reason } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthBody {
                status: "error",
                message: format!("Import failed: {reason}"),
            }),
        ),
    }
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let url = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map_or_else(|| uri.to_string(), |host| format!("http://{host}{uri}"));
    debug!(%method, path = uri.path(), "no route");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": NOT_FOUND_ERROR,
            "received_path": uri.path(),
            "method": method.as_str(),
            "url": url,
        })),
    )
}
