//! API errors and their HTTP mapping.
//!
//! Every failure leaves the handler as an [`ApiError`]. Client mistakes
//! map to 4xx and log at `info`; everything else maps to 500 and logs
//! at `error`. The JSON body is always `{"error": ...}`, plus a
//! `traceback` for internal errors when the server runs in debug mode.

use std::error::Error as StdError;
use std::fmt::Write as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use outline_pipeline::CodecError;
use serde::Serialize;
use tracing::{error, info};

/// Errors returned by the processing endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No multipart field named `image` carrying a file.
    #[error("No image provided")]
    NoImage,

    /// The `image` field had an empty filename or no bytes.
    #[error("No selected file")]
    NoSelectedFile,

    /// The multipart stream itself was malformed or too large.
    #[error("Invalid upload: {message}")]
    InvalidUpload {
        /// Status chosen by the multipart parser.
        status: StatusCode,
        /// Parser description of the problem.
        message: String,
    },

    /// The uploaded bytes are not a decodable image.
    #[error("Invalid image")]
    InvalidImage(#[source] CodecError),

    /// The startup self-check failed; nothing is processed.
    #[error("Image pipeline unavailable: {0}")]
    Unavailable(String),

    /// Processing or encoding failed after a valid image was decoded.
    #[error("{message}")]
    Internal {
        /// Description of the failure.
        message: String,
        /// Source chain or panic payload, only populated in debug mode.
        traceback: Option<String>,
    },
}

impl ApiError {
    /// Wrap an internal error, keeping its source chain when `debug` is set.
    #[must_use]
    pub fn internal(err: &(dyn StdError + 'static), debug: bool) -> Self {
        Self::Internal {
            message: err.to_string(),
            traceback: debug.then(|| source_chain(err)),
        }
    }

    /// Wrap a panic from the processing worker.
    #[must_use]
    pub fn panicked(payload: &str, debug: bool) -> Self {
        Self::Internal {
            message: "image processing worker panicked".to_owned(),
            traceback: debug.then(|| format!("panic: {payload}")),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoImage | Self::NoSelectedFile | Self::InvalidImage(_) => StatusCode::BAD_REQUEST,
            Self::InvalidUpload { status, .. } => *status,
            Self::Unavailable(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Diagnostic detail for internal errors in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            info!(status = status.as_u16(), error = %self, "request rejected");
        }

        let error = self.to_string();
        let traceback = match self {
            Self::Internal { traceback, .. } => traceback,
            _ => None,
        };
        (status, Json(ErrorBody { error, traceback })).into_response()
    }
}

/// `err` followed by each of its sources, one per line.
fn source_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = format!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {cause}");
        source = cause.source();
    }
    out
}
