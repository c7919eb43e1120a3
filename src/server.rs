use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::{Error, ErrorKind};
use crate::ingest::{Ingestor, Submission};

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MalformedSubmission => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Duplicate => StatusCode::CONFLICT,
            ErrorKind::Storage | ErrorKind::Io | ErrorKind::Serialization => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

impl From<BytesRejection> for Error {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge(rejection.body_text())
        } else {
            Error::MalformedSubmission(rejection.body_text())
        }
    }
}

/// Busy live chats produce packets well past axum's 2 MiB default.
pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// HTTP front of the ingestion pipeline.
pub struct IngestServer {
    ingestor: Arc<Ingestor>,
    route: String,
    body_limit: Option<usize>,
}

impl IngestServer {
    /// `route` is the full ingestion path, e.g. `/forwardedChats`.
    pub fn new(ingestor: Arc<Ingestor>, route: impl Into<String>) -> Self {
        Self {
            ingestor,
            route: route.into(),
            body_limit: Some(DEFAULT_BODY_LIMIT),
        }
    }

    /// `None` accepts bodies of any size.
    pub fn with_body_limit(mut self, limit: Option<usize>) -> Self {
        self.body_limit = limit;
        self
    }

    /// Every response, including 404s, allows any origin.
    pub fn router(&self) -> Router {
        let body_limit = match self.body_limit {
            Some(max) => DefaultBodyLimit::max(max),
            None => DefaultBodyLimit::disable(),
        };

        Router::new()
            .route(&self.route, post(ingest_handler).options(preflight_handler))
            .fallback(not_found_handler)
            .with_state(self.ingestor.clone())
            .layer(body_limit)
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(TraceLayer::new_for_http())
    }
}

async fn ingest_handler(
    State(ingestor): State<Arc<Ingestor>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let submission = match body
        .map_err(Error::from)
        .and_then(|body| Submission::from_slice(&body))
    {
        Ok(submission) => submission,
        Err(e) => {
            ingestor.reject(&e);
            return e.into_response();
        }
    };

    match ingestor.ingest(&submission).await {
        Ok(saved) => {
            debug!(video_id = %submission.video_id, saved, "Submission stored");
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn preflight_handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            ),
        ],
    )
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "File Not Found")
}
