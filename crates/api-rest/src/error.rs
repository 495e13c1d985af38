//! Mapping from core errors to HTTP responses.
//!
//! Every failure leaves the API as a JSON `{"error": ...}` body. Store failures are logged
//! here with their cause and reach the client only as a generic message.

use api_shared::wire;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rfiv_core::PatientError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: wire::ErrorRes,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: wire::ErrorRes::new(message),
        }
    }

    /// Attaches the normalised search so the client can show what was looked for.
    pub fn with_query(mut self, query: wire::SearchPatientsQuery) -> Self {
        self.body.query = Some(query);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        let status = match &err {
            PatientError::InvalidInput(_) | PatientError::Duplicate(_) => StatusCode::BAD_REQUEST,
            PatientError::PatientNotFound(_)
            | PatientError::TagNotFound(_)
            | PatientError::NoMatches => StatusCode::NOT_FOUND,
            // expected outcome for a repeated reading; clients should not retry
            PatientError::TooSoon { .. } => StatusCode::METHOD_NOT_ALLOWED,
            PatientError::StoreTimeout(_) | PatientError::StoreTask(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PatientError::FileRead(_)
            | PatientError::FileWrite(_)
            | PatientError::Serialization(_)
            | PatientError::Deserialization(_)
            | PatientError::CorruptStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match err {
            PatientError::InvalidInput(msg) => {
                tracing::warn!("validation failure: {}", msg);
                msg
            }
            e if e.is_store_failure() => {
                tracing::error!("patient store error: {:?}", e);
                if status == StatusCode::SERVICE_UNAVAILABLE {
                    "patient store unavailable".to_string()
                } else {
                    "Internal error".to_string()
                }
            }
            e => {
                tracing::debug!("request rejected: {}", e);
                e.to_string()
            }
        };

        Self::new(status, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::warn!("rejected query string: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!("rejected path parameter: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
