use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status used when there is no entry to derive one from
pub const DEFAULT_STATUS: u16 = 400;

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEntry {
    /// HTTP status this problem maps to
    pub status: u16,
    /// Message catalog key
    pub key: String,
    /// Human-readable detail, usually the raw error message
    pub detail: String,
}

impl ErrorEntry {
    pub fn new(status: u16, key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            key: key.into(),
            detail: detail.into(),
        }
    }
}

/// Response body wrapping every reported problem, in collection order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ResponseEnvelope {
    pub errors: Vec<ErrorEntry>,
}

/// Envelope paired with the status derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    envelope: ResponseEnvelope,
    status: u16,
}

impl ErrorResponse {
    /// Build a response from an entry list.
    ///
    /// The outer status is taken from the first entry, or [`DEFAULT_STATUS`]
    /// when the list is absent or empty. It is fixed from here on.
    pub fn from_entries(errors: Option<Vec<ErrorEntry>>) -> Self {
        let errors = errors.unwrap_or_default();
        let status = errors.first().map_or(DEFAULT_STATUS, |entry| entry.status);

        Self {
            envelope: ResponseEnvelope { errors },
            status,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.envelope)).into_response()
    }
}
