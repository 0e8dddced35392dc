//! Error handling module
//!
//! Defines the uniform error carried across layers and its translation
//! into an RFC 9457 problem response

use crate::utils::logging::{problem_log_message, status_error_message};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when an error is raised without a category label
pub const DEFAULT_TITLE: &str = "API Error Occurred";

/// Detail used when an error reaches the boundary with a blank message
pub const DEFAULT_MESSAGE: &str = "API Error occurred. Please contact support or administrator.";

/// Content type of problem responses
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range caller input
    Validation,
    /// Upstream rejected the request with a 4xx status
    Client,
    /// Upstream reported the requested resource as missing
    NotFound,
    /// Transport-level failure talking to the upstream
    Integration,
    /// Unexpected failure at the request-handling boundary
    Internal,
    /// Anything raised without a more specific category
    Other,
}

/// Uniform application error
///
/// Built once where a failure is detected and passed upward unchanged
/// until the boundary translator turns it into a problem response.
#[derive(Error, Debug)]
#[error("{detail}")]
pub struct AppError {
    /// Error category
    pub kind: ErrorKind,
    /// Short category label
    pub title: String,
    /// Human-readable message
    pub detail: String,
    /// HTTP-style status code, used verbatim by the boundary translator
    pub status_code: Option<u16>,
    /// Request path the error occurred on
    pub instance: Option<String>,
    /// Underlying error
    #[source]
    pub cause: Option<anyhow::Error>,
}

/// RFC 9457 problem response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Problem type URI
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short summary of the problem
    pub title: String,
    /// HTTP status code
    pub status: u16,
    /// Occurrence-specific explanation
    pub detail: String,
    /// URI of the specific occurrence (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl AppError {
    /// Create an error with the default title and no status code
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Other,
            title: DEFAULT_TITLE.to_string(),
            detail: detail.into(),
            status_code: None,
            instance: None,
            cause: None,
        }
    }

    /// Create a 400 error for rejected caller input
    pub fn validation(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            title: "Bad Request".to_string(),
            detail: detail.into(),
            status_code: Some(400),
            instance: None,
            cause: None,
        }
    }

    /// Create an error mirroring an upstream 4xx response
    pub fn client(detail: impl Into<String>, title: impl Into<String>, status: u16) -> Self {
        Self {
            kind: ErrorKind::Client,
            title: title.into(),
            detail: detail.into(),
            status_code: Some(status),
            instance: None,
            cause: None,
        }
    }

    /// Create a 404 error for a missing upstream resource
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            title: "Resource Not Found".to_string(),
            detail: detail.into(),
            status_code: Some(404),
            instance: None,
            cause: None,
        }
    }

    /// Create a 500 error for a transport-level upstream failure
    pub fn integration(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Integration,
            title: "Integration Error".to_string(),
            detail: detail.into(),
            status_code: Some(500),
            instance: None,
            cause: None,
        }
    }

    /// Create a 500 error for an unexpected failure
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            title: "Internal Server Error".to_string(),
            detail: detail.into(),
            status_code: Some(500),
            instance: None,
            cause: None,
        }
    }

    /// Set the status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Set the request path reported as the problem instance
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Attach the underlying error
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Get HTTP status code
    ///
    /// Absent or out-of-range codes fall back to 500.
    pub fn status(&self) -> StatusCode {
        self.status_code
            .filter(|code| (100..=599).contains(code))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert to problem response body
    pub fn to_problem(&self) -> ProblemDetail {
        let detail = if self.detail.trim().is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            self.detail.clone()
        };
        let title = if self.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            self.title.clone()
        };

        ProblemDetail {
            problem_type: "about:blank".to_string(),
            title,
            status: self.status().as_u16(),
            detail,
            instance: self.instance.clone(),
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.as_u16() != self.status_code.unwrap_or_default() {
            tracing::info!(
                "Error code could not be mapped to a valid HTTP status, using {}: {}",
                status,
                status_error_message(self.status_code, &self.detail)
            );
        }

        let problem = self.to_problem();

        if status.is_server_error() {
            match &self.cause {
                Some(cause) => tracing::error!("{} - Cause: {:#}", problem_log_message(&problem), cause),
                None => tracing::error!("{}", problem_log_message(&problem)),
            }
        } else {
            tracing::warn!("{}", problem_log_message(&problem));
        }

        let mut response = (status, Json(problem)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        response
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Convert the error into an integration error with the given detail
    fn integration_context(self, detail: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn integration_context(self, detail: &str) -> AppResult<T> {
        self.map_err(|e| AppError::integration(detail).with_cause(e))
    }
}
