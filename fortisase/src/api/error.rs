use thiserror::Error;
use tfplug::types::Diagnostic;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid endpoint: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// The API's own explanation, when the error body carried one
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::ApiError {
                details: Some(details),
                ..
            } => Some(details.to_string()),
            _ => None,
        }
    }

    /// Error diagnostic whose detail keeps the HTTP status and the API's
    /// explanation
    pub fn to_diagnostic(&self, summary: impl Into<String>) -> Diagnostic {
        let detail = match self.detail() {
            Some(detail) => format!("{}\n\n{}", self, detail),
            None => self.to_string(),
        };
        Diagnostic::error(summary, detail)
    }
}
