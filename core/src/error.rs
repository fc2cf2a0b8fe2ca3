//! Error types for the identity-verification client.
//!
//! # Design
//! Local failures (`Validation`, `Classification`, `FileRead`) are raised
//! before any network activity. `Transport` means the round-trip itself did
//! not complete. `Application` means the service answered but embedded an
//! `error` object in its body; the decoded body travels with it so callers
//! can still inspect partial results through [`ApiError::partial`].

use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::media::MediaArgument;

/// Result alias used by every façade.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by façade setters, builders and actions.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A setter or action argument failed local validation.
    #[error("{0}")]
    Validation(String),

    /// A media argument is neither a URL, an existing file, nor long enough
    /// to be inline content.
    #[error("invalid {0}, file not found or malformed URL")]
    Classification(MediaArgument),

    /// A media argument named an existing file that could not be read.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP round-trip could not be completed.
    #[error("failed to connect to API server: {0}")]
    Transport(String),

    /// The service reported an error inside an otherwise readable response.
    #[error("{0}")]
    Application(Box<ApplicationError>),

    /// Non-2xx status with no embedded error object.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded (strict mode only).
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Remote error code, when the service reported one.
    pub fn code(&self) -> Option<u32> {
        match self {
            ApiError::Application(app) => Some(app.code),
            _ => None,
        }
    }

    /// Decode the response body that accompanied an application error.
    ///
    /// Returns `None` for every other variant, or when the body is not shaped
    /// like `T` at all.
    pub fn partial<T: DeserializeOwned>(&self) -> Option<T> {
        match self {
            ApiError::Application(app) => app.partial(),
            _ => None,
        }
    }
}

/// Error object embedded in a response body, plus the body it arrived with.
#[derive(Debug, Clone)]
pub struct ApplicationError {
    pub code: u32,
    pub message: String,
    pub body: serde_json::Value,
}

impl ApplicationError {
    /// Fields of the body that do not fit `T` are left at their defaults.
    pub fn partial<T: DeserializeOwned>(&self) -> Option<T> {
        crate::response::lenient(self.body.clone())
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApplicationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_formats_code_and_message() {
        let err = ApiError::Application(Box::new(ApplicationError {
            code: 14,
            message: "mismatch".to_string(),
            body: serde_json::json!({}),
        }));
        assert_eq!(err.to_string(), "14: mismatch");
        assert_eq!(err.code(), Some(14));
    }

    #[test]
    fn classification_error_names_the_argument() {
        let err = ApiError::Classification(MediaArgument::SecondaryDocument);
        assert_eq!(
            err.to_string(),
            "invalid secondary document image, file not found or malformed URL"
        );
    }

    #[test]
    fn partial_skips_fields_that_do_not_fit() {
        let err = ApiError::Application(Box::new(ApplicationError {
            code: 14,
            message: "mismatch".to_string(),
            body: serde_json::json!({
                "error": {"code": 14, "message": "mismatch"},
                "result": {"firstName": "JOHN", "dob_day": "31"},
                "quota": 5
            }),
        }));
        let partial: crate::scan::ScanResponse = err.partial().unwrap();
        let result = partial.result.unwrap();
        assert_eq!(result.first_name.as_deref(), Some("JOHN"));
        assert_eq!(result.dob_day, None);
        assert_eq!(partial.quota, Some(5));
    }

    #[test]
    fn partial_is_none_for_local_errors() {
        let err = ApiError::validation("nope");
        assert!(err.partial::<serde_json::Value>().is_none());
        assert_eq!(err.code(), None);
    }
}
