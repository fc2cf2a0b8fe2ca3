//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. Façade `build_*` methods produce an
//! `HttpRequest`, a [`Transport`](crate::transport::Transport) executes it,
//! and `parse_*` methods consume the resulting `HttpResponse`. Every call the
//! service accepts is a JSON `POST`, so the request carries no method field.

use serde::Serialize;

use crate::error::ApiError;

pub const CONTENT_TYPE_JSON: (&str, &str) = ("content-type", "application/json");

/// A JSON `POST` request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Serialize `payload` into a JSON `POST` to `url`.
    pub fn post_json<T: Serialize>(url: String, payload: &T) -> Result<Self, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            url,
            headers: vec![(CONTENT_TYPE_JSON.0.to_string(), CONTENT_TYPE_JSON.1.to_string())],
            body,
        })
    }

    /// The body parsed back into a JSON value. Mostly useful in tests.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
