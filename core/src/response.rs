//! Response decoding shared by every façade.
//!
//! # Design
//! Decoding is permissive: result types default every field, unknown keys are
//! ignored, and in [`DecodeMode::Permissive`] a field whose value has the
//! wrong type is dropped while the rest of the body is kept (see [`lenient`]).
//! A body that is not JSON at all yields the type's default value. The embedded `error` object is read
//! from the raw JSON rather than the typed result, so it is detected even when
//! the rest of the body does not fit the expected shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::DecodeMode;
use crate::error::{ApiError, ApplicationError};
use crate::http::HttpResponse;

/// The `error` object the service embeds in failing responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteError {
    pub code: u32,
    pub message: String,
}

impl RemoteError {
    /// Lenient extraction: accepts numeric or numeric-string codes.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.get("error")?.as_object()?;
        let code = match object.get("code") {
            Some(Value::Number(n)) => n.as_u64().and_then(|c| u32::try_from(c).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or_default();
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { code, message })
    }
}

/// Decode `response` into `T`, surfacing an embedded error as
/// [`ApiError::Application`] and a bare non-2xx status as
/// [`ApiError::HttpStatus`].
pub fn normalize<T>(response: HttpResponse, mode: DecodeMode) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => match mode {
            DecodeMode::Strict => return Err(ApiError::Deserialization(e.to_string())),
            DecodeMode::Permissive => {
                debug!(status = response.status, error = %e, "response body is not JSON");
                Value::Null
            }
        },
    };

    if let Some(remote) = RemoteError::from_value(&value).filter(|e| !e.message.is_empty()) {
        return Err(ApiError::Application(Box::new(ApplicationError {
            code: remote.code,
            message: remote.message,
            body: value,
        })));
    }

    if !response.is_success() {
        return Err(ApiError::HttpStatus {
            status: response.status,
            body: response.body,
        });
    }

    decode_value(value, mode)
}

fn decode_value<T>(value: Value, mode: DecodeMode) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return match mode {
            DecodeMode::Strict => Err(ApiError::Deserialization("empty response body".to_string())),
            DecodeMode::Permissive => Ok(T::default()),
        };
    }
    match mode {
        DecodeMode::Strict => {
            serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
        }
        DecodeMode::Permissive => Ok(lenient(value).unwrap_or_default()),
    }
}

/// Decode `value` into `T`, dropping whichever fields do not fit.
///
/// Keys and array items that fail to decode are pruned one at a time, so a
/// single mistyped field costs that field only. Returns `None` when not even
/// the pruned value fits, e.g. a string where an object was expected.
pub fn lenient<T: DeserializeOwned>(mut value: Value) -> Option<T> {
    if let Ok(result) = T::deserialize(&value) {
        return Some(result);
    }
    prune(&mut value, &|candidate: &Value| T::deserialize(candidate).is_ok());
    match T::deserialize(&value) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!(error = %e, "response did not fit the expected shape");
            None
        }
    }
}

/// Remove the parts of `value` that `fits` rejects. Each child is checked on
/// its own, wrapped in a single-key object or single-item array, which holds
/// as long as every record type defaults its missing fields.
fn prune(value: &mut Value, fits: &dyn Fn(&Value) -> bool) {
    if fits(&*value) {
        return;
    }
    match value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let Some(mut child) = map.remove(&key) else {
                    continue;
                };
                let wrap = |c: &Value| {
                    let mut single = serde_json::Map::new();
                    single.insert(key.clone(), c.clone());
                    Value::Object(single)
                };
                let child_fits = |c: &Value| fits(&wrap(c));
                prune(&mut child, &child_fits);
                if child_fits(&child) {
                    map.insert(key, child);
                } else {
                    trace!(%key, "dropping field that does not decode");
                }
            }
        }
        Value::Array(items) => {
            let mut kept = Vec::with_capacity(items.len());
            for mut item in items.drain(..) {
                let item_fits = |c: &Value| fits(&Value::Array(vec![c.clone()]));
                prune(&mut item, &item_fits);
                if item_fits(&item) {
                    kept.push(item);
                }
            }
            *items = kept;
        }
        _ => {}
    }
}
