//! Classification of user-supplied media references.
//!
//! A media argument is a string naming a document page, a face photo or a
//! face video. It is resolved, in order, as a remote URL, a local file, or
//! inline pre-encoded content; anything else is rejected before the request
//! is sent.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::trace;
use url::Url;

use crate::error::ApiError;

/// Strings at or below this length are never treated as inline content.
pub const INLINE_MIN_LEN: usize = 100;

/// Which call argument a media reference was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaArgument {
    PrimaryDocument,
    SecondaryDocument,
    FacePhoto,
    FaceVideo,
    VaultImage,
}

impl fmt::Display for MediaArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaArgument::PrimaryDocument => "primary document image",
            MediaArgument::SecondaryDocument => "secondary document image",
            MediaArgument::FacePhoto => "face image",
            MediaArgument::FaceVideo => "face video",
            MediaArgument::VaultImage => "image",
        };
        f.write_str(name)
    }
}

/// Where a media reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    RemoteUrl(String),
    LocalFile(PathBuf),
    Inline(String),
}

/// The value that goes on the wire for a media argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaValue {
    Url(String),
    Base64(String),
}

impl MediaValue {
    /// Split into the `(url, base64)` field pair, exactly one of which is set.
    pub fn into_pair(self) -> (Option<String>, Option<String>) {
        match self {
            MediaValue::Url(url) => (Some(url), None),
            MediaValue::Base64(data) => (None, Some(data)),
        }
    }
}

/// Classify `s`. Returns `None` when it is neither a URL, an existing regular
/// file, nor longer than [`INLINE_MIN_LEN`].
pub fn classify(s: &str) -> Option<MediaSource> {
    if is_remote_url(s) {
        return Some(MediaSource::RemoteUrl(s.to_string()));
    }
    let path = Path::new(s);
    if !s.is_empty() && path.is_file() {
        return Some(MediaSource::LocalFile(path.to_path_buf()));
    }
    if s.len() > INLINE_MIN_LEN {
        return Some(MediaSource::Inline(s.to_string()));
    }
    None
}

/// Absolute URL with a host component.
pub fn is_remote_url(s: &str) -> bool {
    Url::parse(s).map(|u| u.has_host()).unwrap_or(false)
}

impl MediaSource {
    /// Produce the wire value, reading and base64-encoding local files.
    pub fn into_value(self) -> Result<MediaValue, ApiError> {
        match self {
            MediaSource::RemoteUrl(url) => Ok(MediaValue::Url(url)),
            MediaSource::Inline(data) => Ok(MediaValue::Base64(data)),
            MediaSource::LocalFile(path) => {
                let bytes = std::fs::read(&path).map_err(|source| ApiError::FileRead {
                    path: path.clone(),
                    source,
                })?;
                Ok(MediaValue::Base64(STANDARD.encode(bytes)))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            MediaSource::RemoteUrl(_) => "url",
            MediaSource::LocalFile(_) => "file",
            MediaSource::Inline(_) => "inline",
        }
    }
}

/// Classify and encode a media argument in one step.
pub fn resolve(argument: MediaArgument, s: &str) -> Result<MediaValue, ApiError> {
    let source = classify(s).ok_or(ApiError::Classification(argument))?;
    trace!(%argument, kind = source.kind(), "resolved media reference");
    source.into_value()
}

/// Like [`resolve`] but treats an empty string as "not supplied".
pub fn resolve_optional(argument: MediaArgument, s: &str) -> Result<Option<MediaValue>, ApiError> {
    if s.is_empty() {
        return Ok(None);
    }
    resolve(argument, s).map(Some)
}
