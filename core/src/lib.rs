//! Synchronous client for a remote identity-verification service.
//!
//! # Overview
//! Four façades map one-to-one onto the service's endpoints:
//! [`DocumentScanApi`] (OCR and face matching of ID documents),
//! [`HostedSessionApi`] (hosted verification and signature links),
//! [`VaultApi`] (stored identity records) and [`WatchlistApi`] (sanctions and
//! PEP search). No verification work happens locally; each façade builds a
//! JSON payload, POSTs it and decodes the reply.
//!
//! # Design
//! - Each façade owns a `*Config` with documented defaults. Setters validate
//!   before they assign, so a rejected value never leaves partial state.
//! - Every action is split into `build_*` (produces an [`HttpRequest`]) and
//!   `parse_*` (consumes an [`HttpResponse`]); the action method runs the
//!   round-trip through a [`Transport`] in between. Callers with their own
//!   HTTP stack can use the two halves directly.
//! - Media arguments are classified as URL, local file or inline content
//!   before anything is sent (see [`media`]).
//! - Responses are decoded permissively: every field is optional, unknown
//!   keys are ignored, and an embedded `error` object becomes
//!   [`ApiError::Application`] carrying the decoded body.
//! - Façades are not synchronized; share one across threads only behind a lock.

pub mod address;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod media;
pub mod response;
pub mod scan;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;
pub mod vault;
pub mod watchlist;

pub use config::{ClientOptions, DecodeMode, PrefillData};
pub use endpoint::Region;
pub use error::{ApiError, ApiResult, ApplicationError};
pub use http::{HttpRequest, HttpResponse};
pub use scan::{Accuracy, DocumentScanApi, ScanInput, ScanResponse};
pub use session::{FaceVerification, HostedSessionApi, ImageFormat, SessionKind};
pub use transport::{Transport, UreqTransport};
pub use vault::{ListQuery, VaultApi, VaultImageKind, VaultRecord};
pub use watchlist::WatchlistApi;
