//! Blocking REST client core.
//!
//! # Overview
//! `RestClient` wraps one connection handle with a base URL, an ordered
//! header set seeded from its auth and content-type configuration, and a
//! last-error slot for transport failures. It speaks GET/POST/PUT/PATCH/
//! DELETE plus hand-built multipart uploads and file downloads.
//!
//! # Design
//! - Requests are plain data (`HttpRequest`) built by `build_*` methods and
//!   executed by a [`Transport`]; `UreqTransport` is the default.
//! - Headers are keyed by name, so per-request overrides (multipart
//!   `Content-Type`) replace by key instead of by position.
//! - Presets are an enum mapped to static `ClientConfig` records.
//! - JSON responses are read through `Document`, whose accessors report
//!   absent paths as `ClientError::MissingField`.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod json;
pub mod multipart;
pub mod preset;
pub mod transport;

pub use client::{Payload, RestClient};
pub use config::{AuthMode, AuthScheme, ClientConfig, ContentType};
pub use error::{ClientError, Result, TransportError};
pub use headers::HeaderSet;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use json::Document;
pub use multipart::{Form, FormPart};
pub use preset::{Preset, UnknownPreset};
pub use transport::{Transport, UreqTransport};
