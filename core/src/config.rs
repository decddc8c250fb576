//! Client configuration and the header tables derived from it.
//!
//! # Design
//! `ClientConfig` is plain data fixed at construction. The functions
//! [`auth_headers`] and [`content_type_headers`] are pure: they turn a
//! configuration into the header pairs the client seeds its `HeaderSet`
//! with, auth first and content type second.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Payload format advertised through `Accept` / `Content-Type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    #[default]
    Json,
    Xml,
    UrlEncoded,
}

impl ContentType {
    /// Map a loose tag (`"JSON"`, `"XML"`, `"URL"`) to a content type.
    /// Unrecognised tags fall back to JSON.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "XML" => ContentType::Xml,
            "URL" | "URLENCODED" => ContentType::UrlEncoded,
            _ => ContentType::Json,
        }
    }
}

/// How requests authenticate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
    #[default]
    None,
}

impl AuthScheme {
    /// Map a loose tag (`"BASIC"`, `"BEARER"`) to a scheme.
    /// Anything else means no static credentials.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "BASIC" => AuthScheme::Basic,
            "BEARER" => AuthScheme::Bearer,
            _ => AuthScheme::None,
        }
    }
}

/// Challenge negotiation the transport is allowed to perform.
///
/// `UreqTransport` performs no challenge negotiation, so this value
/// records intent only. Credentials reach the server solely through the
/// static `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Only HTTP Basic may be negotiated.
    Basic,
    /// Any scheme the server offers may be negotiated.
    Any,
    /// No negotiation; credentials, if any, travel in a static header.
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub content_type: ContentType,
    pub api_version: Option<String>,
    pub auth: AuthScheme,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_keys(mut self, public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }
}

/// Headers and negotiation mode for an authentication scheme.
///
/// An empty private key counts as absent. Basic without a private key adds
/// no header and leaves Basic negotiation to the transport.
pub fn auth_headers(
    scheme: AuthScheme,
    public_key: Option<&str>,
    private_key: Option<&str>,
) -> (Vec<(String, String)>, AuthMode) {
    let private_key = private_key.filter(|k| !k.is_empty());
    match scheme {
        AuthScheme::Basic => {
            let headers = match private_key {
                Some(private_key) => {
                    let credentials = format!("{}:{private_key}", public_key.unwrap_or_default());
                    vec![(
                        "Authorization".to_string(),
                        format!("Basic {}", STANDARD.encode(credentials)),
                    )]
                }
                None => Vec::new(),
            };
            (headers, AuthMode::Basic)
        }
        AuthScheme::Bearer => (
            vec![(
                "Authorization".to_string(),
                format!("Bearer {}", private_key.unwrap_or_default()),
            )],
            AuthMode::None,
        ),
        AuthScheme::None => (Vec::new(), AuthMode::Any),
    }
}

/// `Accept` / `Content-Type` pairs for a content type.
///
/// The JSON `Accept` header gets a `; version=<v>` suffix only when the
/// trimmed version is non-empty.
pub fn content_type_headers(content_type: ContentType, version: Option<&str>) -> Vec<(String, String)> {
    match content_type {
        ContentType::Xml => vec![
            ("Accept".to_string(), "application/xml".to_string()),
            ("Content-Type".to_string(), "application/xml".to_string()),
        ],
        ContentType::UrlEncoded => vec![(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        )],
        ContentType::Json => {
            let accept = match version.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => format!("application/json; version={v}"),
                None => "application/json".to_string(),
            };
            vec![
                ("Accept".to_string(), accept),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        }
    }
}
