//! The configured REST client.
//!
//! # Design
//! `RestClient` owns its connection handle (a [`Transport`]), the
//! persistent header set seeded from its `ClientConfig`, and a single
//! last-error slot. Every verb is split into a pure `build_*` method that
//! produces an `HttpRequest` and a `send_*` method that runs it through
//! [`RestClient::execute`].
//!
//! All send operations take `&mut self`: one client serves one caller at a
//! time. Share it across threads only behind a `Mutex`.
//!
//! Status policy: a completed exchange with a non-2xx status is returned as
//! `ClientError::Status`. Only transport failures land in the last-error
//! slot, and a later success does not clear it.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{auth_headers, content_type_headers, AuthMode, AuthScheme, ClientConfig};
use crate::error::{ClientError, Result, TransportError};
use crate::headers::HeaderSet;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::{self, Form};
use crate::preset::Preset;
use crate::transport::{Transport, UreqTransport};

/// Body for POST and PUT.
///
/// Structured JSON (objects and arrays) is serialized; a string is sent
/// verbatim, which lets callers pre-encode form bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

impl Payload {
    pub fn json<S: Serialize + ?Sized>(value: &S) -> Result<Self> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(ClientError::Serialization)
    }

    fn into_body(self) -> Result<Vec<u8>> {
        match self {
            Payload::Raw(text) | Payload::Json(Value::String(text)) => Ok(text.into_bytes()),
            Payload::Json(Value::Null) => Ok(Vec::new()),
            Payload::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_vec(&value).map_err(ClientError::Serialization)
            }
            Payload::Json(scalar) => Ok(scalar.to_string().into_bytes()),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.to_string())
    }
}

#[derive(Debug)]
pub struct RestClient<T: Transport = UreqTransport> {
    config: ClientConfig,
    headers: HeaderSet,
    auth_mode: AuthMode,
    transport: T,
    last_error: Option<TransportError>,
}

impl RestClient<UreqTransport> {
    /// Build a client with the default ureq transport. No I/O happens here.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Build a client from a preset tag such as `"ff14"`.
    ///
    /// Returns `None` for unknown tags. A non-empty `token` is sent as a
    /// Bearer credential.
    pub fn create(tag: &str, token: Option<&str>) -> Option<Self> {
        Self::create_with_transport(tag, token, UreqTransport::new())
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let (auth, auth_mode) = auth_headers(
            config.auth,
            config.public_key.as_deref(),
            config.private_key.as_deref(),
        );
        let content = content_type_headers(config.content_type, config.api_version.as_deref());
        let headers = auth.into_iter().chain(content).collect();
        Self {
            config,
            headers,
            auth_mode,
            transport,
            last_error: None,
        }
    }

    pub fn create_with_transport(tag: &str, token: Option<&str>, transport: T) -> Option<Self> {
        let preset: Preset = tag.parse().ok()?;
        let mut config = preset.config();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            config = config.with_auth(AuthScheme::Bearer).with_private_key(token);
        }
        Some(Self::with_transport(config, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Add a raw `Name: value` header to every later request. A header
    /// with the same name is replaced in place.
    pub fn add_header(&mut self, line: &str) -> Result<()> {
        self.headers.insert_line(line)
    }

    /// Stop verifying TLS peer certificates and host names.
    pub fn disable_ssl_verify(&mut self) {
        self.transport.set_verify_tls(false);
    }

    /// Message of the most recent transport failure, if any.
    pub fn error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    fn url(&self, path: &str, params: &str) -> String {
        format!("{}{path}{params}", self.config.base_url)
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.headers.to_pairs(),
            body,
        }
    }

    /// `params` is appended verbatim; callers encode their own query string.
    pub fn build_get(&self, path: &str, params: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(path, params), None)
    }

    pub fn build_post(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpRequest> {
        let body = payload.into().into_body()?;
        Ok(self.request(HttpMethod::Post, self.url(path, ""), Some(body)))
    }

    pub fn build_put(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpRequest> {
        let body = payload.into().into_body()?;
        Ok(self.request(HttpMethod::Put, self.url(path, ""), Some(body)))
    }

    /// The serialized value is always wrapped in a JSON array: `[<json>]`.
    pub fn build_patch<S: Serialize + ?Sized>(&self, path: &str, value: &S) -> Result<HttpRequest> {
        let json = serde_json::to_string(value).map_err(ClientError::Serialization)?;
        let body = format!("[{json}]").into_bytes();
        Ok(self.request(HttpMethod::Patch, self.url(path, ""), Some(body)))
    }

    pub fn build_delete(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.url(path, ""), None)
    }

    pub fn build_file(&self, path: &str, form: &Form) -> HttpRequest {
        self.build_file_with_boundary(path, form, &multipart::boundary())
    }

    /// Multipart POST. The request carries a copy of the persistent headers
    /// with `Content-Type` replaced and `Content-Length` set; the client's
    /// own header set is left untouched.
    pub fn build_file_with_boundary(&self, path: &str, form: &Form, boundary: &str) -> HttpRequest {
        let body = form.encode(boundary);
        let mut headers = self.headers.clone();
        headers.insert("Content-Type", format!("multipart/form-data; boundary={boundary}"));
        headers.insert("Content-Length", body.len().to_string());
        HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path, ""),
            headers: headers.to_pairs(),
            body: Some(body),
        }
    }

    pub fn send_get(&mut self, path: &str, params: &str) -> Result<HttpResponse> {
        let request = self.build_get(path, params);
        self.execute(request)
    }

    pub fn send_post(&mut self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse> {
        let request = self.build_post(path, payload)?;
        self.execute(request)
    }

    pub fn send_put(&mut self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse> {
        let request = self.build_put(path, payload)?;
        self.execute(request)
    }

    pub fn send_patch<S: Serialize + ?Sized>(&mut self, path: &str, value: &S) -> Result<HttpResponse> {
        let request = self.build_patch(path, value)?;
        self.execute(request)
    }

    pub fn send_delete(&mut self, path: &str) -> Result<HttpResponse> {
        let request = self.build_delete(path);
        self.execute(request)
    }

    pub fn send_file(&mut self, path: &str, form: &Form) -> Result<HttpResponse> {
        let request = self.build_file(path, form);
        self.execute(request)
    }

    /// Run a request through the transport.
    ///
    /// A transport failure is stored as the last error and returned. A
    /// non-2xx response becomes `ClientError::Status`.
    pub fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        match self.transport.send(&request) {
            Ok(response) => {
                debug!(
                    status = response.status,
                    bytes = response.body.len(),
                    "received response"
                );
                response.error_for_status()
            }
            Err(err) => {
                warn!(code = err.code, url = %request.url, "request failed: {}", err.message);
                self.last_error = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// GET `path + params` and write the body to `filename`, replacing any
    /// existing file. Returns the number of bytes written.
    ///
    /// TLS verification is switched off for this client and stays off.
    /// Nothing is written when the request fails.
    pub fn download_file(&mut self, filename: impl AsRef<Path>, path: &str, params: &str) -> Result<u64> {
        if self.transport.verify_tls() {
            warn!(url = %self.url(path, params), "disabling TLS verification for download");
            self.disable_ssl_verify();
        }
        let response = self.send_get(path, params)?;
        fs::write(filename.as_ref(), &response.body)?;
        Ok(response.body.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::config::ContentType;

    #[derive(Debug)]
    struct MockTransport {
        sent: Vec<HttpRequest>,
        replies: VecDeque<std::result::Result<HttpResponse, TransportError>>,
        verify_tls: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                replies: VecDeque::new(),
                verify_tls: true,
            }
        }

        fn reply(mut self, status: u16, body: &str) -> Self {
            self.replies.push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            }));
            self
        }

        fn fail(mut self, message: &str, code: i32) -> Self {
            self.replies.push_back(Err(TransportError::new(message, code)));
            self
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.sent.push(request.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("no reply queued", TransportError::OTHER)))
        }

        fn set_verify_tls(&mut self, verify: bool) {
            self.verify_tls = verify;
        }

        fn verify_tls(&self) -> bool {
            self.verify_tls
        }
    }

    fn json_client(transport: MockTransport) -> RestClient<MockTransport> {
        RestClient::with_transport(ClientConfig::new("https://api.test"), transport)
    }

    #[test]
    fn auth_headers_precede_content_type() {
        let config = ClientConfig::new("https://api.test")
            .with_auth(AuthScheme::Bearer)
            .with_private_key("tok")
            .with_api_version("2.1");
        let client = RestClient::with_transport(config, MockTransport::new());
        assert_eq!(
            client.headers().lines(),
            vec![
                "Authorization: Bearer tok",
                "Accept: application/json; version=2.1",
                "Content-Type: application/json",
            ]
        );
        assert_eq!(client.auth_mode(), AuthMode::None);
    }

    #[test]
    fn basic_without_private_key_negotiates() {
        let config = ClientConfig::new("https://api.test")
            .with_auth(AuthScheme::Basic)
            .with_content_type(ContentType::Xml);
        let client = RestClient::with_transport(config, MockTransport::new());
        assert_eq!(client.headers().get("Authorization"), None);
        assert_eq!(client.auth_mode(), AuthMode::Basic);
        assert_eq!(client.headers().get("Accept"), Some("application/xml"));
    }

    #[test]
    fn added_header_goes_out_on_next_request() {
        let mut client = json_client(MockTransport::new().reply(200, "{}"));
        client.add_header("X-Api-Key: abc").unwrap();
        client.send_get("/ping", "").unwrap();
        let sent = &client.transport().sent[0];
        assert_eq!(sent.header("x-api-key"), Some("abc"));
        assert_eq!(sent.headers.last().map(|(k, _)| k.as_str()), Some("X-Api-Key"));
    }

    #[test]
    fn added_header_replaces_same_name() {
        let mut client = json_client(MockTransport::new());
        client.add_header("Accept: text/plain").unwrap();
        assert_eq!(client.headers().len(), 2);
        assert_eq!(client.headers().get("Accept"), Some("text/plain"));
        assert!(matches!(
            client.add_header("garbage").unwrap_err(),
            ClientError::InvalidHeader(_)
        ));
    }

    #[test]
    fn get_appends_params_verbatim() {
        let client = json_client(MockTransport::new());
        let req = client.build_get("/character/search", "?name=Yukiko+Kouri&server=Faerie");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.test/character/search?name=Yukiko+Kouri&server=Faerie");
        assert!(req.body.is_none());
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn post_serializes_structured_payload() {
        let client = json_client(MockTransport::new());
        let req = client.build_post("/tickets", json!({"summary": "broken", "ids": [1, 2]})).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"summary": "broken", "ids": [1, 2]}));
    }

    #[test]
    fn post_accepts_serializable_struct() {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Ticket<'a> {
            summary: &'a str,
            priority: u8,
        }

        let mut client = json_client(MockTransport::new().reply(201, ""));
        let payload = Payload::json(&Ticket { summary: "broken", priority: 2 }).unwrap();
        client.send_post("/tickets", payload).unwrap();
        let body: Value = serde_json::from_slice(client.transport().sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"Summary": "broken", "Priority": 2}));
    }

    #[test]
    fn post_sends_raw_string_verbatim() {
        let client = json_client(MockTransport::new());
        let req = client.build_post("/login", "user=a&pass=b").unwrap();
        assert_eq!(req.body_text().as_deref(), Some("user=a&pass=b"));

        let req = client.build_post("/login", json!("already=encoded")).unwrap();
        assert_eq!(req.body_text().as_deref(), Some("already=encoded"));
    }

    #[test]
    fn put_uses_put_method() {
        let client = json_client(MockTransport::new());
        let req = client.build_put("/tickets/1", json!([{"op": "noop"}])).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "https://api.test/tickets/1");
        assert_eq!(req.body_text().as_deref(), Some(r#"[{"op":"noop"}]"#));
    }

    #[test]
    fn patch_wraps_body_in_array() {
        let client = json_client(MockTransport::new());
        let empty = serde_json::Map::new();
        let req = client.build_patch("/tickets/1", &empty).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.body_text().as_deref(), Some("[{}]"));

        let op = json!({"op": "replace", "path": "status", "value": "closed"});
        let req = client.build_patch("/tickets/1", &op).unwrap();
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!([op]));
    }

    #[test]
    fn delete_has_no_body() {
        let client = json_client(MockTransport::new());
        let req = client.build_delete("/tickets/1");
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn send_file_swaps_content_type_for_one_request() {
        let transport = MockTransport::new().reply(201, "uploaded");
        let config = ClientConfig::new("https://api.test")
            .with_auth(AuthScheme::Bearer)
            .with_private_key("tok");
        let mut client = RestClient::with_transport(config, transport);
        let before = client.headers().clone();

        let form = Form::new()
            .text("field", "value")
            .file("upload", "a.png", vec![0x89, b'P', b'N', b'G'], "image/png");
        let response = client.send_file("/attachments", &form).unwrap();
        assert_eq!(response.text(), "uploaded");

        let sent = &client.transport().sent[0];
        assert_eq!(sent.method, HttpMethod::Post);
        let content_type = sent.header("Content-Type").unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();
        let body = sent.body.as_deref().unwrap();
        assert_eq!(sent.header("Content-Length"), Some(body.len().to_string().as_str()));
        assert_eq!(sent.header("Authorization"), Some("Bearer tok"));

        let text = String::from_utf8_lossy(body);
        assert_eq!(text.matches(&format!("--{boundary}\r\n")).count(), 2);
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
        assert_eq!(text.matches("filename=\"a.png\"").count(), 1);
        assert_eq!(text.matches("Content-Disposition: form-data; name=\"field\"\r\n\r\nvalue\r\n").count(), 1);

        assert_eq!(client.headers(), &before);
        assert_eq!(client.headers().get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn transport_failure_fills_last_error_slot() {
        let transport = MockTransport::new()
            .fail("Could not resolve host: nowhere", TransportError::HOST_NOT_FOUND)
            .reply(200, r#"{"ok":true}"#);
        let mut client = json_client(transport);
        assert_eq!(client.error_message(), None);

        let err = client.send_get("/a", "").unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        let message = client.error_message().unwrap();
        assert!(message.contains("Could not resolve host"));
        assert!(message.ends_with("error number: 6"));

        let response = client.send_get("/b", "").unwrap();
        assert_eq!(response.text(), r#"{"ok":true}"#);
        // Success leaves the stale error in place.
        assert_eq!(client.error_message().as_deref(), Some(message.as_str()));
    }

    #[test]
    fn later_failure_overwrites_last_error() {
        let transport = MockTransport::new()
            .fail("first", TransportError::CONNECT_FAILED)
            .fail("second", TransportError::TIMEOUT);
        let mut client = json_client(transport);
        let _ = client.send_delete("/x");
        let _ = client.send_delete("/x");
        let last = client.last_error().unwrap();
        assert_eq!(last.message, "second");
        assert_eq!(last.code, TransportError::TIMEOUT);
    }

    #[test]
    fn non_success_status_is_an_error_but_not_recorded() {
        let mut client = json_client(MockTransport::new().reply(404, "no such character"));
        let err = client.send_get("/character/0", "").unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such character");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.last_error().is_none());
    }

    #[test]
    fn unknown_preset_yields_no_client() {
        assert!(RestClient::create("cw", None).is_none());
        assert!(RestClient::create_with_transport("", None, MockTransport::new()).is_none());
    }

    #[test]
    fn ff14_preset_is_public_json() {
        let client = RestClient::create_with_transport("FF14", None, MockTransport::new()).unwrap();
        assert_eq!(client.config().base_url, "https://xivapi.com");
        assert_eq!(
            client.headers().lines(),
            vec!["Accept: application/json", "Content-Type: application/json"]
        );
        assert_eq!(client.auth_mode(), AuthMode::Any);
    }

    #[test]
    fn preset_token_becomes_bearer() {
        let client = RestClient::create_with_transport("ff14", Some("secret"), MockTransport::new()).unwrap();
        assert_eq!(client.headers().get("Authorization"), Some("Bearer secret"));

        let client = RestClient::create_with_transport("ff14", Some(""), MockTransport::new()).unwrap();
        assert_eq!(client.headers().get("Authorization"), None);
    }

    #[test]
    fn tls_verification_is_on_until_disabled() {
        let mut client = json_client(MockTransport::new());
        assert!(client.transport().verify_tls());
        client.disable_ssl_verify();
        assert!(!client.transport().verify_tls());
    }

    #[test]
    fn download_writes_body_and_leaves_tls_off() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("avatar.png");
        fs::write(&target, b"old contents that are longer").unwrap();

        let mut client = json_client(MockTransport::new().reply(200, "PNGDATA"));
        let written = client.download_file(&target, "/files/avatar.png", "?size=64").unwrap();
        assert_eq!(written, 7);
        assert_eq!(fs::read(&target).unwrap(), b"PNGDATA");
        assert_eq!(client.transport().sent[0].url, "https://api.test/files/avatar.png?size=64");
        assert_eq!(client.transport().sent[0].method, HttpMethod::Get);
        assert!(!client.transport().verify_tls());
    }

    #[test]
    fn failed_download_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing.png");
        let mut client = json_client(MockTransport::new().reply(500, "boom"));
        assert!(client.download_file(&target, "/files/missing.png", "").is_err());
        assert!(!target.exists());
    }
}
