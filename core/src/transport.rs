//! The connection handle behind a `RestClient`.
//!
//! # Design
//! `Transport` is the single seam where I/O happens: it receives a fully
//! built `HttpRequest` and returns the `HttpResponse` as data. A completed
//! exchange is `Ok` whatever its status; only failures to talk to the
//! server at all are `Err`. `UreqTransport` is the production
//! implementation; tests substitute their own.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Toggle TLS peer and host verification for later requests.
    fn set_verify_tls(&mut self, verify: bool);

    fn verify_tls(&self) -> bool;
}

/// Blocking transport backed by a `ureq::Agent`.
///
/// Connection attempts time out after `connect_timeout`; there is no
/// timeout on the transfer itself. Redirects are not followed: a 3xx
/// comes back as the response.
pub struct UreqTransport {
    agent: ureq::Agent,
    connect_timeout: Duration,
    verify_tls: bool,
}

impl UreqTransport {
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self::with_connect_timeout(Self::CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            agent: build_agent(connect_timeout, true),
            connect_timeout,
            verify_tls: true,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("connect_timeout", &self.connect_timeout)
            .field("verify_tls", &self.verify_tls)
            .finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), request).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), request).call(),
            HttpMethod::Post => send_body(with_headers(self.agent.post(url), request), body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(url), request), body),
            HttpMethod::Patch => send_body(with_headers(self.agent.patch(url), request), body),
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn set_verify_tls(&mut self, verify: bool) {
        if verify != self.verify_tls {
            self.agent = build_agent(self.connect_timeout, verify);
            self.verify_tls = verify;
        }
    }

    fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

fn build_agent(connect_timeout: Duration, verify_tls: bool) -> ureq::Agent {
    let tls = ureq::tls::TlsConfig::builder()
        .disable_verification(!verify_tls)
        .build();
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_connect(Some(connect_timeout))
        .tls_config(tls)
        .build()
        .new_agent()
}

/// Attach the request's headers, except `Content-Length`, which ureq derives
/// from the body itself.
fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}

fn transport_error(err: ureq::Error) -> TransportError {
    let code = match &err {
        ureq::Error::BadUri(_) => TransportError::BAD_URL,
        ureq::Error::HostNotFound => TransportError::HOST_NOT_FOUND,
        ureq::Error::ConnectionFailed => TransportError::CONNECT_FAILED,
        ureq::Error::Timeout(_) => TransportError::TIMEOUT,
        ureq::Error::Tls(_) | ureq::Error::Rustls(_) => TransportError::TLS,
        ureq::Error::TooManyRedirects => TransportError::TOO_MANY_REDIRECTS,
        ureq::Error::Io(e) => io_code(e),
        _ => TransportError::OTHER,
    };
    TransportError::new(err.to_string(), code)
}

/// rustls surfaces handshake failures as `InvalidData` I/O errors
/// wrapping a `rustls::Error`.
fn io_code(err: &io::Error) -> i32 {
    if err.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
        return TransportError::TLS;
    }
    match err.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable => TransportError::CONNECT_FAILED,
        io::ErrorKind::TimedOut => TransportError::TIMEOUT,
        _ => TransportError::RECEIVE,
    }
}
