//! Two-step character lookup, against canned upstream replies and against
//! the live mock server.

use std::collections::VecDeque;
use std::net::SocketAddr;

use rest_core::{ClientConfig, ClientError, HttpRequest, HttpResponse, RestClient, Transport, TransportError};
use xivapi_demo::{lookup_character, CharacterSummary, LookupError};

/// Replays queued bodies in order and records the URLs asked for.
struct Canned {
    bodies: VecDeque<(u16, &'static str)>,
    urls: Vec<String>,
}

impl Canned {
    fn new(bodies: &[(u16, &'static str)]) -> Self {
        Self {
            bodies: bodies.iter().copied().collect(),
            urls: Vec::new(),
        }
    }
}

impl Transport for Canned {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.urls.push(request.url.clone());
        let (status, body) = self
            .bodies
            .pop_front()
            .ok_or_else(|| TransportError::new("unexpected request", TransportError::OTHER))?;
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        })
    }

    fn set_verify_tls(&mut self, _verify: bool) {}

    fn verify_tls(&self) -> bool {
        true
    }
}

fn canned_client(bodies: &[(u16, &'static str)]) -> RestClient<Canned> {
    RestClient::create_with_transport("ff14", None, Canned::new(bodies)).unwrap()
}

#[test]
fn extracts_class_level_and_avatar() {
    let mut client = canned_client(&[
        (200, r#"{"Results":[{"ID":123}]}"#),
        (
            200,
            r#"{"Character":{"ActiveClassJob":{"UnlockedState":{"Name":"Paladin"},"Level":80},"Avatar":"http://x/a.png"}}"#,
        ),
    ]);

    let summary = lookup_character(&mut client, "Yukiko Kouri", "Faerie").unwrap();
    assert_eq!(
        summary,
        CharacterSummary {
            name: "Yukiko Kouri".to_string(),
            id: 123,
            current_class: "Paladin".to_string(),
            level: 80,
            avatar: "http://x/a.png".to_string(),
        }
    );
    assert_eq!(
        client.transport().urls,
        vec![
            "https://xivapi.com/character/search?name=Yukiko+Kouri&server=Faerie".to_string(),
            "https://xivapi.com/character/123".to_string(),
        ]
    );
}

#[test]
fn empty_results_is_not_found() {
    let mut client = canned_client(&[(200, r#"{"Results":[]}"#)]);
    let err = lookup_character(&mut client, "Nobody", "Faerie").unwrap_err();
    assert!(matches!(err, LookupError::NotFound { .. }));
    assert_eq!(client.transport().urls.len(), 1);
}

#[test]
fn missing_nested_field_fails_fast() {
    let mut client = canned_client(&[
        (200, r#"{"Results":[{"ID":123}]}"#),
        (200, r#"{"Character":{"ActiveClassJob":{"Level":80}}}"#),
    ]);
    let err = lookup_character(&mut client, "Yukiko Kouri", "Faerie").unwrap_err();
    match err {
        LookupError::Client(ClientError::MissingField { path }) => {
            assert_eq!(path, "/Character/ActiveClassJob/UnlockedState/Name");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn upstream_error_status_surfaces() {
    let mut client = canned_client(&[(200, r#"{"Results":[{"ID":5}]}"#), (500, "boom")]);
    let err = lookup_character(&mut client, "Yukiko Kouri", "Faerie").unwrap_err();
    assert!(matches!(
        err,
        LookupError::Client(ClientError::Status { status: 500, .. })
    ));
}

fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn looks_up_character_on_mock_server() {
    let addr = spawn_server();
    let mut client = RestClient::new(ClientConfig::new(format!("http://{addr}")));

    let summary = lookup_character(&mut client, "Yukiko Kouri", "Faerie").unwrap();
    assert_eq!(summary.id, 123);
    assert_eq!(summary.current_class, "Paladin");
    assert_eq!(summary.level, 80);
    assert_eq!(summary.avatar, "http://x/a.png");

    let err = lookup_character(&mut client, "Yukiko Kouri", "Gilgamesh").unwrap_err();
    assert!(matches!(err, LookupError::NotFound { .. }));
}
