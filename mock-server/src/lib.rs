//! In-process stand-in for the XIVAPI character endpoints.
//!
//! Besides `/character/search` and `/character/{id}` it serves a few
//! diagnostic routes for client tests:
//! - `/echo` (any method) reflects method, headers and body as JSON.
//! - `/status/{code}` answers with the given status; 3xx codes point
//!   `Location` at `/echo`.
//! - `/files/{name}` returns stored bytes.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Character {
    pub id: u64,
    pub name: String,
    pub server: String,
    pub class_name: String,
    pub level: u32,
    pub avatar: String,
}

impl Character {
    fn summary(&self) -> Value {
        json!({
            "ID": self.id,
            "Name": self.name,
            "Server": self.server,
            "Avatar": self.avatar,
        })
    }

    fn record(&self) -> Value {
        json!({
            "Character": {
                "ID": self.id,
                "Name": self.name,
                "Server": self.server,
                "Avatar": self.avatar,
                "ActiveClassJob": {
                    "Level": self.level,
                    "UnlockedState": { "Name": self.class_name },
                },
            }
        })
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct AppState {
    pub characters: Arc<RwLock<HashMap<u64, Character>>>,
    pub files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

/// The character every test scenario can rely on.
pub fn sample_character() -> Character {
    Character {
        id: 123,
        name: "Yukiko Kouri".to_string(),
        server: "Faerie".to_string(),
        class_name: "Paladin".to_string(),
        level: 80,
        avatar: "http://x/a.png".to_string(),
    }
}

/// Route table printed by the standalone binary; mirrors [`app_with`].
pub const ROUTES: &[&str] = &[
    "GET /character/search?name=&server=",
    "GET /character/{id}",
    "ANY /echo",
    "ANY /status/{code}",
    "GET /files/{name}",
];

pub const SAMPLE_FILE: &[u8] = b"\x89PNG\r\n\x1a\nmock-avatar";

pub fn app() -> Router {
    app_with(vec![sample_character()])
}

pub fn app_with(characters: Vec<Character>) -> Router {
    let characters: HashMap<u64, Character> = characters.into_iter().map(|c| (c.id, c)).collect();
    let files = HashMap::from([("a.png".to_string(), SAMPLE_FILE.to_vec())]);
    let state = AppState {
        characters: Arc::new(RwLock::new(characters)),
        files: Arc::new(RwLock::new(files)),
    };
    Router::new()
        .route("/character/search", get(search_characters))
        .route("/character/{id}", get(get_character))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/files/{name}", get(get_file))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn search_characters(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<Value> {
    let characters = state.characters.read().await;
    let mut results: Vec<&Character> = characters
        .values()
        .filter(|c| !params.name.is_empty() && c.name.eq_ignore_ascii_case(params.name.trim()))
        .filter(|c| {
            params
                .server
                .as_deref()
                .map_or(true, |server| c.server.eq_ignore_ascii_case(server))
        })
        .collect();
    results.sort_by_key(|c| c.id);
    let results: Vec<Value> = results.into_iter().map(Character::summary).collect();
    Json(json!({
        "Pagination": { "Page": 1, "Results": results.len() },
        "Results": results,
    }))
}

async fn get_character(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let characters = state.characters.read().await;
    characters
        .get(&id)
        .map(|c| Json(c.record()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<impl IntoResponse, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let mut headers = HeaderMap::new();
    if status.is_redirection() {
        headers.insert(header::LOCATION, header::HeaderValue::from_static("/echo"));
    }
    Ok((status, headers, format!("status {code}")))
}

async fn get_file(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let files = state.files.read().await;
    match files.get(&name) {
        Some(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
