//! Character lookup against XIVAPI.
//!
//! Two chained GETs: search by name and server, take the first hit's ID,
//! then fetch the full character record and read the active class job.

use std::fmt;

use rest_core::{AuthScheme, ClientConfig, ClientError, Document, Preset, RestClient, Transport};
use tracing::{debug, info};

pub const DEFAULT_NAME: &str = "Yukiko Kouri";
pub const DEFAULT_SERVER: &str = "Faerie";

const SEARCH_PATH: &str = "/character/search";
const FIRST_RESULT_ID: &str = "/Results/0/ID";
const CLASS_NAME: &str = "/Character/ActiveClassJob/UnlockedState/Name";
const CLASS_LEVEL: &str = "/Character/ActiveClassJob/Level";
const AVATAR: &str = "/Character/Avatar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSummary {
    pub name: String,
    pub id: u64,
    pub current_class: String,
    pub level: u64,
    pub avatar: String,
}

impl fmt::Display for CharacterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "Current Class: {}", self.current_class)?;
        writeln!(f, "Current Class Level: {}", self.level)?;
        write!(f, "Avatar: {}", self.avatar)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no character named {name:?} on {server:?}")]
    NotFound { name: String, server: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Query suffix for the search endpoint. Spaces in the name become `+`.
pub fn search_params(name: &str, server: &str) -> String {
    format!("?name={}&server={server}", name.replace(' ', "+"))
}

/// XIVAPI settings pointed at another host. An empty token counts as none.
pub fn override_config(base_url: impl Into<String>, token: Option<&str>) -> ClientConfig {
    let config = ClientConfig {
        base_url: base_url.into(),
        ..Preset::Xivapi.config()
    };
    match token.filter(|t| !t.is_empty()) {
        Some(token) => config.with_auth(AuthScheme::Bearer).with_private_key(token),
        None => config,
    }
}

pub fn lookup_character<T: Transport>(
    client: &mut RestClient<T>,
    name: &str,
    server: &str,
) -> Result<CharacterSummary, LookupError> {
    let response = client.send_get(SEARCH_PATH, &search_params(name, server))?;
    let search = Document::from_response(&response)?;
    let no_results = search
        .get("/Results")
        .and_then(|results| results.as_array())
        .is_some_and(|results| results.is_empty());
    if no_results {
        return Err(LookupError::NotFound {
            name: name.to_string(),
            server: server.to_string(),
        });
    }
    let id = search.u64_at(FIRST_RESULT_ID)?;
    debug!(id, "resolved character id");

    let response = client.send_get(&format!("/character/{id}"), "")?;
    let record = Document::from_response(&response)?;
    let summary = CharacterSummary {
        name: name.to_string(),
        id,
        current_class: record.str_at(CLASS_NAME)?.to_string(),
        level: record.u64_at(CLASS_LEVEL)?,
        avatar: record.str_at(AVATAR)?.to_string(),
    };
    info!(id, class = %summary.current_class, level = summary.level, "character found");
    Ok(summary)
}
