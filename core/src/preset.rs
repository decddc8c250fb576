//! Named client presets.
//!
//! Each variant maps to a fixed `ClientConfig`. Adding a target API means
//! adding a variant and its tags here.

use std::str::FromStr;

use crate::config::{AuthScheme, ClientConfig, ContentType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Public Final Fantasy XIV game-data API. JSON, no credentials.
    Xivapi,
}

impl Preset {
    pub const ALL: &'static [Preset] = &[Preset::Xivapi];

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Preset::Xivapi => &["ff14", "xivapi"],
        }
    }

    pub fn config(&self) -> ClientConfig {
        match self {
            Preset::Xivapi => ClientConfig::new("https://xivapi.com")
                .with_content_type(ContentType::Json)
                .with_auth(AuthScheme::None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset tag: {0:?}")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.tags().iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
