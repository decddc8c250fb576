//! Typed reads over untyped JSON responses.
//!
//! Paths are JSON Pointers (`/Character/ActiveClassJob/Level`). A path
//! that is absent, or present with the wrong type, is reported as
//! `ClientError::MissingField` naming the full pointer.

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::http::HttpResponse;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map(|root| Self { root })
            .map_err(ClientError::Deserialization)
    }

    pub fn from_response(response: &HttpResponse) -> Result<Self> {
        serde_json::from_slice(&response.body)
            .map(|root| Self { root })
            .map_err(ClientError::Deserialization)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    pub fn value(&self, pointer: &str) -> Result<&Value> {
        self.get(pointer).ok_or_else(|| missing(pointer))
    }

    pub fn str_at(&self, pointer: &str) -> Result<&str> {
        self.value(pointer)?.as_str().ok_or_else(|| missing(pointer))
    }

    pub fn u64_at(&self, pointer: &str) -> Result<u64> {
        self.value(pointer)?.as_u64().ok_or_else(|| missing(pointer))
    }

    pub fn i64_at(&self, pointer: &str) -> Result<i64> {
        self.value(pointer)?.as_i64().ok_or_else(|| missing(pointer))
    }
}

impl From<Value> for Document {
    fn from(root: Value) -> Self {
        Self { root }
    }
}

fn missing(pointer: &str) -> ClientError {
    ClientError::MissingField {
        path: pointer.to_string(),
    }
}
