//! Hand-built `multipart/form-data` bodies.
//!
//! Parts are written in insertion order with CRLF line endings. Each part
//! opens with `--<boundary>` and the body closes with `--<boundary>--`.

use uuid::Uuid;

const EOL: &[u8] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// A plain `name=value` field.
    Field(String),
    /// A file upload sent with `Content-Transfer-Encoding: binary`.
    File {
        filename: String,
        content: Vec<u8>,
        mime: String,
    },
}

/// Ordered list of named form parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    parts: Vec<(String, FormPart)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Field(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        mime: impl Into<String>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                filename: filename.into(),
                content: content.into(),
                mime: mime.into(),
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encode all parts, delimited by `boundary`.
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, part) in &self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(boundary.as_bytes());
            body.extend_from_slice(EOL);
            match part {
                FormPart::File {
                    filename,
                    content,
                    mime,
                } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"")
                            .as_bytes(),
                    );
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(format!("Content-Type: {mime}").as_bytes());
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(b"Content-Transfer-Encoding: binary");
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(content);
                    body.extend_from_slice(EOL);
                }
                FormPart::Field(value) => {
                    body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes());
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(EOL);
                    body.extend_from_slice(value.as_bytes());
                    body.extend_from_slice(EOL);
                }
            }
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--");
        body.extend_from_slice(EOL);
        body
    }
}

/// A fresh boundary token, unique per call.
pub fn boundary() -> String {
    format!("-------------{}", Uuid::new_v4().simple())
}
