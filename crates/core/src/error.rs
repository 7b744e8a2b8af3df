use thiserror::Error;

/// Failure to turn a raw service document into a validated record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {expected} at `{path}`, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("unparseable timestamp: {0}")]
    Timestamp(String),

    #[error("duplicate id `{0}`")]
    DuplicateId(String),
}

impl DecodeError {
    pub fn shape(path: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        DecodeError::Shape {
            path: path.into(),
            expected,
            found,
        }
    }
}
