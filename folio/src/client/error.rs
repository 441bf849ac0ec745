use thiserror::Error;

/// Failures surfaced to callers of the data layer.
///
/// Cache read/write problems never show up here; they are absorbed where
/// they happen.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    RateLimited(String),

    #[error("API error ({status})")]
    Api { status: u16 },

    #[error("Non-JSON response")]
    NonJsonResponse,

    #[error("API error")]
    Empty,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status } => Some(*status),
            _ => None,
        }
    }
}
