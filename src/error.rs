use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {0}")]
    Status(u16),

    #[error("Backend reported error: {0}")]
    Backend(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed {domain} payload: {source}")]
    Payload {
        domain: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
