use thiserror::Error;

/// Error taxonomy shared by the client crates.
///
/// Only a handful of failure shapes exist on this side of the wire: bad
/// configuration, a durable-storage problem, an HTTP transport failure, a
/// malformed payload, or a missing/expired credential. Anything the remote
/// API reports through a status code is not an error at this layer; callers
/// receive the response and interpret it themselves.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(anyhow::Error::new(err))
    }
}
