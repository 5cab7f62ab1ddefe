use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered, but with an error payload.
    #[error("IPFS API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed add result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read add results: {0}")]
    ResultStream(#[from] tokio_util::codec::LinesCodecError),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("directory walk task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid protocol '{0}' (expected http or https)")]
    InvalidProtocol(String),
}
