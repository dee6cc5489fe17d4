/// Error types for the Map Maker client
///
/// Every fallible operation in the crate returns [`Result`]. The UI layer
/// turns these into status-line messages; nothing below it panics.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure talking to the backend
    #[error("request to backend failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status code
    #[error("backend returned {status} for `{endpoint}`")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    /// Frame bytes could not be decoded into an image
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file or override is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend executable could not be launched
    #[error("could not start backend {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A background task panicked or was aborted
    #[error("background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
