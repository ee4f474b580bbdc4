//! Error types for the healthcheck sidecar

/// Errors that can occur in the healthcheck sidecar
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Status server error: {0}")]
    Server(String),
}

/// Result type alias for sidecar operations
pub type Result<T> = std::result::Result<T, SidecarError>;
