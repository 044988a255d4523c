//! Error types for the poster composer

use thiserror::Error;

/// Result type alias for canvas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing, exporting or fetching suggestions
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error (suggestion endpoint, font host, remote images)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The remote text-generation service answered with an error payload
    #[error("Suggestion service error (status {status}): {message}")]
    ServiceError { status: u16, message: String },

    /// Failed to lay out or paint the composition
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to rasterize or encode the exported image
    #[error("Export failed: {0}")]
    ExportError(String),

    /// An image or logo reference could not be read
    #[error("Asset could not be loaded: {0}")]
    AssetError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "net")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}
