//! Error taxonomy for caption acquisition

use axum::http::StatusCode;

/// Result type for caption operations
pub type Result<T> = std::result::Result<T, SubtitleError>;

/// Error types for caption acquisition
#[derive(thiserror::Error, Debug)]
pub enum SubtitleError {
    /// Bad or missing provider configuration. Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider exhausted every language and mode it knows about
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("No subtitles found: {0}")]
    NoSubtitles(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubtitleError {
    /// HTTP status reported to API callers for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubtitleError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SubtitleError::NoSubtitles(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API callers
    pub fn client_message(&self) -> String {
        match self {
            SubtitleError::InvalidRequest(msg) | SubtitleError::Upstream(msg) => msg.clone(),
            SubtitleError::NoSubtitles(video_id) => {
                format!("No subtitles found for video {}", video_id)
            }
            other => other.to_string(),
        }
    }
}
