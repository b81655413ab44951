//! Error types shared by the server, the composition pipeline and the desktop client
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

pub type Result<T, E = CollageError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CollageError {
    /// Malformed layout/section payloads, missing file parts, bad multipart bodies
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upload, compose, delete or list rejected by the media store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Background canvas could not be rendered or encoded
    #[error("failed to render background canvas: {0}")]
    Canvas(#[from] image::ImageError),

    #[error("unknown layout id {0}")]
    UnknownLayout(u32),

    #[error("layout id {0} is defined more than once")]
    DuplicateLayoutId(u32),

    #[error("section {0} does not belong to this layout")]
    UnknownSection(String),

    #[error("{assigned} of {required} sections have an image")]
    Incomplete { assigned: usize, required: usize },

    #[error("a submission for this layout is already in progress")]
    SubmissionInFlight,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Non-success envelope returned by the collage server
    #[error("server responded with {status}: {message}")]
    Server {
        status: u16,
        message: String,
        error: Option<Value>,
    },
}

impl CollageError {
    /// Stable tag used in the `error.kind` field of API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Store(_) => "store",
            Self::Canvas(_) => "canvas",
            Self::UnknownLayout(_) => "unknown_layout",
            Self::DuplicateLayoutId(_) => "duplicate_layout_id",
            Self::UnknownSection(_) => "unknown_section",
            Self::Incomplete { .. } => "incomplete",
            Self::SubmissionInFlight => "submission_in_flight",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Server { .. } => "server",
        }
    }

    /// Raw payload attached by the store or the server, if any
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Store(err) => err.payload.as_ref(),
            Self::Server { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_error_exposes_payload() {
        let err: CollageError = StoreError::new("upload", "rejected")
            .with_payload(json!({"message": "Invalid image file"}))
            .into();

        assert_eq!(err.kind(), "store");
        assert_eq!(err.details(), Some(&json!({"message": "Invalid image file"})));
    }

    #[test]
    fn test_incomplete_message() {
        let err = CollageError::Incomplete { assigned: 1, required: 2 };
        assert_eq!(err.to_string(), "1 of 2 sections have an image");
        assert!(err.details().is_none());
    }
}
