//! Wire types of the `/api` HTTP surface, shared by the server and the client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::{pixels, Section};
use crate::CollageError;

pub const IMAGES_PATH: &str = "/api/images";
pub const LAYOUTS_PATH: &str = "/api/layouts";

pub const SUCCESS: &str = "Success";
pub const ERROR: &str = "Error";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Multipart text field carrying the structured [`Manifest`]
pub const MANIFEST_FIELD: &str = "manifest";
/// Multipart text field of the legacy form: `{"width":..,"height":..}`
pub const LAYOUT_FIELD: &str = "layout";

/// `{message, result}` on success, `{message, error}` on failure
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            message: SUCCESS.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: ApiErrorBody) -> Self {
        Self {
            message: ERROR.to_string(),
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiErrorBody {
    pub kind: String,
    pub message: String,
    /// Raw payload from the media store, when it sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&CollageError> for ApiErrorBody {
    fn from(err: &CollageError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            details: err.details().cloned(),
        }
    }
}

/// Structured description of a collage upload.
///
/// Sent as the `manifest` field; every `file_ref` names the multipart file
/// part holding that section's image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub layout: ManifestLayout,
    pub sections: Vec<ManifestEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ManifestLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "pixels")]
    pub width: u32,
    #[serde(deserialize_with = "pixels")]
    pub height: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub section_index: usize,
    pub section: Section,
    pub file_ref: String,
}
