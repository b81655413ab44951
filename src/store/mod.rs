//! Media store seam.
//!
//! The composition pipeline and the gallery only ever talk to a
//! [`MediaStore`]: upload an asset, delete assets, list assets. The store does
//! the actual compositing when an upload carries overlay instructions.

pub mod cloudinary;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::compose::OverlayInstruction;

pub use cloudinary::{CloudinaryCredentials, CloudinaryStore};
pub use memory::{MemoryStore, StoreCall, StoreOperation};

/// Descriptor of an asset hosted by the media store.
///
/// Only the fields this crate reads are typed; everything else the store
/// returned is kept in `extra` and written back out unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetDescriptor {
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            secure_url: None,
            url: None,
            width: None,
            height: None,
            format: None,
            bytes: None,
            created_at: None,
            folder: None,
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.public_id
    }

    /// Best URL to show the asset, preferring HTTPS
    pub fn href(&self) -> Option<&str> {
        self.secure_url.as_deref().or(self.url.as_deref())
    }
}

/// An image to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Per-upload options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    /// Folder the new asset is placed in
    pub folder: Option<String>,
    /// Overlays composited onto the uploaded image by the store
    pub transformation: Vec<OverlayInstruction>,
}

/// Listing query, scoped by folder prefix and asset type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub resource_type: String,
    pub delivery_type: String,
    pub max_results: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            prefix: None,
            resource_type: "image".to_string(),
            delivery_type: "upload".to_string(),
            max_results: 100,
        }
    }
}

/// Rejected store operation, carrying whatever the store said about it
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub status: Option<u16>,
    pub message: String,
    pub payload: Option<Value>,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// The three operations the collage pipeline needs from a media store
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a new asset and return its descriptor
    async fn upload(&self, file: UploadFile, options: UploadOptions) -> Result<AssetDescriptor, StoreError>;

    /// Delete the given assets
    async fn delete(&self, ids: &[String]) -> Result<(), StoreError>;

    /// List stored assets matching the query
    async fn list(&self, query: &ListQuery) -> Result<Vec<AssetDescriptor>, StoreError>;
}
