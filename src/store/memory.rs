//! In-process media store.
//!
//! Used for local development (`backend = "memory"`) and as the test double
//! of the pipeline. It records every call in order, can be told to fail a
//! given call, and probes uploaded bytes for image dimensions. It does not
//! draw overlays: a "composite" is the uploaded background itself.

use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use chrono::Utc;
use image::ImageReader;
use parking_lot::Mutex;
use serde_json::json;

use super::{AssetDescriptor, ListQuery, MediaStore, StoreError, UploadFile, UploadOptions};
use crate::compose::{transformation_string, OverlayInstruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Upload,
    Delete,
    List,
}

/// One call made against the store, successful or not
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Upload {
        /// Assigned public id, `None` if the upload was rejected
        id: Option<String>,
        file_name: String,
        folder: Option<String>,
        overlays: Vec<OverlayInstruction>,
    },
    Delete {
        ids: Vec<String>,
    },
    List {
        prefix: Option<String>,
    },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    /// Stored assets, oldest first
    assets: Vec<AssetDescriptor>,
    uploads: Vec<UploadFile>,
    calls: Vec<StoreCall>,
    attempts: HashMap<StoreOperation, usize>,
    failures: HashMap<StoreOperation, Vec<usize>>,
}

impl Inner {
    /// Count an attempt and report whether it was scheduled to fail
    fn should_fail(&mut self, operation: StoreOperation) -> bool {
        let attempt = self.attempts.entry(operation).or_default();
        *attempt += 1;
        self.failures
            .get(&operation)
            .is_some_and(|ordinals| ordinals.contains(attempt))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` (1-based) call of `operation` fail
    pub fn fail_on(&self, operation: StoreOperation, nth: usize) {
        self.inner.lock().failures.entry(operation).or_default().push(nth);
    }

    /// Seed an existing asset, e.g. an earlier collage
    pub fn insert(&self, descriptor: AssetDescriptor) {
        self.inner.lock().assets.push(descriptor);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Files of successful uploads, in upload order
    pub fn uploads(&self) -> Vec<UploadFile> {
        self.inner.lock().uploads.clone()
    }

    pub fn asset_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .assets
            .iter()
            .map(|asset| asset.public_id.clone())
            .collect()
    }

    fn rejected(operation: &'static str) -> StoreError {
        StoreError::new(operation, "rejected by memory store")
            .with_status(500)
            .with_payload(json!({ "message": format!("{operation} rejected by memory store") }))
    }
}

fn describe(id: &str, file: &UploadFile, folder: Option<&str>) -> AssetDescriptor {
    let mut descriptor = AssetDescriptor::new(id);
    descriptor.secure_url = Some(format!("memory://{id}"));
    descriptor.bytes = Some(file.bytes.len() as u64);
    descriptor.created_at = Some(Utc::now().to_rfc3339());
    descriptor.folder = folder.map(str::to_string);

    if let Ok(reader) = ImageReader::new(Cursor::new(&file.bytes)).with_guessed_format() {
        descriptor.format = reader
            .format()
            .and_then(|format| format.extensions_str().first())
            .map(|ext| ext.to_string());
        if let Ok((width, height)) = reader.into_dimensions() {
            descriptor.width = Some(width);
            descriptor.height = Some(height);
        }
    }

    descriptor
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn upload(&self, file: UploadFile, options: UploadOptions) -> Result<AssetDescriptor, StoreError> {
        let mut inner = self.inner.lock();

        if inner.should_fail(StoreOperation::Upload) {
            inner.calls.push(StoreCall::Upload {
                id: None,
                file_name: file.file_name.clone(),
                folder: options.folder.clone(),
                overlays: options.transformation.clone(),
            });
            return Err(Self::rejected("upload"));
        }

        inner.next_id += 1;
        let id = match &options.folder {
            Some(folder) => format!("{folder}/asset-{}", inner.next_id),
            None => format!("asset-{}", inner.next_id),
        };

        let mut descriptor = describe(&id, &file, options.folder.as_deref());
        if !options.transformation.is_empty() {
            descriptor.extra.insert(
                "transformation".to_string(),
                json!(transformation_string(&options.transformation)),
            );
        }

        inner.calls.push(StoreCall::Upload {
            id: Some(id),
            file_name: file.file_name.clone(),
            folder: options.folder,
            overlays: options.transformation,
        });
        inner.uploads.push(file);
        inner.assets.push(descriptor.clone());

        Ok(descriptor)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::Delete { ids: ids.to_vec() });

        if inner.should_fail(StoreOperation::Delete) {
            return Err(Self::rejected("delete"));
        }

        inner.assets.retain(|asset| !ids.contains(&asset.public_id));
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<AssetDescriptor>, StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::List { prefix: query.prefix.clone() });

        if inner.should_fail(StoreOperation::List) {
            return Err(Self::rejected("list"));
        }

        // Newest first, like the store's own listing
        Ok(inner
            .assets
            .iter()
            .rev()
            .filter(|asset| {
                query
                    .prefix
                    .as_deref()
                    .map_or(true, |prefix| asset.public_id.starts_with(prefix))
            })
            .take(query.max_results as usize)
            .cloned()
            .collect())
    }
}
