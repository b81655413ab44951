use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::canvas::render_background;
use super::overlay::OverlayInstruction;
use super::CompositionRequest;
use crate::store::{AssetDescriptor, MediaStore, UploadFile, UploadOptions};
use crate::Result;

/// Server-side collage pipeline.
///
/// Each call is self-contained: the store is the only shared resource.
#[derive(Clone)]
pub struct CompositionService {
    store: Arc<dyn MediaStore>,
    folder: String,
    delete_sources: bool,
}

impl CompositionService {
    pub fn new(store: Arc<dyn MediaStore>, folder: impl Into<String>) -> Self {
        Self {
            store,
            folder: folder.into(),
            delete_sources: true,
        }
    }

    /// Keep or drop the per-section uploads once the composite exists
    pub fn with_delete_sources(mut self, delete_sources: bool) -> Self {
        self.delete_sources = delete_sources;
        self
    }

    /// Upload every section image, compose them onto a white canvas and
    /// delete the intermediate uploads.
    ///
    /// Any failure aborts the remaining steps. Uploads that already
    /// succeeded are not rolled back.
    pub async fn compose(&self, request: &CompositionRequest) -> Result<AssetDescriptor> {
        request.validate()?;

        let span = info_span!(
            "compose",
            request_id = %Uuid::new_v4(),
            layout_id = ?request.layout_id,
            width = request.canvas.width,
            height = request.canvas.height,
            sections = request.entries.len(),
        );

        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &CompositionRequest) -> Result<AssetDescriptor> {
        let mut uploaded: Vec<String> = Vec::with_capacity(request.entries.len());
        let mut overlays = Vec::with_capacity(request.entries.len());

        for entry in &request.entries {
            let descriptor = match self.store.upload(entry.image.clone(), UploadOptions::default()).await {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    if !uploaded.is_empty() {
                        warn!(orphaned = ?uploaded, "section upload failed, earlier uploads are left on the store");
                    }
                    return Err(err.into());
                }
            };

            info!(key = %entry.key, id = %descriptor.public_id, "uploaded section image");

            let z_index = overlays.len() as u32;
            overlays.push(OverlayInstruction::fill(descriptor.public_id.clone(), &entry.section, z_index));
            uploaded.push(descriptor.public_id);
        }

        let background = render_background(request.canvas)?;
        let options = UploadOptions {
            folder: Some(self.folder.clone()),
            transformation: overlays,
        };

        let composite = match self
            .store
            .upload(UploadFile::new(background, "background.png").with_content_type("image/png"), options)
            .await
        {
            Ok(composite) => composite,
            Err(err) => {
                warn!(orphaned = ?uploaded, "compose failed, section uploads are left on the store");
                return Err(err.into());
            }
        };

        info!(id = %composite.public_id, "composite created");

        if self.delete_sources {
            self.store.delete(&uploaded).await?;
            info!(count = uploaded.len(), "deleted section uploads");
        }

        Ok(composite)
    }
}

impl std::fmt::Debug for CompositionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionService")
            .field("folder", &self.folder)
            .field("delete_sources", &self.delete_sources)
            .finish()
    }
}
