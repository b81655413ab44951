//! Listing of finished collages, straight from the media store
use std::sync::Arc;

use tracing::debug;

use crate::store::{AssetDescriptor, ListQuery, MediaStore, StoreError};

#[derive(Clone)]
pub struct GalleryReader {
    store: Arc<dyn MediaStore>,
    folder: String,
    max_results: u32,
}

impl GalleryReader {
    pub fn new(store: Arc<dyn MediaStore>, folder: impl Into<String>, max_results: u32) -> Self {
        Self {
            store,
            folder: folder.into(),
            max_results,
        }
    }

    /// The query sent to the store: every image uploaded into the collage folder
    pub fn query(&self) -> ListQuery {
        ListQuery {
            prefix: Some(format!("{}/", self.folder.trim_end_matches('/'))),
            max_results: self.max_results,
            ..Default::default()
        }
    }

    /// Store errors are passed through unchanged
    pub async fn list(&self) -> Result<Vec<AssetDescriptor>, StoreError> {
        let assets = self.store.list(&self.query()).await?;
        debug!(count = assets.len(), folder = %self.folder, "listed collages");
        Ok(assets)
    }
}

impl std::fmt::Debug for GalleryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryReader")
            .field("folder", &self.folder)
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreCall, StoreOperation};

    #[tokio::test]
    async fn test_empty_gallery() {
        let store = Arc::new(MemoryStore::new());
        let gallery = GalleryReader::new(store.clone(), "photo-collages", 100);

        assert!(gallery.list().await.unwrap().is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall::List { prefix: Some("photo-collages/".into()) }]
        );
    }

    #[tokio::test]
    async fn test_only_lists_collage_folder() {
        let store = Arc::new(MemoryStore::new());
        store.insert(AssetDescriptor::new("photo-collages/one"));
        store.insert(AssetDescriptor::new("asset-7"));

        let gallery = GalleryReader::new(store, "photo-collages/", 100);
        let ids: Vec<_> = gallery.list().await.unwrap().into_iter().map(|a| a.public_id).collect();
        assert_eq!(ids, vec!["photo-collages/one"]);
    }

    #[tokio::test]
    async fn test_store_error_is_passed_through() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(StoreOperation::List, 1);

        let err = GalleryReader::new(store, "photo-collages", 10).list().await.unwrap_err();
        assert_eq!(err.operation, "list");
    }
}
