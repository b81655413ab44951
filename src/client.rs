//! HTTP client for the collage server, used by the desktop app
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::api::{ApiResponse, Manifest, ManifestEntry, ManifestLayout, IMAGES_PATH, MANIFEST_FIELD};
use crate::state::Submission;
use crate::store::AssetDescriptor;
use crate::{CollageError, Result};

#[derive(Debug, Clone)]
pub struct CollageClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CollageClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CollageError::Config(format!("invalid server url '{base_url}': {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CollageError::Config(format!("invalid path {path}: {e}")))
    }

    /// Upload every assigned image and return the composite
    pub async fn submit(&self, submission: &Submission) -> Result<AssetDescriptor> {
        let manifest = manifest_for(submission);
        let mut form = Form::new().text(MANIFEST_FIELD, serde_json::to_string(&manifest)?);

        for entry in &submission.entries {
            let bytes = tokio::fs::read(&entry.image.path).await?;
            let part = Part::bytes(bytes)
                .file_name(entry.image.file_name.clone())
                .mime_str(entry.image.content_type())?;
            form = form.part(entry.key.to_string(), part);
        }

        info!(layout = submission.layout_id, sections = submission.entries.len(), "submitting collage");
        let response = self.http.post(self.url(IMAGES_PATH)?).multipart(form).send().await?;
        unwrap_envelope(response).await
    }

    /// Previously composited collages
    pub async fn gallery(&self) -> Result<Vec<AssetDescriptor>> {
        let response = self.http.get(self.url(IMAGES_PATH)?).send().await?;
        unwrap_envelope(response).await
    }

    /// Raw bytes of a stored collage, for the gallery thumbnails
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Where a collage can be fetched from over HTTP, if anywhere
pub fn preview_url(asset: &AssetDescriptor) -> Option<&str> {
    asset
        .href()
        .filter(|href| href.starts_with("https://") || href.starts_with("http://"))
}

/// The structured description of a submission, one entry per section
pub fn manifest_for(submission: &Submission) -> Manifest {
    Manifest {
        layout: ManifestLayout {
            id: Some(submission.layout_id),
            width: submission.canvas.width,
            height: submission.canvas.height,
        },
        sections: submission
            .entries
            .iter()
            .map(|entry| ManifestEntry {
                section_index: entry.key.index,
                section: entry.section,
                file_ref: entry.key.to_string(),
            })
            .collect(),
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    debug!(%status, bytes = body.len(), "server responded");

    let envelope: ApiResponse<T> = serde_json::from_slice(&body).map_err(|_| CollageError::Server {
        status: status.as_u16(),
        message: String::from_utf8_lossy(&body).into_owned(),
        error: None,
    })?;

    match envelope.result {
        Some(result) if status.is_success() => Ok(result),
        _ => {
            let (message, error) = match envelope.error {
                Some(error) => (error.message.clone(), serde_json::to_value(error).ok()),
                None => (envelope.message, None),
            };
            Err(CollageError::Server {
                status: status.as_u16(),
                message,
                error,
            })
        }
    }
}
