//! Cloudinary-backed media store.
//!
//! Uploads go through the signed Upload API, deletes and listings through the
//! Admin API with HTTP basic auth. Signatures are SHA-256, so the product
//! environment has to be configured for SHA-256 signing.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use super::{AssetDescriptor, ListQuery, MediaStore, StoreError, UploadFile, UploadOptions};
use crate::compose::transformation_string;
use crate::{CollageError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// The Admin API accepts at most this many public ids per delete
const DELETE_BATCH: usize = 100;

#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: Url,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<AssetDescriptor>,
}

#[derive(Debug, Deserialize)]
struct DeleteResult {
    #[serde(default)]
    deleted: BTreeMap<String, Value>,
}

impl CloudinaryStore {
    pub fn new(credentials: CloudinaryCredentials, api_base: &str, timeout: Duration) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| CollageError::Config(format!("invalid Cloudinary API base '{api_base}': {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            credentials,
            api_base,
        })
    }

    /// `{api_base}/v1_1/{cloud_name}/{path}`
    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let relative = format!("v1_1/{}/{}", self.credentials.cloud_name, path);
        self.api_base
            .join(&relative)
            .map_err(|e| StoreError::new("request", format!("invalid endpoint {relative}: {e}")))
    }

    fn delete_url(&self, ids: &[String]) -> Result<Url, StoreError> {
        let mut url = self.endpoint("resources/image/upload")?;
        {
            let mut query = url.query_pairs_mut();
            for id in ids {
                query.append_pair("public_ids[]", id);
            }
        }
        Ok(url)
    }

    fn list_url(&self, query: &ListQuery) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&format!(
            "resources/{}/{}",
            query.resource_type, query.delivery_type
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(prefix) = &query.prefix {
                pairs.append_pair("prefix", prefix);
            }
            pairs.append_pair("max_results", &query.max_results.to_string());
        }
        Ok(url)
    }

    /// Parameters that take part in the upload signature
    fn upload_params(options: &UploadOptions, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", timestamp.to_string());
        if let Some(folder) = &options.folder {
            params.insert("folder", folder.clone());
        }
        if !options.transformation.is_empty() {
            params.insert("transformation", transformation_string(&options.transformation));
        }
        params
    }
}

/// SHA-256 signature over the sorted `key=value` pairs followed by the secret
pub fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{to_sign}{api_secret}").as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Turn a raw store response into `T` or a `StoreError` carrying the payload
fn decode_body<T: DeserializeOwned>(operation: &'static str, status: u16, body: &[u8]) -> Result<T, StoreError> {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    if !(200..300).contains(&status) {
        let payload = parsed
            .as_ref()
            .and_then(|value| value.get("error").cloned())
            .or(parsed.clone());
        let message = payload
            .as_ref()
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

        let mut err = StoreError::new(operation, message).with_status(status);
        if let Some(payload) = payload {
            err = err.with_payload(payload);
        }
        return Err(err);
    }

    let value = parsed.ok_or_else(|| {
        StoreError::new(operation, "store returned a non-JSON body").with_status(status)
    })?;
    serde_json::from_value(value)
        .map_err(|e| StoreError::new(operation, format!("unexpected response: {e}")).with_status(status))
}

async fn read_response<T: DeserializeOwned>(
    operation: &'static str,
    response: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<T, StoreError> {
    let response = response.map_err(|e| StoreError::new(operation, e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| StoreError::new(operation, e.to_string()).with_status(status))?;
    decode_body(operation, status, &body)
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, file: UploadFile, options: UploadOptions) -> Result<AssetDescriptor, StoreError> {
        let url = self.endpoint("image/upload")?;
        let params = Self::upload_params(&options, Utc::now().timestamp());
        let signature = sign(&params, &self.credentials.api_secret);

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| StoreError::new("upload", format!("invalid content type: {e}")))?;
        }

        let mut form = Form::new()
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(%url, overlays = options.transformation.len(), "uploading to Cloudinary");
        read_response("upload", self.http.post(url).multipart(form).send().await).await
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        for batch in ids.chunks(DELETE_BATCH) {
            let url = self.delete_url(batch)?;
            let request = self
                .http
                .delete(url)
                .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret));

            let result: DeleteResult = read_response("delete", request.send().await).await?;
            for (id, outcome) in &result.deleted {
                if outcome.as_str() != Some("deleted") {
                    warn!(%id, %outcome, "asset was not deleted");
                }
            }
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<AssetDescriptor>, StoreError> {
        let url = self.list_url(query)?;
        let request = self
            .http
            .get(url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret));

        let list: ResourceList = read_response("list", request.send().await).await?;
        Ok(list.resources)
    }
}
