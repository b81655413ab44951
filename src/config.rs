//! Configuration for the collage server and the desktop client.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [store]
//! backend = "cloudinary"
//! cloud_name = "demo"
//! api_key = "1234"
//! api_secret = "abcd"
//! folder = "photo-collages"
//!
//! [client]
//! server_url = "http://127.0.0.1:3000"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::store::{cloudinary, CloudinaryCredentials};
use crate::{CollageError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Largest accepted request body, all images included
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Cloudinary,
    Memory,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base_url: String,
    /// Folder finished collages are placed in and listed from
    pub folder: String,
    pub max_results: u32,
    pub timeout_secs: u64,
    /// Delete the per-section uploads once the composite exists
    pub delete_sources: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Cloudinary,
            cloud_name: None,
            api_key: None,
            api_secret: None,
            api_base_url: cloudinary::DEFAULT_API_BASE.to_string(),
            folder: "photo-collages".to_string(),
            max_results: 100,
            timeout_secs: 60,
            delete_sources: true,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("api_base_url", &self.api_base_url)
            .field("folder", &self.folder)
            .field("max_results", &self.max_results)
            .field("timeout_secs", &self.timeout_secs)
            .field("delete_sources", &self.delete_sources)
            .finish()
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// All three Cloudinary credentials, or a config error naming the missing one
    pub fn credentials(&self) -> Result<CloudinaryCredentials> {
        let require = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CollageError::Config(format!("store.{name} is not set")))
        };

        Ok(CloudinaryCredentials {
            cloud_name: require(&self.cloud_name, "cloud_name")?,
            api_key: require(&self.api_key, "api_key")?,
            api_secret: require(&self.api_secret, "api_secret")?,
        })
    }

    /// Read `cloudinary://<api_key>:<api_secret>@<cloud_name>`
    pub fn apply_cloudinary_url(&mut self, raw: &str) -> Result<()> {
        let invalid = |reason: &str| CollageError::Config(format!("invalid CLOUDINARY_URL: {reason}"));

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "cloudinary" {
            return Err(invalid("scheme must be cloudinary://"));
        }
        let cloud_name = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing cloud name"))?;
        let api_secret = url.password().ok_or_else(|| invalid("missing api secret"))?;
        if url.username().is_empty() {
            return Err(invalid("missing api key"));
        }

        self.cloud_name = Some(cloud_name.to_string());
        self.api_key = Some(url.username().to_string());
        self.api_secret = Some(api_secret.to_string());
        Ok(())
    }
}

impl Config {
    /// Load from the default locations and the process environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("COLLAGE_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "loading configuration");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// `<config_dir>/collage-studio/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("collage-studio");
        path.push("config.toml");
        Some(path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CollageError::Config(e.to_string()))
    }

    /// Overlay environment variables, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLOUDINARY_URL") {
            self.store.apply_cloudinary_url(&url)?;
        }
        if let Some(cloud_name) = lookup("CLOUDINARY_CLOUD_NAME") {
            self.store.cloud_name = Some(cloud_name);
        }
        if let Some(api_key) = lookup("CLOUDINARY_API_KEY") {
            self.store.api_key = Some(api_key);
        }
        if let Some(api_secret) = lookup("CLOUDINARY_API_SECRET") {
            self.store.api_secret = Some(api_secret);
        }
        if let Some(folder) = lookup("COLLAGE_FOLDER") {
            self.store.folder = folder;
        }
        if let Some(backend) = lookup("COLLAGE_STORE") {
            self.store.backend = match backend.to_ascii_lowercase().as_str() {
                "cloudinary" => StoreBackend::Cloudinary,
                "memory" => StoreBackend::Memory,
                other => {
                    return Err(CollageError::Config(format!("unknown store backend '{other}'")));
                }
            };
        }
        if let Some(bind) = lookup("COLLAGE_BIND") {
            self.server.bind = bind;
        }
        if let Some(server_url) = lookup("COLLAGE_SERVER_URL") {
            self.client.server_url = server_url;
        }

        debug!(config = ?self, "configuration resolved");
        Ok(())
    }

    /// Settings the server cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.store.folder.trim_matches('/').is_empty() {
            return Err(CollageError::Config("store.folder must not be empty".into()));
        }
        if self.store.backend == StoreBackend::Cloudinary {
            self.store.credentials()?;
        }
        Ok(())
    }
}
