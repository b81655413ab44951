//! Collage HTTP server
//!
//! Routes:
//! - `GET /api/images`: finished collages
//! - `POST /api/images`: compose a new collage from a multipart body
//! - `GET /api/layouts`: the layout catalog

pub mod handlers;
pub mod request;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{IMAGES_PATH, LAYOUTS_PATH};
use crate::compose::CompositionService;
use crate::config::{Config, StoreBackend, StoreConfig};
use crate::gallery::GalleryReader;
use crate::layout::LayoutRegistry;
use crate::store::{CloudinaryStore, MediaStore, MemoryStore};
use crate::{CollageError, Result};

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    pub registry: Arc<LayoutRegistry>,
    pub composer: CompositionService,
    pub gallery: GalleryReader,
}

impl AppState {
    pub fn new(registry: Arc<LayoutRegistry>, store: Arc<dyn MediaStore>, config: &StoreConfig) -> Self {
        Self {
            registry,
            composer: CompositionService::new(store.clone(), config.folder.clone())
                .with_delete_sources(config.delete_sources),
            gallery: GalleryReader::new(store, config.folder.clone(), config.max_results),
        }
    }
}

/// Create the media store selected by the configuration
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn MediaStore>> {
    match config.backend {
        StoreBackend::Cloudinary => {
            let store = CloudinaryStore::new(config.credentials()?, &config.api_base_url, config.timeout())?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store: collages are not composited and vanish on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            IMAGES_PATH,
            get(handlers::list_images)
                .post(handlers::create_image)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            LAYOUTS_PATH,
            get(handlers::list_layouts).fallback(handlers::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl+C
pub async fn serve(config: Config, registry: Arc<LayoutRegistry>) -> Result<()> {
    config.validate()?;

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| CollageError::Config(format!("invalid bind address '{}': {e}", config.server.bind)))?;

    let store = build_store(&config.store)?;
    let state = Arc::new(AppState::new(registry, store, &config.store));
    let app = router(state, config.server.max_upload_bytes);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, folder = %config.store.folder, backend = ?config.store.backend, "collage server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("collage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
