//! Collage Studio
//!
//! Pick a predefined collage layout, assign one image per section and let the
//! media store merge them onto a white canvas.
//!
//! - `layout`: the built-in layout catalog and its pixel geometry
//! - `state`: per-layout section assignments on the desktop side
//! - `compose`: the upload → compose → cleanup pipeline
//! - `store`: the media store seam (Cloudinary and in-memory)
//! - `gallery`: listing of finished collages
//! - `server` / `client`: the `/api/images` HTTP surface and its client

pub mod api;
pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod gallery;
pub mod layout;
pub mod logging;
pub mod server;
pub mod state;
pub mod store;
pub mod ui;

pub use error::{CollageError, Result};
