/// Collage composition
///
/// This module handles:
/// - The validated composition request (canvas size + section uploads)
/// - Overlay instructions and their transformation string (overlay.rs)
/// - The white background canvas (canvas.rs)
/// - The upload → compose → cleanup pipeline (service.rs)

pub mod canvas;
pub mod overlay;
pub mod service;

use std::collections::HashSet;

use crate::layout::{CanvasSize, Section};
use crate::store::UploadFile;
use crate::{CollageError, Result};

pub use overlay::{transformation_string, Crop, Gravity, OverlayInstruction};
pub use service::CompositionService;

/// Largest canvas side accepted, in pixels
pub const MAX_CANVAS_SIDE: u32 = 10_000;

/// One section of the collage and the image that fills it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionUpload {
    /// Client-side section key, e.g. `layout-2-image-0`
    pub key: String,
    pub section: Section,
    pub image: UploadFile,
}

/// Everything needed to compose one collage, in stacking order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRequest {
    pub layout_id: Option<u32>,
    pub canvas: CanvasSize,
    pub entries: Vec<SectionUpload>,
}

impl CompositionRequest {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            layout_id: None,
            canvas,
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, section: Section, image: UploadFile) -> Self {
        self.entries.push(SectionUpload {
            key: key.into(),
            section,
            image,
        });
        self
    }

    /// Reject requests the pipeline cannot turn into a sensible collage
    pub fn validate(&self) -> Result<()> {
        let CanvasSize { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(CollageError::invalid("layout width and height must be positive"));
        }
        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(CollageError::invalid(format!(
                "layout {width}x{height} exceeds the {MAX_CANVAS_SIDE}px limit"
            )));
        }
        if self.entries.is_empty() {
            return Err(CollageError::invalid("at least one section image is required"));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.key.as_str()) {
                return Err(CollageError::invalid(format!("section {} appears twice", entry.key)));
            }
            if entry.image.bytes.is_empty() {
                return Err(CollageError::invalid(format!("image for {} is empty", entry.key)));
            }
            if entry.section.width == 0 || entry.section.height == 0 {
                return Err(CollageError::invalid(format!("section {} has no area", entry.key)));
            }
            if !entry.section.fits_within(width, height) {
                return Err(CollageError::invalid(format!(
                    "section {} does not fit in a {width}x{height} layout",
                    entry.key
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompositionRequest {
        CompositionRequest::new(CanvasSize { width: 800, height: 400 })
            .with_entry(
                "layout-2-image-0",
                Section { width: 400, height: 400, x: 0, y: 0 },
                UploadFile::new(vec![1, 2, 3], "a.png"),
            )
            .with_entry(
                "layout-2-image-1",
                Section { width: 400, height: 400, x: 400, y: 0 },
                UploadFile::new(vec![4, 5, 6], "b.png"),
            )
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_canvas() {
        let mut zero = request();
        zero.canvas.width = 0;
        assert!(zero.validate().is_err());

        let mut huge = request();
        huge.canvas.height = MAX_CANVAS_SIDE + 1;
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_entries() {
        let empty = CompositionRequest::new(CanvasSize { width: 10, height: 10 });
        assert!(empty.validate().is_err());

        let mut duplicate = request();
        duplicate.entries[1].key = duplicate.entries[0].key.clone();
        assert!(duplicate.validate().is_err());

        let mut overflow = request();
        overflow.entries[1].section.x = 401;
        assert!(overflow.validate().is_err());

        let mut no_bytes = request();
        no_bytes.entries[0].image.bytes.clear();
        assert!(no_bytes.validate().is_err());
    }
}
