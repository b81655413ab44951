//! Shared data structures for the assignment state
//!
//! These structs represent the data model that flows between
//! the tracker, the UI layer and the HTTP client.
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::layout::{CanvasSize, Section, SectionKey};
use crate::{CollageError, Result};

/// Extensions offered by the file picker (the `image/*` filter of the form)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// A user-selected image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    /// Full path to the file on disk
    pub path: PathBuf,
    /// Filename only (e.g., "DSC_0001.jpg")
    pub file_name: String,
}

impl SelectedImage {
    /// Accept a path if its extension names an image format
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if ImageFormat::from_path(&path).is_err() {
            return Err(CollageError::invalid(format!(
                "{} is not an image file",
                path.display()
            )));
        }

        let file_name = file_name_of(&path);
        Ok(Self { path, file_name })
    }

    /// MIME type derived from the extension, used for the multipart part
    pub fn content_type(&self) -> &'static str {
        ImageFormat::from_path(&self.path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream")
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// The pairing of one section with one selected image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub image: SelectedImage,
    pub section: Section,
}

/// One entry of a submission, in section order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntry {
    pub key: SectionKey,
    pub section: Section,
    pub image: SelectedImage,
}

/// Everything the client sends for one collage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub layout_id: u32,
    pub canvas: CanvasSize,
    pub entries: Vec<SubmissionEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_image_extensions() {
        let image = SelectedImage::from_path("/photos/Beach.JPG").unwrap();
        assert_eq!(image.file_name, "Beach.JPG");
        assert_eq!(image.content_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(SelectedImage::from_path("/photos/notes.txt").is_err());
        assert!(SelectedImage::from_path("/photos/no_extension").is_err());
    }
}
