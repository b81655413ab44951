//! Turning a multipart body into a [`CompositionRequest`].
//!
//! Two body shapes are accepted:
//! - the structured form: a `manifest` JSON field plus one file part per
//!   `file_ref`
//! - the legacy form: a `layout` JSON field, and for every section a text
//!   field and a file part sharing the section key as their name

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::api::{Manifest, ManifestLayout, LAYOUT_FIELD, MANIFEST_FIELD};
use crate::compose::{CompositionRequest, SectionUpload};
use crate::layout::{CanvasSize, LayoutRegistry, Section};
use crate::store::UploadFile;
use crate::{CollageError, Result};

/// One multipart part, fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    /// Present on file parts only
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: None,
            data,
        }
    }

    fn is_file(&self) -> bool {
        self.file_name.is_some()
    }

    fn into_upload(self) -> UploadFile {
        let file_name = match self.file_name {
            Some(file_name) if !file_name.is_empty() => file_name,
            _ => self.name,
        };
        UploadFile {
            bytes: self.data,
            file_name,
            content_type: self.content_type,
        }
    }
}

/// Read every part of the body, in arrival order
pub async fn read_parts(mut multipart: Multipart) -> Result<Vec<FormPart>> {
    let mut parts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CollageError::invalid(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| CollageError::invalid(format!("failed to read part '{name}': {e}")))?
            .to_vec();

        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    Ok(parts)
}

/// Build and validate the request described by `parts`
pub fn build_request(parts: Vec<FormPart>, registry: &LayoutRegistry) -> Result<CompositionRequest> {
    let (files, fields): (Vec<FormPart>, Vec<FormPart>) = parts.into_iter().partition(FormPart::is_file);

    let mut text = HashMap::with_capacity(fields.len());
    for field in fields {
        let value = String::from_utf8(field.data)
            .map_err(|_| CollageError::invalid(format!("field '{}' is not UTF-8", field.name)))?;
        text.insert(field.name, value);
    }

    let request = match text.get(MANIFEST_FIELD) {
        Some(manifest) => from_manifest(parse_json(MANIFEST_FIELD, manifest)?, files, registry)?,
        None => from_legacy_fields(&text, files)?,
    };

    request.validate()?;
    Ok(request)
}

fn parse_json<T: serde::de::DeserializeOwned>(field: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| CollageError::invalid(format!("field '{field}' is not valid: {e}")))
}

fn canvas_of(layout: &ManifestLayout) -> CanvasSize {
    CanvasSize {
        width: layout.width,
        height: layout.height,
    }
}

fn from_manifest(manifest: Manifest, files: Vec<FormPart>, registry: &LayoutRegistry) -> Result<CompositionRequest> {
    let canvas = canvas_of(&manifest.layout);
    let known = manifest.layout.id.and_then(|id| registry.get(id));

    if let Some(layout) = known {
        if layout.canvas() != canvas {
            return Err(CollageError::invalid(format!(
                "layout {} is {}x{}, not {}x{}",
                layout.id, layout.width, layout.height, canvas.width, canvas.height
            )));
        }
    }

    let mut files: HashMap<String, FormPart> = files.into_iter().map(|file| (file.name.clone(), file)).collect();
    let mut entries = Vec::with_capacity(manifest.sections.len());

    for entry in manifest.sections {
        if let Some(layout) = known {
            if layout.section(entry.section_index) != Some(entry.section) {
                return Err(CollageError::invalid(format!(
                    "section {} does not match layout {}",
                    entry.section_index, layout.id
                )));
            }
        }

        let file = files
            .remove(&entry.file_ref)
            .ok_or_else(|| CollageError::invalid(format!("no file part named '{}'", entry.file_ref)))?;

        entries.push(SectionUpload {
            key: entry.file_ref,
            section: entry.section,
            image: file.into_upload(),
        });
    }

    Ok(CompositionRequest {
        layout_id: manifest.layout.id,
        canvas,
        entries,
    })
}

fn from_legacy_fields(text: &HashMap<String, String>, files: Vec<FormPart>) -> Result<CompositionRequest> {
    let layout_field = text
        .get(LAYOUT_FIELD)
        .ok_or_else(|| CollageError::invalid("missing 'layout' field"))?;
    let layout: ManifestLayout = parse_json(LAYOUT_FIELD, layout_field)?;

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let raw = text
            .get(&file.name)
            .ok_or_else(|| CollageError::invalid(format!("no section data for '{}'", file.name)))?;
        let section: Section = parse_json(&file.name, raw)?;

        entries.push(SectionUpload {
            key: file.name.clone(),
            section,
            image: file.into_upload(),
        });
    }

    Ok(CompositionRequest {
        layout_id: layout.id,
        canvas: canvas_of(&layout),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn legacy_parts() -> Vec<FormPart> {
        vec![
            FormPart::text("layout", r#"{"width":800,"height":400}"#),
            FormPart::text("layout-2-image-0", r#"{"width":400,"height":400,"x":0,"y":0}"#),
            FormPart::file("layout-2-image-0", "left.jpg", vec![1; 8]),
            FormPart::file("layout-2-image-1", "right.jpg", vec![2; 8]),
            FormPart::text("layout-2-image-1", r#"{"width":400,"height":400,"x":400,"y":0}"#),
        ]
    }

    fn manifest_parts(layout_id: Option<u32>) -> Vec<FormPart> {
        let manifest = json!({
            "layout": {"id": layout_id, "width": 800, "height": 400},
            "sections": [
                {"section_index": 0, "section": {"width": 400, "height": 400, "x": 0, "y": 0}, "file_ref": "layout-2-image-0"},
                {"section_index": 1, "section": {"width": 400, "height": 400, "x": 400, "y": 0}, "file_ref": "layout-2-image-1"}
            ]
        });
        vec![
            FormPart::file("layout-2-image-1", "right.jpg", vec![2; 8]),
            FormPart::text("manifest", manifest.to_string()),
            FormPart::file("layout-2-image-0", "left.jpg", vec![1; 8]),
        ]
    }

    #[test]
    fn test_legacy_form() {
        let request = build_request(legacy_parts(), &LayoutRegistry::builtin()).unwrap();

        assert_eq!(request.canvas, CanvasSize { width: 800, height: 400 });
        let keys: Vec<_> = request.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["layout-2-image-0", "layout-2-image-1"]);
        assert_eq!(request.entries[1].section.x, 400);
        assert_eq!(request.entries[1].image.file_name, "right.jpg");
    }

    #[test]
    fn test_structured_and_legacy_forms_agree() {
        let registry = LayoutRegistry::builtin();
        let legacy = build_request(legacy_parts(), &registry).unwrap();
        let structured = build_request(manifest_parts(None), &registry).unwrap();

        assert_eq!(legacy.canvas, structured.canvas);
        assert_eq!(legacy.entries, structured.entries);
    }

    #[test]
    fn test_manifest_checked_against_registry() {
        let registry = LayoutRegistry::builtin();
        let request = build_request(manifest_parts(Some(2)), &registry).unwrap();
        assert_eq!(request.layout_id, Some(2));

        // Layout 1 is 800x800
        let err = build_request(manifest_parts(Some(1)), &registry).unwrap_err();
        assert!(matches!(err, CollageError::InvalidRequest(_)));

        // Unknown ids are custom layouts and only checked for bounds
        assert!(build_request(manifest_parts(Some(99)), &registry).is_ok());
    }

    #[test]
    fn test_missing_file_part() {
        let mut parts = manifest_parts(None);
        parts.remove(0);

        let err = build_request(parts, &LayoutRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("layout-2-image-1"));
    }

    #[test]
    fn test_legacy_errors() {
        let registry = LayoutRegistry::builtin();

        let mut no_layout = legacy_parts();
        no_layout.remove(0);
        assert!(build_request(no_layout, &registry).is_err());

        let mut no_section = legacy_parts();
        no_section.remove(1);
        assert!(build_request(no_section, &registry).is_err());

        let mut bad_json = legacy_parts();
        bad_json[0] = FormPart::text("layout", "{width: 800");
        assert!(build_request(bad_json, &registry).is_err());

        let only_layout = vec![FormPart::text("layout", r#"{"width":800,"height":400}"#)];
        assert!(build_request(only_layout, &registry).is_err());
    }

    #[test]
    fn test_empty_file_name_falls_back_to_part_name() {
        let upload = FormPart::file("layout-2-image-0", "", vec![1]).into_upload();
        assert_eq!(upload.file_name, "layout-2-image-0");
    }
}
