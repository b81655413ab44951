//! Desktop presentation layer
//!
//! - `canvas`: a layout drawn as clickable section boxes
//! - `Message`: events of the desktop application

pub mod canvas;

use std::path::PathBuf;

use crate::layout::SectionKey;
use crate::state::AssignmentTracker;
use crate::store::AssetDescriptor;

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked an empty or assigned section box
    PickImage(SectionKey),
    /// User clicked "Upload" under a layout
    Submit(u32),
    /// Background upload finished for a layout
    SubmitFinished(u32, Result<AssetDescriptor, String>),
    /// Switch to the gallery page and refresh it
    ShowGallery,
    /// Switch back to the layout picker
    ShowLayouts,
    GalleryLoaded(Result<Vec<AssetDescriptor>, String>),
    /// Thumbnail bytes of one gallery entry, keyed by public id
    PreviewLoaded(String, Result<Vec<u8>, String>),
}

/// Assigned images of a layout in section order
pub fn section_previews(tracker: &AssignmentTracker) -> Vec<(SectionKey, PathBuf)> {
    let layout_id = tracker.layout().id;
    (0..tracker.sections().len())
        .map(|index| SectionKey::new(layout_id, index))
        .filter_map(|key| tracker.get(key).map(|assignment| (key, assignment.image.path.clone())))
        .collect()
}

/// Drop the assignments of every form that is not being uploaded
pub fn discard_drafts(trackers: &mut [AssignmentTracker]) {
    for tracker in trackers.iter_mut().filter(|tracker| !tracker.in_flight()) {
        tracker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutRegistry;
    use crate::state::SelectedImage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_previews_follow_section_order() {
        let registry = LayoutRegistry::builtin();
        let mut tracker = AssignmentTracker::new(*registry.get(6).unwrap());
        for index in [3, 1] {
            let path = format!("/photos/{index}.jpg");
            tracker
                .assign(SectionKey::new(6, index), SelectedImage::from_path(path).unwrap())
                .unwrap();
        }

        assert_eq!(
            section_previews(&tracker),
            vec![
                (SectionKey::new(6, 1), PathBuf::from("/photos/1.jpg")),
                (SectionKey::new(6, 3), PathBuf::from("/photos/3.jpg")),
            ]
        );
    }

    #[test]
    fn test_discard_drafts_spares_uploads_in_flight() {
        let registry = LayoutRegistry::builtin();
        let mut trackers: Vec<_> = [1, 2]
            .into_iter()
            .map(|id| AssignmentTracker::new(*registry.get(id).unwrap()))
            .collect();
        for tracker in &mut trackers {
            let layout_id = tracker.layout().id;
            for index in 0..tracker.sections().len() {
                let image = SelectedImage::from_path(format!("/photos/{layout_id}-{index}.png")).unwrap();
                tracker.assign(SectionKey::new(layout_id, index), image).unwrap();
            }
        }
        trackers[1].begin_submission().unwrap();

        discard_drafts(&mut trackers);

        assert_eq!(trackers[0].assigned_count(), 0);
        assert!(trackers[1].in_flight());
        assert_eq!(trackers[1].assigned_count(), 2);
    }
}
