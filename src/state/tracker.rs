use std::collections::BTreeMap;

use tracing::debug;

use super::data::{Assignment, SelectedImage, Submission, SubmissionEntry};
use crate::layout::{Layout, Section, SectionKey};
use crate::{CollageError, Result};

/// Form state for one layout: which image goes into which section.
///
/// Also gates submission: one submission at a time, and only once every
/// section has an image.
#[derive(Debug, Clone)]
pub struct AssignmentTracker {
    layout: Layout,
    sections: Vec<Section>,
    assignments: BTreeMap<SectionKey, Assignment>,
    in_flight: bool,
}

impl AssignmentTracker {
    pub fn new(layout: Layout) -> Self {
        Self {
            sections: layout.sections(),
            layout,
            assignments: BTreeMap::new(),
            in_flight: false,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Insert or replace the image for a section
    pub fn assign(&mut self, key: SectionKey, image: SelectedImage) -> Result<()> {
        if self.in_flight {
            return Err(CollageError::SubmissionInFlight);
        }

        let section = self.section_for(key)?;
        debug!(%key, file = %image.file_name, "assigned image to section");
        self.assignments.insert(key, Assignment { image, section });
        Ok(())
    }

    pub fn get(&self, key: SectionKey) -> Option<&Assignment> {
        self.assignments.get(&key)
    }

    pub fn is_assigned(&self, key: SectionKey) -> bool {
        self.assignments.contains_key(&key)
    }

    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_complete(&self) -> bool {
        self.assignments.len() == self.sections.len()
            && self
                .layout
                .section_keys()
                .iter()
                .all(|key| self.assignments.contains_key(key))
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the submit button is enabled
    pub fn can_submit(&self) -> bool {
        self.is_complete() && !self.in_flight
    }

    /// Start a submission and hand out its payload
    pub fn begin_submission(&mut self) -> Result<Submission> {
        if self.in_flight {
            return Err(CollageError::SubmissionInFlight);
        }
        if !self.is_complete() {
            return Err(CollageError::Incomplete {
                assigned: self.assignments.len(),
                required: self.sections.len(),
            });
        }

        self.in_flight = true;

        let entries = self
            .assignments
            .iter()
            .map(|(key, assignment)| SubmissionEntry {
                key: *key,
                section: assignment.section,
                image: assignment.image.clone(),
            })
            .collect();

        Ok(Submission {
            layout_id: self.layout.id,
            canvas: self.layout.canvas(),
            entries,
        })
    }

    /// Close the in-flight submission.
    ///
    /// A successful submission starts over with an empty form; a failed one
    /// keeps every assignment so the user can retry.
    pub fn finish_submission(&mut self, succeeded: bool) {
        self.in_flight = false;
        if succeeded {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.assignments.clear();
        self.in_flight = false;
    }

    fn section_for(&self, key: SectionKey) -> Result<Section> {
        if key.layout_id != self.layout.id {
            return Err(CollageError::UnknownSection(key.to_string()));
        }
        self.sections
            .get(key.index)
            .copied()
            .ok_or_else(|| CollageError::UnknownSection(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutRegistry;

    fn tracker(layout_id: u32) -> AssignmentTracker {
        let registry = LayoutRegistry::builtin();
        AssignmentTracker::new(*registry.get(layout_id).unwrap())
    }

    fn image(name: &str) -> SelectedImage {
        SelectedImage::from_path(format!("/photos/{name}")).unwrap()
    }

    #[test]
    fn test_new_tracker_is_incomplete() {
        let tracker = tracker(2);
        assert_eq!(tracker.assigned_count(), 0);
        assert!(!tracker.is_complete());
        assert!(!tracker.can_submit());
    }

    #[test]
    fn test_partial_assignment_cannot_submit() {
        let mut tracker = tracker(2);
        tracker.assign(SectionKey::new(2, 0), image("a.png")).unwrap();

        assert!(tracker.is_assigned(SectionKey::new(2, 0)));
        assert!(!tracker.is_assigned(SectionKey::new(2, 1)));
        assert!(!tracker.is_complete());
        let err = tracker.begin_submission().unwrap_err();
        assert!(matches!(err, CollageError::Incomplete { assigned: 1, required: 2 }));
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_assign_replaces_existing_entry() {
        let mut tracker = tracker(2);
        let key = SectionKey::new(2, 1);
        tracker.assign(key, image("first.png")).unwrap();
        tracker.assign(key, image("second.png")).unwrap();

        assert_eq!(tracker.assigned_count(), 1);
        assert_eq!(tracker.get(key).unwrap().image.file_name, "second.png");
        assert_eq!(
            tracker.get(key).unwrap().section,
            Section { width: 400, height: 400, x: 400, y: 0 }
        );
    }

    #[test]
    fn test_rejects_foreign_and_out_of_range_keys() {
        let mut tracker = tracker(2);
        assert!(matches!(
            tracker.assign(SectionKey::new(3, 0), image("a.png")),
            Err(CollageError::UnknownSection(_))
        ));
        assert!(matches!(
            tracker.assign(SectionKey::new(2, 2), image("a.png")),
            Err(CollageError::UnknownSection(_))
        ));
        assert_eq!(tracker.assigned_count(), 0);
    }

    #[test]
    fn test_submission_is_single_flight() {
        let mut tracker = tracker(2);
        tracker.assign(SectionKey::new(2, 1), image("b.png")).unwrap();
        tracker.assign(SectionKey::new(2, 0), image("a.png")).unwrap();
        assert!(tracker.can_submit());

        let submission = tracker.begin_submission().unwrap();
        assert_eq!(submission.layout_id, 2);
        assert_eq!(submission.canvas.width, 800);
        assert_eq!(submission.canvas.height, 400);
        let keys: Vec<_> = submission.entries.iter().map(|entry| entry.key.index).collect();
        assert_eq!(keys, vec![0, 1]);

        assert!(tracker.in_flight());
        assert!(!tracker.can_submit());
        assert!(matches!(tracker.begin_submission(), Err(CollageError::SubmissionInFlight)));
        assert!(matches!(
            tracker.assign(SectionKey::new(2, 0), image("c.png")),
            Err(CollageError::SubmissionInFlight)
        ));
    }

    #[test]
    fn test_failed_submission_keeps_assignments() {
        let mut tracker = tracker(2);
        tracker.assign(SectionKey::new(2, 0), image("a.png")).unwrap();
        tracker.assign(SectionKey::new(2, 1), image("b.png")).unwrap();

        tracker.begin_submission().unwrap();
        tracker.finish_submission(false);

        assert!(!tracker.in_flight());
        assert_eq!(tracker.assigned_count(), 2);
        assert!(tracker.can_submit());
    }

    #[test]
    fn test_successful_submission_resets() {
        let mut tracker = tracker(6);
        for index in 0..4 {
            tracker.assign(SectionKey::new(6, index), image("strip.jpg")).unwrap();
        }

        tracker.begin_submission().unwrap();
        tracker.finish_submission(true);

        assert_eq!(tracker.assigned_count(), 0);
        assert!(!tracker.is_complete());
    }
}
