/// Client-side selection state
///
/// This module handles the per-layout form state of the desktop client:
/// - Selected images and their target sections (data.rs)
/// - The assignment tracker that gates submission (tracker.rs)

pub mod data;
pub mod tracker;

pub use data::{Assignment, SelectedImage, Submission, SubmissionEntry};
pub use tracker::AssignmentTracker;
