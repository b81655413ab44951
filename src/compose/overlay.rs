//! Overlay instructions: where the store should draw each uploaded image.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::Section;

/// How the overlay is fitted into its box
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Crop {
    /// Scale to cover the box, cropping the excess
    #[default]
    Fill,
}

/// Which corner of the box `x`/`y` refer to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    #[default]
    NorthWest,
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crop::Fill => f.write_str("fill"),
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gravity::NorthWest => f.write_str("north_west"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OverlayInstruction {
    /// Public id of the uploaded section image
    pub overlay: String,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub crop: Crop,
    pub gravity: Gravity,
    /// Stacking order, lowest drawn first
    pub z_index: u32,
}

impl OverlayInstruction {
    /// Fill `section`, anchored at its top-left corner
    pub fn fill(overlay: impl Into<String>, section: &Section, z_index: u32) -> Self {
        Self {
            overlay: overlay.into(),
            width: section.width,
            height: section.height,
            x: section.x,
            y: section.y,
            crop: Crop::Fill,
            gravity: Gravity::NorthWest,
            z_index,
        }
    }

    /// One transformation component, parameters in alphabetical order.
    ///
    /// Cloudinary refers to layers in folders with `:` instead of `/`.
    pub fn component(&self) -> String {
        format!(
            "c_{},g_{},h_{},l_{},w_{},x_{},y_{}",
            self.crop,
            self.gravity,
            self.height,
            self.overlay.replace('/', ":"),
            self.width,
            self.x,
            self.y
        )
    }
}

/// Chain the overlays into a transformation string, bottom layer first
pub fn transformation_string(overlays: &[OverlayInstruction]) -> String {
    let mut ordered: Vec<&OverlayInstruction> = overlays.iter().collect();
    ordered.sort_by_key(|overlay| overlay.z_index);

    ordered
        .iter()
        .map(|overlay| overlay.component())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_instruction_json() {
        let section = Section { width: 400, height: 400, x: 400, y: 0 };
        let overlay = OverlayInstruction::fill("abc", &section, 1);

        assert_eq!(
            serde_json::to_value(&overlay).unwrap(),
            json!({
                "overlay": "abc",
                "width": 400,
                "height": 400,
                "x": 400,
                "y": 0,
                "crop": "fill",
                "gravity": "north_west",
                "z_index": 1
            })
        );
    }

    #[test]
    fn test_transformation_follows_z_index() {
        let left = Section { width: 400, height: 400, x: 0, y: 0 };
        let right = Section { width: 400, height: 400, x: 400, y: 0 };
        let overlays = vec![
            OverlayInstruction::fill("collages/right", &right, 1),
            OverlayInstruction::fill("left", &left, 0),
        ];

        assert_eq!(
            transformation_string(&overlays),
            "c_fill,g_north_west,h_400,l_left,w_400,x_0,y_0/\
             c_fill,g_north_west,h_400,l_collages:right,w_400,x_400,y_0"
        );
    }

    #[test]
    fn test_empty_transformation() {
        assert_eq!(transformation_string(&[]), "");
    }
}
