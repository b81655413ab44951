/// Collage layout geometry
///
/// This module handles:
/// - The `Section` rectangle model (layout-local pixels, origin top-left)
/// - `Layout`: a canvas size plus a pure rule for dividing it into sections
/// - `SectionKey`: the stable per-section identifier used by forms and trackers
/// - The built-in layout catalog (registry.rs)

pub mod registry;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub use registry::LayoutRegistry;

/// One rectangular region of a layout
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Section {
    #[serde(deserialize_with = "pixels")]
    pub width: u32,
    #[serde(deserialize_with = "pixels")]
    pub height: u32,
    #[serde(deserialize_with = "pixels")]
    pub x: u32,
    #[serde(deserialize_with = "pixels")]
    pub y: u32,
}

/// Reads a pixel count from any JSON number, so `400.0` is `400`.
/// Fractions are rounded to the nearest pixel.
pub fn pixels<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return Err(D::Error::custom(format!("{value} is not a pixel count")));
    }
    Ok(rounded as u32)
}

impl Section {
    /// Build a section from its left, right, top and bottom edges
    pub fn from_edges(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
            x: left,
            y: top,
        }
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True if the section lies entirely inside a `width` × `height` canvas
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && (px as f64) < self.right() as f64
            && (py as f64) < self.bottom() as f64
    }
}

/// Position `num / den` of the way along `total`, rounded down.
///
/// Every layout derives its edges through this helper so that two sections
/// sharing an edge compute exactly the same coordinate.
pub fn fraction(total: u32, num: u32, den: u32) -> u32 {
    (total as u64 * num as u64 / den as u64) as u32
}

/// A canvas size plus a deterministic rule for subdividing it into sections
#[derive(Clone, Copy)]
pub struct Layout {
    pub id: u32,
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    divide: fn(u32, u32) -> Vec<Section>,
}

impl Layout {
    pub const fn new(
        id: u32,
        name: &'static str,
        width: u32,
        height: u32,
        divide: fn(u32, u32) -> Vec<Section>,
    ) -> Self {
        Self { id, name, width, height, divide }
    }

    /// The sections of this layout at its own canvas size
    pub fn sections(&self) -> Vec<Section> {
        (self.divide)(self.width, self.height)
    }

    /// The same division rule applied to another canvas size
    pub fn sections_for(&self, width: u32, height: u32) -> Vec<Section> {
        (self.divide)(width, height)
    }

    pub fn section_count(&self) -> usize {
        self.sections().len()
    }

    pub fn section(&self, index: usize) -> Option<Section> {
        self.sections().get(index).copied()
    }

    pub fn section_keys(&self) -> Vec<SectionKey> {
        (0..self.section_count())
            .map(|index| SectionKey::new(self.id, index))
            .collect()
    }

    pub fn canvas(&self) -> CanvasSize {
        CanvasSize { width: self.width, height: self.height }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl PartialEq for Layout {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.width == other.width && self.height == other.height
    }
}

/// Overall canvas dimensions of a collage
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Serializable view of a layout for `GET /api/layouts`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayoutSummary {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub sections: Vec<Section>,
}

impl From<&Layout> for LayoutSummary {
    fn from(layout: &Layout) -> Self {
        Self {
            id: layout.id,
            name: layout.name.to_string(),
            width: layout.width,
            height: layout.height,
            sections: layout.sections(),
        }
    }
}

/// Identifies one section of one layout, e.g. `layout-2-image-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey {
    pub layout_id: u32,
    pub index: usize,
}

impl SectionKey {
    pub fn new(layout_id: u32, index: usize) -> Self {
        Self { layout_id, index }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout-{}-image-{}", self.layout_id, self.index)
    }
}

impl FromStr for SectionKey {
    type Err = crate::CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || crate::CollageError::invalid(format!("malformed section key '{s}'"));

        let rest = s.strip_prefix("layout-").ok_or_else(malformed)?;
        let (layout_id, index) = rest.split_once("-image-").ok_or_else(malformed)?;

        Ok(Self {
            layout_id: layout_id.parse().map_err(|_| malformed())?,
            index: index.parse().map_err(|_| malformed())?,
        })
    }
}
