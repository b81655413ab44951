use std::collections::HashMap;

use super::{fraction, Layout, Section};
use crate::{CollageError, Result};

/// The immutable layout catalog.
///
/// Built once at startup and shared (behind an `Arc`) with whatever needs it.
/// Catalog order is preserved for display; lookups go through an id index.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: Vec<Layout>,
    by_id: HashMap<u32, usize>,
}

impl LayoutRegistry {
    /// Create a registry, rejecting catalogs that reuse an id
    pub fn new(layouts: Vec<Layout>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(layouts.len());

        for (position, layout) in layouts.iter().enumerate() {
            if by_id.insert(layout.id, position).is_some() {
                return Err(CollageError::DuplicateLayoutId(layout.id));
            }
        }

        Ok(Self { layouts, by_id })
    }

    /// The six predefined layouts
    pub fn builtin() -> Self {
        Self::new(builtin_layouts()).expect("built-in layout ids are unique")
    }

    pub fn get(&self, id: u32) -> Option<&Layout> {
        self.by_id.get(&id).map(|&position| &self.layouts[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layout> {
        self.layouts.iter()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

/// Pre-defined layouts. Ids must stay unique.
pub fn builtin_layouts() -> Vec<Layout> {
    vec![
        Layout::new(1, "Tall right column", 800, 800, tall_right_column),
        Layout::new(2, "Side by side", 800, 400, side_by_side),
        Layout::new(3, "Two over one", 800, 800, two_over_one),
        Layout::new(4, "One over two", 800, 800, one_over_two),
        Layout::new(5, "Column and two rows", 800, 600, column_and_two_rows),
        Layout::new(6, "Four strips", 800, 800, four_strips),
    ]
}

/// Left column split 40/60, right half spans the full height
pub fn tall_right_column(width: u32, height: u32) -> Vec<Section> {
    let mid_x = fraction(width, 1, 2);
    let split_y = fraction(height, 2, 5);
    vec![
        Section::from_edges(0, mid_x, 0, split_y),
        Section::from_edges(mid_x, width, 0, height),
        Section::from_edges(0, mid_x, split_y, height),
    ]
}

pub fn side_by_side(width: u32, height: u32) -> Vec<Section> {
    let mid_x = fraction(width, 1, 2);
    vec![
        Section::from_edges(0, mid_x, 0, height),
        Section::from_edges(mid_x, width, 0, height),
    ]
}

pub fn two_over_one(width: u32, height: u32) -> Vec<Section> {
    let mid_x = fraction(width, 1, 2);
    let mid_y = fraction(height, 1, 2);
    vec![
        Section::from_edges(0, mid_x, 0, mid_y),
        Section::from_edges(mid_x, width, 0, mid_y),
        Section::from_edges(0, width, mid_y, height),
    ]
}

pub fn one_over_two(width: u32, height: u32) -> Vec<Section> {
    let mid_x = fraction(width, 1, 2);
    let mid_y = fraction(height, 1, 2);
    vec![
        Section::from_edges(0, width, 0, mid_y),
        Section::from_edges(0, mid_x, mid_y, height),
        Section::from_edges(mid_x, width, mid_y, height),
    ]
}

/// 40% column on the left, the remaining 60% split into two rows
pub fn column_and_two_rows(width: u32, height: u32) -> Vec<Section> {
    let split_x = fraction(width, 2, 5);
    let mid_y = fraction(height, 1, 2);
    vec![
        Section::from_edges(0, split_x, 0, height),
        Section::from_edges(split_x, width, 0, mid_y),
        Section::from_edges(split_x, width, mid_y, height),
    ]
}

pub fn four_strips(width: u32, height: u32) -> Vec<Section> {
    (0..4)
        .map(|strip| {
            Section::from_edges(0, width, fraction(height, strip, 4), fraction(height, strip + 1, 4))
        })
        .collect()
}
