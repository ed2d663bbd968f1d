use bevy::prelude::*;

use crate::viewer::{normalize, PageHit};

/// A snippet bound to a position on one page.
///
/// The pixel fields record the page box at drop time; only the ratio
/// `page_x / page_width`, `page_y / page_height` is meaningful afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub id: u64,
    pub text: String,
    pub page_index: usize,
    pub page_x: f32,
    pub page_y: f32,
    pub page_width: f32,
    pub page_height: f32,
}

impl PlacedItem {
    pub fn fraction(&self) -> Vec2 {
        normalize(self.page_x, self.page_y, self.page_width, self.page_height)
    }
}

/// Items placed on the canvas, in drop order
#[derive(Resource, Default, Debug)]
pub struct PlacedItems {
    items: Vec<PlacedItem>,
    next_id: u64,
}

impl PlacedItems {
    pub fn push(&mut self, text: String, hit: PageHit) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(PlacedItem {
            id,
            text,
            page_index: hit.page_index,
            page_x: hit.page_x,
            page_y: hit.page_y,
            page_width: hit.page_width,
            page_height: hit.page_height,
        });
        id
    }

    pub fn remove(&mut self, id: u64) -> Option<PlacedItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Owned copy for handing to a background task
    pub fn snapshot(&self) -> Vec<PlacedItem> {
        self.items.clone()
    }
}
