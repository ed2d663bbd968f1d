//! Full-document page layout.
//!
//! Pages are stacked top to bottom, each scaled by the zoom factor (one PDF
//! point is one logical pixel at zoom 1.0) and centred in the available
//! width. The layout covers every page up front, whether or not it is
//! currently painted.

use bevy::prelude::*;

use crate::constants::{PAGE_GAP, VIEWER_MARGIN};
use crate::document::PageSize;

use super::geometry::PageRect;

/// Lay out all pages for the given zoom and viewer width.
pub fn compute_page_rects(pages: &[PageSize], zoom: f32, content_width: f32) -> Vec<PageRect> {
    let mut rects = Vec::with_capacity(pages.len());
    let mut top = VIEWER_MARGIN;

    for (page_index, size) in pages.iter().enumerate() {
        let width = size.width * zoom;
        let height = size.height * zoom;
        let left = ((content_width - width) / 2.0).max(VIEWER_MARGIN);

        rects.push(PageRect {
            page_index,
            top,
            left,
            width,
            height,
        });
        top += height + PAGE_GAP;
    }

    rects
}

/// Size the scrollable content needs to hold every page plus margins.
pub fn content_size(rects: &[PageRect]) -> Vec2 {
    let right = rects.iter().map(PageRect::right).fold(0.0, f32::max);
    let bottom = rects.iter().map(PageRect::bottom).fold(0.0, f32::max);
    Vec2::new(right + VIEWER_MARGIN, bottom + VIEWER_MARGIN)
}
