//! Coordinate mapper: the page-box cache and drop resolution.

use bevy::prelude::*;

use crate::config::DropFallback;
use crate::constants::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use crate::document::LoadedDocument;
use crate::placement::PlacedItem;

use super::geometry::{self, PageHit, PageRect};
use super::layout::compute_page_rects;

/// Why the viewport changed; logged, and used to decide what to re-measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportChange {
    Scroll,
    Zoom,
    Resize,
    PageMount,
    Invalidate,
}

/// Emitted by the viewer whenever page boxes may have moved.
#[derive(Message, Debug, Clone, Copy)]
pub struct ViewportChanged {
    pub change: ViewportChange,
}

/// Which resolution step produced a drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTier {
    /// Hit a page painted in the current frame
    Live,
    /// Hit a page from the full-document layout cache
    Cached,
    /// No page contained the point; the fallback policy chose one
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub hit: PageHit,
    pub tier: ResolveTier,
}

/// Zoom and measured width of the viewer
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub zoom: f32,
    /// Width of the scroll area's content, in logical pixels
    pub content_width: f32,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            content_width: 0.0,
        }
    }
}

impl ViewerState {
    /// Set zoom, clamped to the supported range. Returns true if it changed.
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if (clamped - self.zoom).abs() < f32::EPSILON {
            return false;
        }
        self.zoom = clamped;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }
}

/// Cached page boxes for the current document.
///
/// `cached` is the full-document layout, rebuilt when a [`ViewportChanged`]
/// message arrives or on the first refresh after [`invalidate`](Self::invalidate).
/// `live` holds the boxes the viewer actually painted in the latest frame.
#[derive(Resource, Default, Debug)]
pub struct CoordinateMapper {
    cached: Vec<PageRect>,
    live: Vec<PageRect>,
    stale: bool,
}

impl CoordinateMapper {
    pub fn page_rects(&self) -> &[PageRect] {
        &self.cached
    }

    pub fn set_page_rects(&mut self, rects: Vec<PageRect>) {
        self.cached = rects;
        self.stale = false;
    }

    pub fn set_live_rects(&mut self, rects: Vec<PageRect>) {
        self.live = rects;
    }

    /// Drop every cached box; the next refresh recomputes from scratch.
    pub fn invalidate(&mut self) {
        self.cached.clear();
        self.live.clear();
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn locate_page(&self, point: Vec2) -> Option<PageHit> {
        geometry::locate_page(&self.cached, point)
    }

    /// Resolve a drop point (content space) to a page.
    ///
    /// Painted pages are tried first, then the full layout, then the
    /// fallback policy. `None` only when the policy rejects the drop or no
    /// page exists at all.
    pub fn resolve_drop_target(&self, point: Vec2, fallback: DropFallback) -> Option<DropTarget> {
        if let Some(hit) = geometry::locate_page(&self.live, point) {
            return Some(DropTarget {
                hit,
                tier: ResolveTier::Live,
            });
        }

        if let Some(hit) = self.locate_page(point) {
            return Some(DropTarget {
                hit,
                tier: ResolveTier::Cached,
            });
        }

        let rect = match fallback {
            DropFallback::Reject => return None,
            DropFallback::FirstPage => self
                .cached
                .iter()
                .find(|r| r.page_index == 0)
                .or_else(|| self.live.iter().find(|r| r.page_index == 0)),
            DropFallback::Nearest => geometry::nearest_page(&self.cached, point)
                .or_else(|| geometry::nearest_page(&self.live, point)),
        }?;

        Some(DropTarget {
            hit: rect.clamped_hit(point),
            tier: ResolveTier::Fallback,
        })
    }

    pub fn project_to_screen(&self, item: &PlacedItem) -> Option<Vec2> {
        geometry::project_to_screen(item, &self.cached)
    }
}

/// Rebuild the page-box cache after the viewer signalled a change.
pub fn refresh_page_rects(
    mut events: MessageReader<ViewportChanged>,
    document: Res<LoadedDocument>,
    viewer: Res<ViewerState>,
    mut mapper: ResMut<CoordinateMapper>,
) {
    let change = match events.read().last() {
        Some(event) => event.change,
        // An invalidated cache is rebuilt without waiting for the viewer
        None if mapper.is_stale() && document.is_loaded() => ViewportChange::Invalidate,
        None => return,
    };

    match document.pages() {
        Some(pages) => {
            let rects = compute_page_rects(pages, viewer.zoom, viewer.content_width);
            debug!("Recomputed {} page rects after {:?}", rects.len(), change);
            mapper.set_page_rects(rects);
        }
        None => mapper.invalidate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(page_index: usize, top: f32) -> PageRect {
        PageRect {
            page_index,
            top,
            left: 0.0,
            width: 300.0,
            height: 400.0,
        }
    }

    fn two_page_mapper() -> CoordinateMapper {
        let mut mapper = CoordinateMapper::default();
        mapper.set_page_rects(vec![rect(0, 0.0), rect(1, 420.0)]);
        mapper
    }

    #[test]
    fn test_live_tier_wins() {
        let mut mapper = two_page_mapper();
        mapper.set_live_rects(vec![rect(1, 420.0)]);
        let target = mapper
            .resolve_drop_target(Vec2::new(150.0, 620.0), DropFallback::Reject)
            .unwrap();
        assert_eq!(target.tier, ResolveTier::Live);
        assert_eq!(target.hit.page_index, 1);
        assert_eq!(target.hit.page_y, 200.0);
    }

    #[test]
    fn test_cached_tier_covers_unpainted_pages() {
        let mut mapper = two_page_mapper();
        mapper.set_live_rects(vec![rect(0, 0.0)]);
        let target = mapper
            .resolve_drop_target(Vec2::new(10.0, 500.0), DropFallback::Reject)
            .unwrap();
        assert_eq!(target.tier, ResolveTier::Cached);
        assert_eq!(target.hit.page_index, 1);
    }

    #[test]
    fn test_fallback_first_page_clamps() {
        let mapper = two_page_mapper();
        let target = mapper
            .resolve_drop_target(Vec2::new(150.0, 410.0), DropFallback::FirstPage)
            .unwrap();
        assert_eq!(target.tier, ResolveTier::Fallback);
        assert_eq!(target.hit.page_index, 0);
        assert_eq!(target.hit.page_x, 150.0);
        assert_eq!(target.hit.page_y, 400.0);
    }

    #[test]
    fn test_fallback_nearest_page() {
        let mapper = two_page_mapper();
        let target = mapper
            .resolve_drop_target(Vec2::new(150.0, 415.0), DropFallback::Nearest)
            .unwrap();
        assert_eq!(target.hit.page_index, 1);
        assert_eq!(target.hit.page_y, 0.0);
    }

    #[test]
    fn test_fallback_reject() {
        let mapper = two_page_mapper();
        assert!(mapper
            .resolve_drop_target(Vec2::new(150.0, 410.0), DropFallback::Reject)
            .is_none());
    }

    #[test]
    fn test_no_pages_no_target() {
        let mapper = CoordinateMapper::default();
        assert!(mapper
            .resolve_drop_target(Vec2::ZERO, DropFallback::FirstPage)
            .is_none());
    }

    #[test]
    fn test_invalidate_clears_cache() {
        let mut mapper = two_page_mapper();
        mapper.invalidate();
        assert!(mapper.is_stale());
        assert!(mapper.page_rects().is_empty());
        assert!(mapper.locate_page(Vec2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewer = ViewerState::default();
        assert!(viewer.set_zoom(100.0));
        assert_eq!(viewer.zoom, MAX_ZOOM);
        assert!(!viewer.zoom_in());
        assert!(viewer.set_zoom(0.0));
        assert_eq!(viewer.zoom, MIN_ZOOM);
        assert!(!viewer.zoom_out());
    }
}
