//! Page boxes and the conversions between pointer space and page space.
//!
//! All rectangles here live in *content space*: the coordinate system of the
//! viewer's scrollable content, origin at its top-left, Y increasing
//! downward. Content space does not move when the user scrolls, so a rect
//! computed once stays valid until zoom, panel width or the document change.

use bevy::prelude::*;

use crate::placement::PlacedItem;

/// On-screen box of one rendered page, in content space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub page_index: usize,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Inclusive containment, so a drop exactly on the edge still hits.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    pub fn intersects(&self, other: Rect) -> bool {
        self.left <= other.max.x
            && self.right() >= other.min.x
            && self.top <= other.max.y
            && self.bottom() >= other.min.y
    }

    /// Express `point` relative to this page's top-left.
    pub fn hit(&self, point: Vec2) -> PageHit {
        PageHit {
            page_index: self.page_index,
            page_x: point.x - self.left,
            page_y: point.y - self.top,
            page_width: self.width,
            page_height: self.height,
        }
    }

    /// Like [`hit`](Self::hit) but clamped into the page box.
    pub fn clamped_hit(&self, point: Vec2) -> PageHit {
        let clamped = Vec2::new(
            point.x.clamp(self.left, self.right()),
            point.y.clamp(self.top, self.bottom()),
        );
        self.hit(clamped)
    }

    /// Euclidean distance from `point` to the nearest edge (0 when inside).
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let dx = (self.left - point.x).max(point.x - self.right()).max(0.0);
        let dy = (self.top - point.y).max(point.y - self.bottom()).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Map a fractional position on this page to content space.
    pub fn point_at(&self, fraction: Vec2) -> Vec2 {
        Vec2::new(self.left, self.top) + denormalize(fraction, self.width, self.height)
    }
}

/// A pointer position resolved onto one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageHit {
    pub page_index: usize,
    pub page_x: f32,
    pub page_y: f32,
    pub page_width: f32,
    pub page_height: f32,
}

impl PageHit {
    pub fn fraction(&self) -> Vec2 {
        normalize(self.page_x, self.page_y, self.page_width, self.page_height)
    }
}

/// Pixel offset within a page box to a fraction of the box.
pub fn normalize(page_x: f32, page_y: f32, page_width: f32, page_height: f32) -> Vec2 {
    let fx = if page_width > 0.0 { page_x / page_width } else { 0.0 };
    let fy = if page_height > 0.0 { page_y / page_height } else { 0.0 };
    Vec2::new(fx, fy)
}

/// Fraction of a page box back to a pixel offset within it.
pub fn denormalize(fraction: Vec2, page_width: f32, page_height: f32) -> Vec2 {
    Vec2::new(fraction.x * page_width, fraction.y * page_height)
}

/// First page whose box contains `point`.
pub fn locate_page(rects: &[PageRect], point: Vec2) -> Option<PageHit> {
    rects
        .iter()
        .find(|rect| rect.contains(point))
        .map(|rect| rect.hit(point))
}

/// Page whose box is closest to `point`; ties go to the earlier page.
pub fn nearest_page(rects: &[PageRect], point: Vec2) -> Option<&PageRect> {
    rects.iter().min_by(|a, b| {
        a.distance_to(point)
            .partial_cmp(&b.distance_to(point))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Current content-space position of a placed item, derived from the
/// item's fractional position and the page's *current* box.
pub fn project_to_screen(item: &PlacedItem, rects: &[PageRect]) -> Option<Vec2> {
    rects
        .iter()
        .find(|rect| rect.page_index == item.page_index)
        .map(|rect| rect.point_at(item.fraction()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(page_index: usize, top: f32, left: f32, width: f32, height: f32) -> PageRect {
        PageRect {
            page_index,
            top,
            left,
            width,
            height,
        }
    }

    fn item_at(page_index: usize, page_x: f32, page_y: f32, w: f32, h: f32) -> PlacedItem {
        PlacedItem {
            id: 0,
            text: "x".to_string(),
            page_index,
            page_x,
            page_y,
            page_width: w,
            page_height: h,
        }
    }

    #[test]
    fn test_normalize_roundtrip_same_box() {
        let boxes = [(300.0, 400.0), (612.0, 792.0), (123.4, 56.7)];
        for (w, h) in boxes {
            for (px, py) in [(0.0, 0.0), (w, h), (w * 0.37, h * 0.81), (1.0, h - 1.0)] {
                let back = denormalize(normalize(px, py, w, h), w, h);
                assert!((back.x - px).abs() < 1e-3, "x mismatch for {w}x{h}");
                assert!((back.y - py).abs() < 1e-3, "y mismatch for {w}x{h}");
            }
        }
    }

    #[test]
    fn test_normalize_zero_sized_box() {
        assert_eq!(normalize(5.0, 5.0, 0.0, 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_locate_page_first_match() {
        let rects = [rect(0, 0.0, 10.0, 100.0, 200.0), rect(1, 216.0, 10.0, 100.0, 200.0)];
        let hit = locate_page(&rects, Vec2::new(60.0, 316.0)).unwrap();
        assert_eq!(hit.page_index, 1);
        assert_eq!(hit.page_x, 50.0);
        assert_eq!(hit.page_y, 100.0);
        assert_eq!(hit.page_width, 100.0);
        assert_eq!(hit.page_height, 200.0);
    }

    #[test]
    fn test_locate_page_in_gap_is_none() {
        let rects = [rect(0, 0.0, 0.0, 100.0, 200.0), rect(1, 216.0, 0.0, 100.0, 200.0)];
        assert!(locate_page(&rects, Vec2::new(50.0, 208.0)).is_none());
        assert!(locate_page(&[], Vec2::ZERO).is_none());
    }

    #[test]
    fn test_edges_are_inside() {
        let r = rect(0, 10.0, 10.0, 100.0, 100.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(110.0, 110.0)));
        assert!(!r.contains(Vec2::new(110.1, 50.0)));
    }

    #[test]
    fn test_clamped_hit_stays_on_page() {
        let r = rect(0, 0.0, 0.0, 100.0, 200.0);
        let hit = r.clamped_hit(Vec2::new(-20.0, 500.0));
        assert_eq!(hit.page_x, 0.0);
        assert_eq!(hit.page_y, 200.0);
        assert_eq!(hit.fraction(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_nearest_page() {
        let rects = [rect(0, 0.0, 0.0, 100.0, 100.0), rect(1, 116.0, 0.0, 100.0, 100.0)];
        assert_eq!(nearest_page(&rects, Vec2::new(50.0, 112.0)).unwrap().page_index, 1);
        assert_eq!(nearest_page(&rects, Vec2::new(-40.0, 20.0)).unwrap().page_index, 0);
        assert!(nearest_page(&[], Vec2::ZERO).is_none());
    }

    #[test]
    fn test_project_follows_current_box() {
        // Dropped on a 300x400 box, now shown at twice the size further down
        let item = item_at(0, 150.0, 100.0, 300.0, 400.0);
        let rects = [rect(0, 50.0, 20.0, 600.0, 800.0)];
        let pos = project_to_screen(&item, &rects).unwrap();
        assert_eq!(pos, Vec2::new(20.0 + 300.0, 50.0 + 200.0));
    }

    #[test]
    fn test_project_is_idempotent() {
        let item = item_at(1, 33.3, 77.7, 250.0, 350.0);
        let rects = [rect(0, 0.0, 0.0, 250.0, 350.0), rect(1, 366.0, 12.0, 250.0, 350.0)];
        let first = project_to_screen(&item, &rects);
        let second = project_to_screen(&item, &rects);
        assert_eq!(first, second);
    }

    #[test]
    fn test_project_missing_page() {
        let item = item_at(4, 1.0, 1.0, 10.0, 10.0);
        assert!(project_to_screen(&item, &[rect(0, 0.0, 0.0, 10.0, 10.0)]).is_none());
    }

    #[test]
    fn test_intersects_viewport() {
        let r = rect(0, 100.0, 0.0, 50.0, 50.0);
        assert!(r.intersects(Rect::new(0.0, 120.0, 500.0, 400.0)));
        assert!(!r.intersects(Rect::new(0.0, 160.0, 500.0, 400.0)));
    }
}
