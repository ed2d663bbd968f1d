//! Centralized color theme for the application.
//!
//! This module provides all colors used throughout the viewer and panels.
//! Modify values here to change the application's color scheme.

use bevy_egui::egui::Color32;

// ============================================================================
// Viewer Colors
// ============================================================================

/// Backdrop behind the page column
pub const VIEWER_BACKGROUND: Color32 = Color32::from_rgb(58, 60, 66);

/// Blank sheet shown when no rendered preview exists
pub const PAGE_FILL: Color32 = Color32::from_rgb(250, 250, 248);

/// Drop shadow offset under each page
pub const PAGE_SHADOW: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 90);

/// Page number on blank sheets and the empty-viewer hint
pub const PAGE_NUMBER_TEXT: Color32 = Color32::from_rgb(150, 150, 150);

/// Outline of the page under a dragged snippet
pub const DROP_HIGHLIGHT: Color32 = Color32::from_rgb(51, 153, 255);

// ============================================================================
// Label Colors
// ============================================================================

/// Background of a placed snippet label
pub const LABEL_FILL: Color32 = Color32::from_rgba_premultiplied(255, 244, 180, 235);

pub const LABEL_STROKE: Color32 = Color32::from_rgb(200, 160, 40);

/// Dot marking the exact drop point
pub const LABEL_MARKER: Color32 = Color32::from_rgb(220, 60, 40);

// ============================================================================
// Panel Colors
// ============================================================================

/// Snippet rows in the side panel
pub const SNIPPET_ROW_FILL: Color32 = Color32::from_rgb(48, 52, 60);

/// Muted helper text
pub const HINT_TEXT: Color32 = Color32::from_rgb(140, 140, 140);

/// Success messages
pub const SUCCESS_TEXT: Color32 = Color32::from_rgb(100, 200, 100);

/// Errors shown in dialogs
pub const ERROR_TEXT: Color32 = Color32::from_rgb(230, 80, 80);

/// Convert a 0..=1 rgb triple (as stored in config) to an egui color
pub fn rgb_to_color32(rgb: [f32; 3]) -> Color32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(rgb_to_color32([0.0, 0.0, 0.0]), Color32::BLACK);
        assert_eq!(rgb_to_color32([1.0, 1.0, 1.0]), Color32::WHITE);
        assert_eq!(rgb_to_color32([2.0, -1.0, 0.5]), Color32::from_rgb(255, 0, 128));
    }
}
