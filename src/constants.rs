//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1400.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Vertical gap between stacked pages in the viewer, in screen pixels
pub const PAGE_GAP: f32 = 16.0;

/// Margin kept around the page column inside the viewer
pub const VIEWER_MARGIN: f32 = 24.0;

/// Zoom bounds and step for the page viewer
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Number of placed items written per batch before yielding during export
pub const EXPORT_BATCH_SIZE: usize = 8;

/// Suffix appended to the source file stem when suggesting an export name
pub const EXPORT_SUFFIX: &str = "_annotated";

/// Resource name used for the stamped font inside page resources
pub const STAMP_FONT_KEY: &str = "FSnip";

/// Raster scale used for page previews (only with the `render` feature)
#[cfg(feature = "render")]
pub const PREVIEW_SCALE: f32 = 1.5;
