//! Page viewer and coordinate mapping.
//!
//! The viewer paints the document's pages in a scroll area and reports
//! drops onto it. The mapper translates between content space and
//! per-page positions; see [`geometry`] for the coordinate conventions.

pub mod canvas;
mod geometry;
mod layout;
mod mapper;

use bevy::prelude::*;

use crate::config::AppConfig;

pub use geometry::{normalize, PageHit, PageRect};
pub use mapper::{CoordinateMapper, ViewerState, ViewportChange, ViewportChanged};

/// Zoom actions from the toolbar
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomRequest {
    In,
    Out,
    Reset,
}

fn apply_zoom_requests(
    mut events: MessageReader<ZoomRequest>,
    config: Res<AppConfig>,
    mut viewer: ResMut<ViewerState>,
    mut viewport: MessageWriter<ViewportChanged>,
) {
    let mut changed = false;
    for event in events.read() {
        changed |= match event {
            ZoomRequest::In => viewer.zoom_in(),
            ZoomRequest::Out => viewer.zoom_out(),
            ZoomRequest::Reset => viewer.set_zoom(config.data.default_zoom),
        };
    }
    if changed {
        viewport.write(ViewportChanged {
            change: ViewportChange::Zoom,
        });
    }
}

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerState>()
            .init_resource::<CoordinateMapper>()
            .add_message::<ViewportChanged>()
            .add_message::<ZoomRequest>()
            .add_systems(
                Update,
                (
                    apply_zoom_requests.run_if(on_message::<ZoomRequest>),
                    mapper::refresh_page_rects,
                )
                    .chain(),
            );
    }
}
