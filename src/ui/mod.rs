mod dialogs;
mod snippet_panel;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;
use crate::document::{DocumentLoadState, PendingOpenDialog};
use crate::export::ExportState;
use crate::viewer::canvas::viewer_canvas_ui;

/// Resource that tracks whether any modal dialog is currently open.
/// Panels check this to avoid taking input while a dialog or a native
/// file picker is showing.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block panel input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before the UI pass.
fn update_dialog_state(
    config_reset: Res<ConfigResetNotification>,
    load_state: Res<DocumentLoadState>,
    pending_open: Res<PendingOpenDialog>,
    export_state: Res<ExportState>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = config_reset.show
        || load_state.is_loading
        || load_state.error.is_some()
        || pending_open.task.is_some()
        || export_state.is_busy()
        || export_state.notice.is_some()
        || export_state.error.is_some();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            // Top and side panels must render before the central canvas
            // Use chain() to enforce ordering
            .add_systems(
                EguiPrimaryContextPass,
                (
                    toolbar::toolbar_ui,
                    snippet_panel::snippet_panel_ui,
                    viewer_canvas_ui,
                )
                    .chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Last: dialogs/overlays
                    dialogs::busy_indicator_ui,
                    dialogs::export_notice_ui,
                    dialogs::export_error_ui,
                    dialogs::load_error_ui,
                    dialogs::config_reset_notification_ui,
                )
                    .after(viewer_canvas_ui),
            )
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
