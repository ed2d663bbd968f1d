//! Modal windows: notices, errors and the busy indicator.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::ConfigResetNotification;
use crate::document::{DocumentLoadState, PagePreviews};
use crate::export::{ExportRequest, ExportState, OpenExportedRequest};
use crate::theme;

fn centered_window(title: &str) -> egui::Window<'static> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

/// Shows a spinner while a document loads or an export runs
pub fn busy_indicator_ui(
    mut contexts: EguiContexts,
    load_state: Res<DocumentLoadState>,
    export_state: Res<ExportState>,
    previews: Res<PagePreviews>,
) -> Result {
    let description = if load_state.is_loading {
        Some("Loading PDF...")
    } else if let Some(stage) = export_state.stage_description() {
        Some(stage)
    } else if previews.is_rendering() {
        Some("Rendering pages...")
    } else {
        None
    };
    let Some(description) = description else {
        return Ok(());
    };

    centered_window("Working").title_bar(false).show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(description);
        });
    });

    Ok(())
}

/// Export outcome notice, with "Open" after a successful save
pub fn export_notice_ui(
    mut contexts: EguiContexts,
    mut export_state: ResMut<ExportState>,
    mut open_events: MessageWriter<OpenExportedRequest>,
) -> Result {
    let Some(notice) = export_state.notice.clone() else {
        return Ok(());
    };

    let mut dismiss = false;
    centered_window("Export").show(contexts.ctx_mut()?, |ui| {
        if notice.saved_path.is_some() {
            ui.colored_label(theme::SUCCESS_TEXT, &notice.message);
        } else {
            ui.label(&notice.message);
        }
        if let Some(path) = &notice.saved_path {
            ui.label(egui::RichText::new(path.to_string_lossy()).weak());
        }
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if let Some(path) = &notice.saved_path
                && ui.button("Open").clicked()
            {
                open_events.write(OpenExportedRequest { path: path.clone() });
                dismiss = true;
            }
            if ui.button("OK").clicked() {
                dismiss = true;
            }
        });
    });

    if dismiss {
        export_state.notice = None;
    }
    Ok(())
}

/// Generic export failure with a retry action
pub fn export_error_ui(
    mut contexts: EguiContexts,
    mut export_state: ResMut<ExportState>,
    mut export_events: MessageWriter<ExportRequest>,
) -> Result {
    let Some(message) = export_state.error.clone() else {
        return Ok(());
    };

    centered_window("Export Failed").show(contexts.ctx_mut()?, |ui| {
        ui.colored_label(theme::ERROR_TEXT, message);
        ui.label(egui::RichText::new("See the log for details.").weak());
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Retry").clicked() {
                export_state.error = None;
                export_events.write(ExportRequest);
            }
            if ui.button("Close").clicked() {
                export_state.error = None;
            }
        });
    });

    Ok(())
}

pub fn load_error_ui(
    mut contexts: EguiContexts,
    mut load_state: ResMut<DocumentLoadState>,
) -> Result {
    let Some(error) = load_state.error.clone() else {
        return Ok(());
    };

    egui::Window::new("Load Error")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(theme::ERROR_TEXT, error);
            });
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                load_state.error = None;
            }
        });

    Ok(())
}

/// One-time notice after a corrupt config file was replaced with defaults
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    centered_window("Settings Reset").show(contexts.ctx_mut()?, |ui| {
        ui.label("Your settings file could not be read and was reset to defaults.");
        if let Some(reason) = &notification.reason {
            ui.label(egui::RichText::new(reason).weak());
        }
        ui.add_space(8.0);
        if ui.button("OK").clicked() {
            notification.show = false;
        }
    });

    Ok(())
}
