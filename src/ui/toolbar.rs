use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::{AppConfig, DropFallback, SaveConfigRequest};
use crate::document::{request_open_dialog, CloseDocumentRequest, LoadedDocument, PendingOpenDialog};
use crate::export::{ExportRequest, ExportState};
use crate::paths;
use crate::placement::PlacedItems;
use crate::viewer::{ViewerState, ZoomRequest};

use super::DialogState;

fn toolbar_button(ui: &mut egui::Ui, label: &str, enabled: bool) -> egui::Response {
    ui.add_enabled(
        enabled,
        egui::Button::new(egui::RichText::new(label).size(14.0)).min_size(egui::vec2(0.0, 26.0)),
    )
}

/// Main toolbar: document, zoom and export controls
#[allow(clippy::too_many_arguments)]
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    document: Res<LoadedDocument>,
    placed: Res<PlacedItems>,
    viewer: Res<ViewerState>,
    export_state: Res<ExportState>,
    dialog: Res<DialogState>,
    mut config: ResMut<AppConfig>,
    mut pending_open: ResMut<PendingOpenDialog>,
    mut close_events: MessageWriter<CloseDocumentRequest>,
    mut zoom_events: MessageWriter<ZoomRequest>,
    mut export_events: MessageWriter<ExportRequest>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    let enabled = !dialog.any_modal_open;
    let loaded = document.is_loaded();

    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                if toolbar_button(ui, "Open PDF...", enabled).clicked() {
                    let start_dir = config
                        .data
                        .last_open_dir
                        .clone()
                        .filter(|dir| dir.is_dir())
                        .unwrap_or_else(paths::default_documents_dir);
                    request_open_dialog(&mut pending_open, start_dir);
                }
                if toolbar_button(ui, "Close", enabled && loaded)
                    .on_hover_text("Close the document and clear all snippets")
                    .clicked()
                {
                    close_events.write(CloseDocumentRequest);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                if toolbar_button(ui, "−", enabled && loaded).clicked() {
                    zoom_events.write(ZoomRequest::Out);
                }
                ui.label(format!("{:.0}%", viewer.zoom * 100.0));
                if toolbar_button(ui, "+", enabled && loaded).clicked() {
                    zoom_events.write(ZoomRequest::In);
                }
                if toolbar_button(ui, "Reset", enabled && loaded)
                    .on_hover_text("Reset zoom (Ctrl + scroll also zooms)")
                    .clicked()
                {
                    zoom_events.write(ZoomRequest::Reset);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let export_label = if export_state.is_busy() {
                    "Exporting..."
                } else {
                    "Export PDF"
                };
                if toolbar_button(ui, export_label, enabled)
                    .on_hover_text(format!("{} placed snippets", placed.len()))
                    .clicked()
                {
                    export_events.write(ExportRequest);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mut fallback = config.data.drop_fallback;
                    ui.add_enabled_ui(enabled, |ui| {
                        egui::ComboBox::from_id_salt("drop_fallback")
                            .selected_text(fallback.display_name())
                            .show_ui(ui, |ui| {
                                for option in DropFallback::all() {
                                    ui.selectable_value(&mut fallback, *option, option.display_name());
                                }
                            });
                    });
                    ui.label("Drops outside pages:");
                    if fallback != config.data.drop_fallback {
                        config.data.drop_fallback = fallback;
                        config.dirty = true;
                        save_events.write(SaveConfigRequest);
                    }

                    if let Some(doc) = document.current.as_ref() {
                        ui.separator();
                        ui.label(
                            egui::RichText::new(format!(
                                "{} ({} pages)",
                                doc.file_name,
                                document.page_count()
                            ))
                            .weak(),
                        )
                        .on_hover_text(doc.path.to_string_lossy());
                    }
                });
            });
        });

    Ok(())
}
