use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::{AppConfig, SaveConfigRequest};
use crate::document::LoadedDocument;
use crate::placement::PlacedItems;
use crate::snippets::{SnippetInput, SnippetList};
use crate::theme;

use super::DialogState;

/// Left side panel: snippet entry, the pending list and stamp style
#[allow(clippy::too_many_arguments)]
pub fn snippet_panel_ui(
    mut contexts: EguiContexts,
    mut input: ResMut<SnippetInput>,
    mut list: ResMut<SnippetList>,
    placed: Res<PlacedItems>,
    document: Res<LoadedDocument>,
    dialog: Res<DialogState>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    egui::SidePanel::left("snippet_panel")
        .default_width(260.0)
        .resizable(true)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_enabled_ui(!dialog.any_modal_open, |ui| {
                ui.heading("Snippets");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut input.buffer)
                            .hint_text("Type a snippet")
                            .desired_width(ui.available_width() - 48.0),
                    );
                    let submitted =
                        field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let clicked = ui.button("Add").clicked();
                    if (submitted || clicked) && input.commit(&mut list) && submitted {
                        field.request_focus();
                    }
                });

                ui.add_space(8.0);
                ui.separator();

                if list.is_empty() {
                    ui.label(egui::RichText::new("No pending snippets").color(theme::HINT_TEXT));
                } else if !document.is_loaded() {
                    ui.label(
                        egui::RichText::new("Open a PDF, then drag snippets onto its pages")
                            .color(theme::HINT_TEXT),
                    );
                }

                let mut delete_index = None;
                egui::ScrollArea::vertical()
                    .auto_shrink([false, true])
                    .max_height(ui.available_height() - 120.0)
                    .show(ui, |ui| {
                        for (index, snippet) in list.iter().enumerate() {
                            ui.horizontal(|ui| {
                                if let Some(payload) = list.begin_drag(index) {
                                    ui.dnd_drag_source(
                                        egui::Id::new(("snippet", index, &snippet.text)),
                                        payload,
                                        |ui| {
                                            egui::Frame::new()
                                                .fill(theme::SNIPPET_ROW_FILL)
                                                .corner_radius(3.0)
                                                .inner_margin(egui::Margin::symmetric(6, 3))
                                                .show(ui, |ui| {
                                                    ui.label(&snippet.text);
                                                });
                                        },
                                    );
                                }
                                if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                    delete_index = Some(index);
                                }
                            });
                        }
                    });

                if let Some(index) = delete_index
                    && let Err(e) = list.delete(index)
                {
                    warn!("{}", e);
                }

                ui.separator();
                ui.label(format!("{} placed on pages", placed.len()));

                ui.add_space(8.0);
                ui.collapsing("Stamp style", |ui| {
                    let mut style = config.data.export;
                    ui.horizontal(|ui| {
                        ui.label("Font size:");
                        ui.add(
                            egui::DragValue::new(&mut style.font_size)
                                .range(4.0..=72.0)
                                .speed(0.5)
                                .suffix(" pt"),
                        );
                    });
                    ui.horizontal(|ui| {
                        ui.label("Color:");
                        ui.color_edit_button_rgb(&mut style.color);
                    });
                    if style != config.data.export {
                        config.data.export = style;
                        config.dirty = true;
                        save_events.write(SaveConfigRequest);
                    }
                });
            });
        });

    Ok(())
}

