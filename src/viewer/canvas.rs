//! The central page canvas.
//!
//! Paints only the pages intersecting the visible viewport and hands their
//! boxes to the mapper as live rects. Snippets released over the canvas are
//! reported as [`SnippetDropped`] with the pointer in content space.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::AppConfig;
use crate::document::{LoadedDocument, PagePreviews};
use crate::placement::{PlacedItems, RemovePlacedItemRequest, SnippetDropped};
use crate::snippets::SnippetPayload;
use crate::theme;

use super::geometry::PageRect;
use super::layout::content_size;
use super::mapper::{CoordinateMapper, ViewerState, ViewportChange, ViewportChanged};

/// Height reserved for a label; labels sit on the drop point's baseline
const LABEL_HEIGHT: f32 = 22.0;
const LABEL_MAX_WIDTH: f32 = 320.0;

/// Scroll offset seen in the previous frame
#[derive(Default)]
pub struct CanvasMemory {
    last_offset: Option<egui::Vec2>,
}

fn to_screen(origin: egui::Pos2, rect: &PageRect) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(rect.left, rect.top),
        egui::vec2(rect.width, rect.height),
    )
}

fn paint_page(
    painter: &egui::Painter,
    screen: egui::Rect,
    page_index: usize,
    previews: &PagePreviews,
) {
    painter.rect_filled(
        screen.translate(egui::vec2(2.0, 3.0)),
        0.0,
        theme::PAGE_SHADOW,
    );
    if let Some(texture) = previews.get(page_index) {
        painter.image(
            texture.id(),
            screen,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    } else {
        painter.rect_filled(screen, 0.0, theme::PAGE_FILL);
        painter.text(
            screen.center(),
            egui::Align2::CENTER_CENTER,
            format!("Page {}", page_index + 1),
            egui::FontId::proportional(18.0),
            theme::PAGE_NUMBER_TEXT,
        );
    }
}

/// Renders the page viewer in the central panel
#[allow(clippy::too_many_arguments)]
pub fn viewer_canvas_ui(
    mut contexts: EguiContexts,
    document: Res<LoadedDocument>,
    previews: Res<PagePreviews>,
    placed: Res<PlacedItems>,
    config: Res<AppConfig>,
    mut viewer: ResMut<ViewerState>,
    mut mapper: ResMut<CoordinateMapper>,
    mut memory: Local<CanvasMemory>,
    mut drops: MessageWriter<SnippetDropped>,
    mut removals: MessageWriter<RemovePlacedItemRequest>,
    mut viewport: MessageWriter<ViewportChanged>,
) -> Result {
    let label_color = theme::rgb_to_color32(config.data.export.color);
    let ctx = contexts.ctx_mut()?;
    let frame = egui::Frame::central_panel(&ctx.style()).fill(theme::VIEWER_BACKGROUND);

    egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
        if !document.is_loaded() {
            memory.last_offset = None;
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("Open a PDF to start placing snippets")
                        .color(theme::PAGE_NUMBER_TEXT),
                );
            });
            return;
        }

        let available_width = ui.available_width();
        if (available_width - viewer.content_width).abs() > 0.5 {
            viewer.content_width = available_width;
            viewport.write(ViewportChanged {
                change: ViewportChange::Resize,
            });
        }

        if ui.rect_contains_pointer(ui.max_rect()) {
            let zoom_delta = ui.input(|i| i.zoom_delta());
            let target = viewer.zoom * zoom_delta;
            if zoom_delta != 1.0 && viewer.set_zoom(target) {
                viewport.write(ViewportChanged {
                    change: ViewportChange::Zoom,
                });
            }
        }

        // Layout is recomputed in Update; until then there is nothing to paint
        let rects = mapper.page_rects().to_vec();
        if rects.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        }
        let size = content_size(&rects);

        let output = egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show_viewport(ui, |ui, visible| {
                let origin = ui.max_rect().min;
                let content = egui::Rect::from_min_size(origin, egui::vec2(size.x, size.y));
                ui.set_min_size(content.size());

                let drop_area = ui.interact(
                    content,
                    ui.id().with("page_drop_area"),
                    egui::Sense::hover(),
                );
                let pointer = ui
                    .input(|i| i.pointer.interact_pos())
                    .map(|pos| Vec2::new(pos.x - origin.x, pos.y - origin.y));

                let visible = Rect::new(visible.min.x, visible.min.y, visible.max.x, visible.max.y);
                let painter = ui.painter();
                let mut live = Vec::new();
                for rect in rects.iter().filter(|r| r.intersects(visible)) {
                    paint_page(painter, to_screen(origin, rect), rect.page_index, &previews);
                    live.push(*rect);
                }
                mapper.set_live_rects(live);

                if drop_area.dnd_hover_payload::<SnippetPayload>().is_some()
                    && let Some(hit) = pointer.and_then(|p| mapper.locate_page(p))
                    && let Some(rect) = rects.iter().find(|r| r.page_index == hit.page_index)
                {
                    painter.rect_stroke(
                        to_screen(origin, rect),
                        0.0,
                        egui::Stroke::new(2.0, theme::DROP_HIGHLIGHT),
                        egui::StrokeKind::Outside,
                    );
                }

                if let Some(payload) = drop_area.dnd_release_payload::<SnippetPayload>()
                    && let Some(pointer) = pointer
                {
                    drops.write(SnippetDropped {
                        payload: (*payload).clone(),
                        pointer,
                    });
                }

                for item in placed.iter() {
                    let Some(pos) = mapper.project_to_screen(item) else {
                        continue;
                    };
                    let anchor = origin + egui::vec2(pos.x, pos.y);
                    ui.painter()
                        .circle_filled(anchor, 2.5, theme::LABEL_MARKER);

                    let label_rect = egui::Rect::from_min_size(
                        anchor - egui::vec2(0.0, LABEL_HEIGHT),
                        egui::vec2(LABEL_MAX_WIDTH, LABEL_HEIGHT),
                    );
                    ui.scope_builder(
                        egui::UiBuilder::new()
                            .max_rect(label_rect)
                            .layout(egui::Layout::left_to_right(egui::Align::Center)),
                        |ui| {
                            egui::Frame::new()
                                .fill(theme::LABEL_FILL)
                                .stroke(egui::Stroke::new(1.0, theme::LABEL_STROKE))
                                .corner_radius(3.0)
                                .inner_margin(egui::Margin::symmetric(4, 1))
                                .show(ui, |ui| {
                                    ui.horizontal(|ui| {
                                        ui.label(
                                            egui::RichText::new(&item.text)
                                                .color(label_color),
                                        );
                                        if ui
                                            .small_button("×")
                                            .on_hover_text("Remove from page")
                                            .clicked()
                                        {
                                            removals.write(RemovePlacedItemRequest { id: item.id });
                                        }
                                    });
                                });
                        },
                    );
                }
            });

        let offset = output.state.offset;
        if memory.last_offset.is_some_and(|last| last != offset) {
            viewport.write(ViewportChanged {
                change: ViewportChange::Scroll,
            });
        }
        memory.last_offset = Some(offset);
    });

    Ok(())
}
