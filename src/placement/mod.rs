//! Canvas state: snippets that have been dropped onto pages.
//!
//! A drop is applied in one system run: the target page is resolved, the
//! snippet is taken out of the list and the placed item is recorded. If any
//! step fails nothing changes.

mod placed_item;

#[cfg(test)]
mod tests;

pub use placed_item::{PlacedItem, PlacedItems};

use bevy::prelude::*;

use crate::config::{AppConfig, DropFallback};
use crate::document::{DocumentClosed, DocumentOpened, LoadedDocument};
use crate::snippets::{SnippetList, SnippetPayload};
use crate::viewer::CoordinateMapper;

/// Message sent by the viewer when a dragged snippet is released over it
#[derive(Message, Debug, Clone)]
pub struct SnippetDropped {
    pub payload: SnippetPayload,
    /// Pointer position in viewer content space
    pub pointer: Vec2,
}

/// Message sent by a label's delete button
#[derive(Message, Debug, Clone, Copy)]
pub struct RemovePlacedItemRequest {
    pub id: u64,
}

/// Resolve, consume and record one drop. Returns the new item's id.
pub fn apply_drop(
    mapper: &CoordinateMapper,
    fallback: DropFallback,
    snippets: &mut SnippetList,
    placed: &mut PlacedItems,
    payload: &SnippetPayload,
    pointer: Vec2,
) -> Option<u64> {
    let Some(target) = mapper.resolve_drop_target(pointer, fallback) else {
        info!("Drop at {:?} is outside every page, keeping snippet", pointer);
        return None;
    };

    let Some(snippet) = snippets.take_dropped(payload) else {
        warn!("Snippet list changed during drag, ignoring drop");
        return None;
    };

    let id = placed.push(snippet.text, target.hit);
    debug!(
        "Placed item {} on page {} at {:?} ({:?} tier)",
        id,
        target.hit.page_index,
        target.hit.fraction(),
        target.tier
    );
    Some(id)
}

fn handle_snippet_drops(
    mut events: MessageReader<SnippetDropped>,
    document: Res<LoadedDocument>,
    mapper: Res<CoordinateMapper>,
    config: Res<AppConfig>,
    mut snippets: ResMut<SnippetList>,
    mut placed: ResMut<PlacedItems>,
) {
    for event in events.read() {
        if !document.is_loaded() {
            continue;
        }
        apply_drop(
            &mapper,
            config.data.drop_fallback,
            &mut snippets,
            &mut placed,
            &event.payload,
            event.pointer,
        );
    }
}

fn handle_remove_requests(
    mut events: MessageReader<RemovePlacedItemRequest>,
    mut placed: ResMut<PlacedItems>,
) {
    for event in events.read() {
        if placed.remove(event.id).is_none() {
            debug!("Placed item {} already removed", event.id);
        }
    }
}

/// A new document invalidates every placement; closing also resets the
/// snippet list.
fn reset_on_document_change(
    mut opened: MessageReader<DocumentOpened>,
    mut closed: MessageReader<DocumentClosed>,
    mut placed: ResMut<PlacedItems>,
    mut snippets: ResMut<SnippetList>,
) {
    if opened.read().count() > 0 {
        placed.clear();
    }
    if closed.read().count() > 0 {
        placed.clear();
        snippets.clear();
    }
}

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacedItems>()
            .add_message::<SnippetDropped>()
            .add_message::<RemovePlacedItemRequest>()
            .add_systems(
                Update,
                (
                    reset_on_document_change,
                    handle_snippet_drops.run_if(on_message::<SnippetDropped>),
                    handle_remove_requests.run_if(on_message::<RemovePlacedItemRequest>),
                )
                    .chain(),
            );
    }
}
