//! Unit tests for the placement module.

use bevy::prelude::*;
use futures_lite::future;
use lopdf::content::Content;
use lopdf::Document;
use std::path::PathBuf;
use std::sync::Arc;

use super::{apply_drop, PlacedItems, PlacementPlugin, RemovePlacedItemRequest, SnippetDropped};
use crate::config::{AppConfig, DropFallback, StampStyle};
use crate::document::{DocumentClosed, DocumentOpened, LoadedDocument, OpenDocument, PageSize};
use crate::export::stamp_items_batched;
use crate::pdf::fixtures;
use crate::snippets::SnippetList;
use crate::viewer::{CoordinateMapper, PageRect};

fn mapper_with_page(width: f32, height: f32) -> CoordinateMapper {
    let mut mapper = CoordinateMapper::default();
    mapper.set_page_rects(vec![PageRect {
        page_index: 0,
        top: 24.0,
        left: 100.0,
        width,
        height,
    }]);
    mapper
}

fn snippets(texts: &[&str]) -> SnippetList {
    let mut list = SnippetList::default();
    for text in texts {
        list.append(text);
    }
    list
}

#[test]
fn test_drop_records_item_and_consumes_snippet() {
    let mapper = mapper_with_page(300.0, 400.0);
    let mut list = snippets(&["Hello"]);
    let mut placed = PlacedItems::default();
    let payload = list.begin_drag(0).unwrap();

    let id = apply_drop(
        &mapper,
        DropFallback::FirstPage,
        &mut list,
        &mut placed,
        &payload,
        Vec2::new(250.0, 224.0),
    );

    assert!(id.is_some());
    assert!(list.is_empty());
    let item = placed.iter().next().unwrap();
    assert_eq!(item.text, "Hello");
    assert_eq!(item.page_index, 0);
    assert_eq!(item.page_x, 150.0);
    assert_eq!(item.page_y, 200.0);
    assert_eq!(item.fraction(), Vec2::new(0.5, 0.5));
}

#[test]
fn test_rejected_drop_keeps_snippet() {
    let mapper = mapper_with_page(300.0, 400.0);
    let mut list = snippets(&["Hello"]);
    let mut placed = PlacedItems::default();
    let payload = list.begin_drag(0).unwrap();

    let id = apply_drop(
        &mapper,
        DropFallback::Reject,
        &mut list,
        &mut placed,
        &payload,
        Vec2::new(5.0, 5.0),
    );

    assert!(id.is_none());
    assert_eq!(list.len(), 1);
    assert!(placed.is_empty());
}

#[test]
fn test_stale_payload_places_nothing() {
    let mapper = mapper_with_page(300.0, 400.0);
    let mut list = snippets(&["a", "b"]);
    let mut placed = PlacedItems::default();
    let payload = list.begin_drag(1).unwrap();
    list.delete(1).unwrap();

    let id = apply_drop(
        &mapper,
        DropFallback::FirstPage,
        &mut list,
        &mut placed,
        &payload,
        Vec2::new(150.0, 150.0),
    );

    assert!(id.is_none());
    assert!(placed.is_empty());
    assert_eq!(list.len(), 1);
}

#[test]
fn test_out_of_page_drop_defaults_to_first_page() {
    let mapper = mapper_with_page(300.0, 400.0);
    let mut list = snippets(&["x"]);
    let mut placed = PlacedItems::default();
    let payload = list.begin_drag(0).unwrap();

    apply_drop(
        &mapper,
        DropFallback::FirstPage,
        &mut list,
        &mut placed,
        &payload,
        Vec2::new(0.0, 0.0),
    )
    .unwrap();

    let item = placed.iter().next().unwrap();
    assert_eq!(item.page_index, 0);
    assert_eq!(item.fraction(), Vec2::new(0.0, 0.0));
}

#[test]
fn test_remove_by_id_keeps_others() {
    let mapper = mapper_with_page(300.0, 400.0);
    let mut list = snippets(&["first", "second"]);
    let mut placed = PlacedItems::default();

    let p0 = list.begin_drag(0).unwrap();
    let first = apply_drop(
        &mapper,
        DropFallback::FirstPage,
        &mut list,
        &mut placed,
        &p0,
        Vec2::new(110.0, 34.0),
    )
    .unwrap();
    let p1 = list.begin_drag(0).unwrap();
    let second = apply_drop(
        &mapper,
        DropFallback::FirstPage,
        &mut list,
        &mut placed,
        &p1,
        Vec2::new(390.0, 414.0),
    )
    .unwrap();

    assert_ne!(first, second);
    assert_eq!(placed.remove(first).unwrap().text, "first");
    assert!(placed.remove(first).is_none());
    assert_eq!(placed.len(), 1);
    assert_eq!(placed.iter().next().unwrap().id, second);
}

/// Headless app with the placement systems, a one-page letter document and
/// the given snippets.
fn placement_app(texts: &[&str], with_document: bool) -> App {
    let mut app = App::new();
    app.init_resource::<AppConfig>()
        .insert_resource(snippets(texts))
        .insert_resource(mapper_with_page(612.0, 792.0))
        .add_message::<DocumentOpened>()
        .add_message::<DocumentClosed>()
        .add_plugins(PlacementPlugin);

    let current = with_document.then(|| OpenDocument {
        path: PathBuf::from("letter.pdf"),
        file_name: "letter.pdf".to_string(),
        bytes: Arc::new(fixtures::pdf_with_pages(&[(612, 792)])),
        pages: vec![PageSize {
            width: 612.0,
            height: 792.0,
        }],
    });
    app.insert_resource(LoadedDocument { current });
    app
}

fn drop_first_snippet(app: &mut App, pointer: Vec2) {
    let payload = app.world().resource::<SnippetList>().begin_drag(0).unwrap();
    app.world_mut().write_message(SnippetDropped { payload, pointer });
    app.update();
}

#[test]
fn test_two_drops_one_removed_exports_one_text() {
    let mut app = placement_app(&["keep", "remove"], true);
    drop_first_snippet(&mut app, Vec2::new(406.0, 420.0));
    drop_first_snippet(&mut app, Vec2::new(200.0, 100.0));
    assert_eq!(app.world().resource::<PlacedItems>().len(), 2);
    assert!(app.world().resource::<SnippetList>().is_empty());

    let removed = app
        .world()
        .resource::<PlacedItems>()
        .iter()
        .find(|item| item.text == "remove")
        .unwrap()
        .id;
    app.world_mut()
        .write_message(RemovePlacedItemRequest { id: removed });
    app.update();

    let items = app.world().resource::<PlacedItems>().snapshot();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "keep");

    let bytes = app
        .world()
        .resource::<LoadedDocument>()
        .current
        .as_ref()
        .unwrap()
        .bytes
        .clone();
    let out = future::block_on(stamp_items_batched(&bytes, &items, StampStyle::default())).unwrap();
    assert_eq!(out.written, 1);

    let doc = Document::load_mem(&out.bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let draws = content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .count();
    assert_eq!(draws, 1);
}

#[test]
fn test_drop_without_document_is_ignored() {
    let mut app = placement_app(&["orphan"], false);
    drop_first_snippet(&mut app, Vec2::new(250.0, 224.0));

    assert!(app.world().resource::<PlacedItems>().is_empty());
    assert_eq!(app.world().resource::<SnippetList>().len(), 1);
}

#[test]
fn test_removing_unknown_id_changes_nothing() {
    let mut app = placement_app(&["a"], true);
    drop_first_snippet(&mut app, Vec2::new(250.0, 224.0));

    app.world_mut()
        .write_message(RemovePlacedItemRequest { id: 999 });
    app.update();
    assert_eq!(app.world().resource::<PlacedItems>().len(), 1);
}

#[test]
fn test_closing_document_clears_placements_and_snippets() {
    let mut app = placement_app(&["placed", "waiting"], true);
    drop_first_snippet(&mut app, Vec2::new(250.0, 224.0));
    assert_eq!(app.world().resource::<PlacedItems>().len(), 1);

    app.world_mut().write_message(DocumentClosed);
    app.update();

    assert!(app.world().resource::<PlacedItems>().is_empty());
    assert!(app.world().resource::<SnippetList>().is_empty());
}

#[test]
fn test_opening_document_clears_placements_only() {
    let mut app = placement_app(&["placed", "waiting"], true);
    drop_first_snippet(&mut app, Vec2::new(250.0, 224.0));

    app.world_mut().write_message(DocumentOpened);
    app.update();

    assert!(app.world().resource::<PlacedItems>().is_empty());
    let snippets = app.world().resource::<SnippetList>();
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets.iter().next().unwrap().text, "waiting");
}
