//! Document open/close systems and task polling.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool};
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AppConfig, RememberOpenDirRequest};
use crate::viewer::{CoordinateMapper, ViewerState, ViewportChange, ViewportChanged};

use super::{
    read_document, CloseDocumentRequest, DocumentClosed, DocumentError, DocumentLoadState,
    DocumentOpened, LoadDocumentTask, LoadedDocument, OpenDocumentRequest, PendingOpenDialog,
};

/// Spawn the native open dialog unless one is already showing.
pub fn request_open_dialog(pending: &mut PendingOpenDialog, start_dir: PathBuf) {
    if pending.task.is_some() {
        return;
    }
    let task_pool = AsyncComputeTaskPool::get();
    pending.task = Some(task_pool.spawn(async move {
        rfd::AsyncFileDialog::new()
            .set_title("Open PDF")
            .add_filter("PDF", &["pdf"])
            .set_directory(start_dir)
            .pick_file()
            .await
            .map(|h| h.path().to_path_buf())
    }));
}

/// Open the file named by the first command-line argument, if any
pub fn open_cli_document(mut requests: MessageWriter<OpenDocumentRequest>) {
    if let Some(arg) = std::env::args().nth(1) {
        info!("Opening {} from command line", arg);
        requests.write(OpenDocumentRequest {
            path: PathBuf::from(arg),
        });
    }
}

pub fn poll_open_dialog(
    mut pending: ResMut<PendingOpenDialog>,
    mut requests: MessageWriter<OpenDocumentRequest>,
) {
    let Some(task) = pending.task.as_mut() else {
        return;
    };
    let Some(result) = future::block_on(future::poll_once(task)) else {
        return;
    };
    pending.task = None;
    if let Some(path) = result {
        requests.write(OpenDocumentRequest { path });
    }
}

/// Starts an async load (file I/O and page inspection)
pub fn start_document_load(
    mut commands: Commands,
    mut events: MessageReader<OpenDocumentRequest>,
    mut load_state: ResMut<DocumentLoadState>,
) {
    for event in events.read() {
        if load_state.is_loading {
            warn!("Load already in progress, ignoring {:?}", event.path);
            continue;
        }

        load_state.is_loading = true;
        let path = event.path.clone();
        let task = IoTaskPool::get().spawn(async move { read_document(&path) });
        commands.spawn(LoadDocumentTask(task));
    }
}

/// Polls load tasks and swaps the document in on success
#[allow(clippy::too_many_arguments)]
pub fn poll_document_load(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadDocumentTask)>,
    mut load_state: ResMut<DocumentLoadState>,
    mut document: ResMut<LoadedDocument>,
    mut viewer: ResMut<ViewerState>,
    mut mapper: ResMut<CoordinateMapper>,
    config: Res<AppConfig>,
    mut opened: MessageWriter<DocumentOpened>,
    mut viewport: MessageWriter<ViewportChanged>,
    mut remember: MessageWriter<RememberOpenDirRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        load_state.is_loading = false;

        match result {
            Ok(loaded) => {
                info!(
                    "Opened {} ({} pages)",
                    loaded.file_name,
                    loaded.pages.len()
                );
                if let Some(dir) = loaded.path.parent() {
                    remember.write(RememberOpenDirRequest {
                        path: dir.to_path_buf(),
                    });
                }
                load_state.error = None;
                document.current = Some(loaded);
                viewer.set_zoom(config.data.default_zoom);
                mapper.invalidate();
                opened.write(DocumentOpened);
                viewport.write(ViewportChanged {
                    change: ViewportChange::PageMount,
                });
            }
            Err(DocumentError::NotPdf) => {
                debug!("Ignoring file that is not a PDF");
            }
            Err(e) => {
                error!("Failed to open document: {}", e);
                load_state.error = Some(e.to_string());
            }
        }
    }
}

pub fn close_document(
    mut events: MessageReader<CloseDocumentRequest>,
    mut document: ResMut<LoadedDocument>,
    mut mapper: ResMut<CoordinateMapper>,
    mut closed: MessageWriter<DocumentClosed>,
    mut viewport: MessageWriter<ViewportChanged>,
) {
    if events.read().count() == 0 {
        return;
    }
    if let Some(doc) = document.current.take() {
        info!("Closed {}", doc.file_name);
    }
    mapper.invalidate();
    closed.write(DocumentClosed);
    viewport.write(ViewportChanged {
        change: ViewportChange::Invalidate,
    });
}
