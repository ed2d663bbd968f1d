//! Export of the annotated PDF.
//!
//! An export moves through three async stages, one at a time:
//! stamping on the compute pool, the native save dialog, then the write on
//! the I/O pool. Any failure clears the in-flight state and surfaces one
//! generic error; placed items and snippets are never touched.

mod engine;
mod filename;

pub use engine::stamp_items_batched;
use engine::{ExportError, StampOutput};
use filename::suggested_name;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use futures_lite::future;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::document::LoadedDocument;
use crate::placement::PlacedItems;

/// Message to start an export of the current document
#[derive(Message, Debug, Clone, Copy)]
pub struct ExportRequest;

/// Message to open a finished export in the system viewer
#[derive(Message, Debug, Clone)]
pub struct OpenExportedRequest {
    pub path: PathBuf,
}

/// User-facing message shown after an export request
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNotice {
    pub message: String,
    /// Set after a successful save so the dialog can offer "Open"
    pub saved_path: Option<PathBuf>,
}

impl ExportNotice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            saved_path: None,
        }
    }
}

pub enum ExportTask {
    Stamping(Task<Result<StampOutput, ExportError>>),
    ChoosingPath {
        dialog: Task<Option<PathBuf>>,
        bytes: Vec<u8>,
    },
    Writing(Task<Result<PathBuf, ExportError>>),
}

/// Resource tracking the single in-flight export and its outcome
#[derive(Resource, Default)]
pub struct ExportState {
    pub task: Option<ExportTask>,
    /// Source path of the document being exported
    pub source: Option<PathBuf>,
    pub notice: Option<ExportNotice>,
    /// Generic failure shown with a retry option; details go to the log
    pub error: Option<String>,
}

impl ExportState {
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    pub fn stage_description(&self) -> Option<&'static str> {
        match self.task.as_ref()? {
            ExportTask::Stamping(_) => Some("Writing snippets into the PDF..."),
            ExportTask::ChoosingPath { .. } => Some("Choose where to save the PDF"),
            ExportTask::Writing(_) => Some("Saving PDF..."),
        }
    }

    fn fail(&mut self, error: ExportError) {
        error!("Export failed: {}", error);
        self.task = None;
        self.error = Some("Export failed, please try again.".to_string());
    }
}

/// Why an export request cannot start
pub fn check_export_preconditions(
    state: &ExportState,
    document: &LoadedDocument,
    placed: &PlacedItems,
) -> Result<(), ExportNotice> {
    if state.is_busy() {
        return Err(ExportNotice::info("An export is already in progress."));
    }
    if !document.is_loaded() {
        return Err(ExportNotice::info("Open a PDF before exporting."));
    }
    if placed.is_empty() {
        return Err(ExportNotice::info(
            "Drag at least one snippet onto a page before exporting.",
        ));
    }
    Ok(())
}

/// Write to a sibling temp file first so a failed write leaves no partial PDF.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".part");
    let temp = PathBuf::from(temp);

    if let Err(e) = std::fs::write(&temp, bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn start_export(
    mut events: MessageReader<ExportRequest>,
    mut state: ResMut<ExportState>,
    document: Res<LoadedDocument>,
    placed: Res<PlacedItems>,
    config: Res<AppConfig>,
) {
    for _ in events.read() {
        if let Err(notice) = check_export_preconditions(&state, &document, &placed) {
            info!("Export not started: {}", notice.message);
            state.notice = Some(notice);
            continue;
        }
        let Some(doc) = document.current.as_ref() else {
            continue;
        };

        let bytes = doc.bytes.clone();
        let items = placed.snapshot();
        let style = config.data.export;
        info!("Exporting {} placed items from {}", items.len(), doc.file_name);

        state.error = None;
        state.notice = None;
        state.source = Some(doc.path.clone());
        state.task = Some(ExportTask::Stamping(AsyncComputeTaskPool::get().spawn(
            async move { stamp_items_batched(&bytes, &items, style).await },
        )));
    }
}

fn spawn_save_dialog(source: &Path) -> Task<Option<PathBuf>> {
    let file_name = suggested_name(source);
    let directory = source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::paths::default_documents_dir);

    AsyncComputeTaskPool::get().spawn(async move {
        rfd::AsyncFileDialog::new()
            .set_title("Save Annotated PDF")
            .add_filter("PDF", &["pdf"])
            .set_directory(directory)
            .set_file_name(file_name)
            .save_file()
            .await
            .map(|h| h.path().to_path_buf())
    })
}

/// Advances the in-flight export by at most one stage per frame
fn poll_export(mut state: ResMut<ExportState>) {
    let Some(task) = state.task.take() else {
        return;
    };

    match task {
        ExportTask::Stamping(mut stamping) => {
            match future::block_on(future::poll_once(&mut stamping)) {
                None => state.task = Some(ExportTask::Stamping(stamping)),
                Some(Err(e)) => state.fail(e),
                Some(Ok(output)) => {
                    if output.skipped > 0 {
                        warn!("{} items were on missing pages", output.skipped);
                    }
                    debug!("Stamped {} items", output.written);
                    let source = state.source.clone().unwrap_or_default();
                    state.task = Some(ExportTask::ChoosingPath {
                        dialog: spawn_save_dialog(&source),
                        bytes: output.bytes,
                    });
                }
            }
        }
        ExportTask::ChoosingPath { mut dialog, bytes } => {
            match future::block_on(future::poll_once(&mut dialog)) {
                None => state.task = Some(ExportTask::ChoosingPath { dialog, bytes }),
                Some(None) => debug!("Save dialog cancelled, discarding export"),
                Some(Some(path)) => {
                    state.task = Some(ExportTask::Writing(IoTaskPool::get().spawn(async move {
                        write_atomically(&path, &bytes)?;
                        Ok(path)
                    })));
                }
            }
        }
        ExportTask::Writing(mut writing) => {
            match future::block_on(future::poll_once(&mut writing)) {
                None => state.task = Some(ExportTask::Writing(writing)),
                Some(Err(e)) => state.fail(e),
                Some(Ok(path)) => {
                    info!("Saved annotated PDF to {:?}", path);
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    state.notice = Some(ExportNotice {
                        message: format!("Saved {}", name),
                        saved_path: Some(path),
                    });
                }
            }
        }
    }
}

fn open_exported(mut events: MessageReader<OpenExportedRequest>) {
    for event in events.read() {
        if let Err(e) = open::that(&event.path) {
            warn!("Could not open {:?}: {}", event.path, e);
        }
    }
}

pub struct ExportPlugin;

impl Plugin for ExportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExportState>()
            .add_message::<ExportRequest>()
            .add_message::<OpenExportedRequest>()
            .add_systems(
                Update,
                (
                    start_export.run_if(on_message::<ExportRequest>),
                    poll_export,
                    open_exported.run_if(on_message::<OpenExportedRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippets::SnippetList;
    use crate::viewer::PageHit;

    fn hit() -> PageHit {
        PageHit {
            page_index: 0,
            page_x: 10.0,
            page_y: 10.0,
            page_width: 100.0,
            page_height: 100.0,
        }
    }

    #[test]
    fn test_export_without_document_only_shows_notice() {
        let mut app = App::new();
        app.init_resource::<AppConfig>()
            .init_resource::<LoadedDocument>()
            .init_resource::<PlacedItems>()
            .init_resource::<SnippetList>()
            .add_plugins(ExportPlugin);
        app.world_mut().resource_mut::<PlacedItems>().push("kept".to_string(), hit());
        app.world_mut().resource_mut::<SnippetList>().append("pending");

        app.world_mut().write_message(ExportRequest);
        app.update();

        let state = app.world().resource::<ExportState>();
        assert!(!state.is_busy());
        assert!(state.error.is_none());
        assert_eq!(
            state.notice.as_ref().map(|n| n.message.as_str()),
            Some("Open a PDF before exporting.")
        );
        assert_eq!(app.world().resource::<PlacedItems>().len(), 1);
        assert_eq!(app.world().resource::<SnippetList>().len(), 1);
    }

    #[test]
    fn test_preconditions_require_placed_items() {
        let state = ExportState::default();
        let document = LoadedDocument {
            current: Some(crate::document::OpenDocument {
                path: PathBuf::from("a.pdf"),
                file_name: "a.pdf".to_string(),
                bytes: Default::default(),
                pages: Vec::new(),
            }),
        };
        let mut placed = PlacedItems::default();
        assert!(check_export_preconditions(&state, &document, &placed).is_err());

        placed.push("x".to_string(), hit());
        assert!(check_export_preconditions(&state, &document, &placed).is_ok());
    }

    #[test]
    fn test_failure_clears_in_flight_state() {
        let mut state = ExportState::default();
        let pool = AsyncComputeTaskPool::get_or_init(bevy::tasks::TaskPool::default);
        state.task = Some(ExportTask::Writing(pool.spawn(async { Ok(PathBuf::new()) })));
        assert!(state.is_busy());
        state.fail(ExportError::NoPages);
        assert!(!state.is_busy());
        assert!(state.error.is_some());
    }

    #[test]
    fn test_write_atomically_leaves_no_temp_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("snipstamp_atomic_test.pdf");
        write_atomically(&path, b"%PDF-1.7").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!dir.join("snipstamp_atomic_test.pdf.part").exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("snipstamp_missing_dir")
            .join("out.pdf");
        assert!(matches!(
            write_atomically(&path, b"x"),
            Err(ExportError::Write(_))
        ));
    }
}
