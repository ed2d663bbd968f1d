//! The loaded source PDF.
//!
//! Handles async file I/O for the document, including:
//! - Open dialog and CLI path handling
//! - Format check and page-size inspection with lopdf
//! - Close/reset of the whole editing session
//! - Page preview textures (see [`previews`])

mod load;
mod previews;

use bevy::prelude::*;
use bevy::tasks::Task;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConfigLoaded;
use crate::pdf::page_box;

pub use load::request_open_dialog;
pub use previews::PagePreviews;

/// Native size of one page in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("not a PDF file")]
    NotPdf,
    #[error("could not parse PDF: {0}")]
    Parse(String),
    #[error("the PDF has no pages")]
    Empty,
}

/// A successfully opened source document
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: Arc<Vec<u8>>,
    pub pages: Vec<PageSize>,
}

/// Resource holding the current document, if any
#[derive(Resource, Default)]
pub struct LoadedDocument {
    pub current: Option<OpenDocument>,
}

impl LoadedDocument {
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn pages(&self) -> Option<&[PageSize]> {
        self.current.as_ref().map(|doc| doc.pages.as_slice())
    }

    pub fn page_count(&self) -> usize {
        self.pages().map_or(0, <[PageSize]>::len)
    }
}

/// Resource tracking an in-flight load for the loading indicator
#[derive(Resource, Default)]
pub struct DocumentLoadState {
    pub is_loading: bool,
    /// Error from the last failed load, shown in a dialog until dismissed
    pub error: Option<String>,
}

/// Component for the load task
#[derive(Component)]
pub struct LoadDocumentTask(pub Task<Result<OpenDocument, DocumentError>>);

/// Resource for the async open dialog
#[derive(Resource, Default)]
pub struct PendingOpenDialog {
    pub task: Option<Task<Option<PathBuf>>>,
}

/// Message to load a PDF from disk
#[derive(Message, Debug, Clone)]
pub struct OpenDocumentRequest {
    pub path: PathBuf,
}

/// Message to close the document and reset the session
#[derive(Message, Debug, Clone, Copy)]
pub struct CloseDocumentRequest;

/// Sent after a new document replaced the previous one
#[derive(Message, Debug, Clone, Copy)]
pub struct DocumentOpened;

/// Sent after the document was closed
#[derive(Message, Debug, Clone, Copy)]
pub struct DocumentClosed;

/// Desktop stand-in for the `application/pdf` MIME check: the extension
/// must say PDF and the bytes must start with the PDF header.
pub fn looks_like_pdf(path: &Path, bytes: &[u8]) -> bool {
    let extension_ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    extension_ok && bytes.starts_with(b"%PDF-")
}

/// Parse the document and read each page's native size.
pub fn inspect_pdf(bytes: &[u8]) -> Result<Vec<PageSize>, DocumentError> {
    let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Parse(e.to_string()))?;
    let pages: Vec<PageSize> = doc
        .get_pages()
        .values()
        .map(|page_id| {
            let (width, height) = page_box(&doc, *page_id).displayed_size();
            PageSize { width, height }
        })
        .collect();

    if pages.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(pages)
}

/// Read and inspect a file. Blocking; run it on a task pool.
pub fn read_document(path: &Path) -> Result<OpenDocument, DocumentError> {
    let bytes = std::fs::read(path)?;
    if !looks_like_pdf(path, &bytes) {
        return Err(DocumentError::NotPdf);
    }
    let pages = inspect_pdf(&bytes)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string();

    Ok(OpenDocument {
        path: path.to_path_buf(),
        file_name,
        bytes: Arc::new(bytes),
        pages,
    })
}

pub struct DocumentPlugin;

impl Plugin for DocumentPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadedDocument>()
            .init_resource::<DocumentLoadState>()
            .init_resource::<PendingOpenDialog>()
            .init_resource::<PagePreviews>()
            .add_message::<OpenDocumentRequest>()
            .add_message::<CloseDocumentRequest>()
            .add_message::<DocumentOpened>()
            .add_message::<DocumentClosed>()
            .add_systems(Startup, load::open_cli_document.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    load::poll_open_dialog,
                    load::start_document_load.run_if(on_message::<OpenDocumentRequest>),
                    load::poll_document_load,
                    load::close_document.run_if(on_message::<CloseDocumentRequest>),
                    previews::release_previews,
                )
                    .chain(),
            )
            .add_systems(Last, previews::release_previews_on_exit);

        #[cfg(feature = "render")]
        app.add_systems(
            Update,
            (previews::start_rasterize, previews::poll_rasterize).after(previews::release_previews),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(Path::new("a.pdf"), b"%PDF-1.7\n"));
        assert!(looks_like_pdf(Path::new("A.PDF"), b"%PDF-1.4"));
        assert!(!looks_like_pdf(Path::new("a.txt"), b"%PDF-1.7"));
        assert!(!looks_like_pdf(Path::new("a.pdf"), b"PK\x03\x04"));
        assert!(!looks_like_pdf(Path::new("noext"), b"%PDF-1.7"));
    }

    #[test]
    fn test_inspect_reads_page_sizes() {
        let bytes = fixtures::pdf_with_pages(&[(612, 792), (842, 595)]);
        let pages = inspect_pdf(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], PageSize { width: 612.0, height: 792.0 });
        assert_eq!(pages[1], PageSize { width: 842.0, height: 595.0 });
    }

    #[test]
    fn test_inspect_reports_displayed_size() {
        let pages = inspect_pdf(&fixtures::pdf_with_rotated_crop()).unwrap();
        assert_eq!(pages, vec![PageSize { width: 400.0, height: 300.0 }]);
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(matches!(
            inspect_pdf(b"%PDF-1.7 but not really"),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_read_document_rejects_non_pdf() {
        let path = std::env::temp_dir().join("snipstamp_not_a_pdf.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(matches!(read_document(&path), Err(DocumentError::NotPdf)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_document_from_disk() {
        let path = std::env::temp_dir().join("snipstamp_read_test.pdf");
        std::fs::write(&path, fixtures::pdf_with_pages(&[(612, 792)])).unwrap();
        let doc = read_document(&path).unwrap();
        assert_eq!(doc.file_name, "snipstamp_read_test.pdf");
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.bytes.starts_with(b"%PDF-"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_close_document_resets_state() {
        use crate::viewer::{CoordinateMapper, PageRect, ViewportChange, ViewportChanged};
        use bevy::ecs::message::Messages;

        let mut app = App::new();
        app.init_resource::<CoordinateMapper>()
            .add_message::<CloseDocumentRequest>()
            .add_message::<DocumentClosed>()
            .add_message::<ViewportChanged>()
            .add_systems(Update, load::close_document);
        app.insert_resource(LoadedDocument {
            current: Some(OpenDocument {
                path: PathBuf::from("x.pdf"),
                file_name: "x.pdf".to_string(),
                bytes: Arc::new(Vec::new()),
                pages: vec![PageSize {
                    width: 612.0,
                    height: 792.0,
                }],
            }),
        });
        app.world_mut()
            .resource_mut::<CoordinateMapper>()
            .set_page_rects(vec![PageRect {
                page_index: 0,
                top: 0.0,
                left: 0.0,
                width: 612.0,
                height: 792.0,
            }]);

        app.world_mut().write_message(CloseDocumentRequest);
        app.update();

        assert!(!app.world().resource::<LoadedDocument>().is_loaded());
        let mapper = app.world().resource::<CoordinateMapper>();
        assert!(mapper.page_rects().is_empty());
        assert!(mapper.is_stale());

        let closed = app.world().resource::<Messages<DocumentClosed>>();
        assert_eq!(closed.len(), 1);
        let changes = app.world().resource::<Messages<ViewportChanged>>();
        assert!(changes
            .iter_current_update_messages()
            .any(|m| m.change == ViewportChange::Invalidate));
    }

    #[test]
    fn test_loaded_document_accessors() {
        let mut loaded = LoadedDocument::default();
        assert!(!loaded.is_loaded());
        assert_eq!(loaded.page_count(), 0);

        loaded.current = Some(OpenDocument {
            path: PathBuf::from("x.pdf"),
            file_name: "x.pdf".to_string(),
            bytes: Arc::new(Vec::new()),
            pages: vec![PageSize {
                width: 1.0,
                height: 1.0,
            }],
        });
        assert!(loaded.is_loaded());
        assert_eq!(loaded.page_count(), 1);
    }
}
