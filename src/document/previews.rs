//! Page preview textures.
//!
//! With the `render` feature pages are rasterized by mupdf on the compute
//! pool and uploaded as egui textures. Without it the map stays empty and
//! the viewer paints blank sheets.

use bevy::prelude::*;
use bevy_egui::egui;
use std::collections::HashMap;

use super::{DocumentClosed, DocumentOpened};

#[cfg(feature = "render")]
use bevy::tasks::{AsyncComputeTaskPool, Task};

/// GPU textures for rendered pages, keyed by page index.
///
/// Dropping a `TextureHandle` frees the texture, so [`release`](Self::release)
/// is the only cleanup needed.
#[derive(Resource, Default)]
pub struct PagePreviews {
    textures: HashMap<usize, egui::TextureHandle>,
    #[cfg(feature = "render")]
    task: Option<Task<Result<Vec<(usize, egui::ColorImage)>, mupdf::error::Error>>>,
    #[cfg(feature = "render")]
    attempted: bool,
}

impl PagePreviews {
    pub fn get(&self, page_index: usize) -> Option<&egui::TextureHandle> {
        self.textures.get(&page_index)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn is_rendering(&self) -> bool {
        #[cfg(feature = "render")]
        {
            self.task.is_some()
        }
        #[cfg(not(feature = "render"))]
        {
            false
        }
    }

    /// Drop every texture and cancel any in-flight rasterization
    pub fn release(&mut self) {
        if !self.is_empty() {
            debug!("Releasing {} page previews", self.len());
        }
        self.textures.clear();
        #[cfg(feature = "render")]
        {
            self.task = None;
            self.attempted = false;
        }
    }
}

pub fn release_previews(
    mut opened: MessageReader<DocumentOpened>,
    mut closed: MessageReader<DocumentClosed>,
    mut previews: ResMut<PagePreviews>,
) {
    let opened = opened.read().count();
    let closed = closed.read().count();
    if opened + closed > 0 {
        previews.release();
    }
}

pub fn release_previews_on_exit(
    mut exits: MessageReader<AppExit>,
    mut previews: ResMut<PagePreviews>,
) {
    if exits.read().count() > 0 {
        previews.release();
    }
}

#[cfg(feature = "render")]
fn rasterize(
    bytes: &[u8],
    scale: f32,
) -> Result<Vec<(usize, egui::ColorImage)>, mupdf::error::Error> {
    use mupdf::{Colorspace, Document, Matrix};

    // Render the bytes that will be exported, not whatever is on disk now
    let doc = Document::from_bytes(bytes, "application/pdf")?;
    let page_count = doc.page_count()? as usize;
    let rgb = Colorspace::device_rgb();
    let transform = Matrix::new_scale(scale, scale);

    let mut images = Vec::with_capacity(page_count);
    for page_num in 0..page_count {
        let page = doc.load_page(page_num as i32)?;
        let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;
        let size = [pixmap.width() as usize, pixmap.height() as usize];
        let samples = pixmap.samples();
        if pixmap.n() != 3 || samples.len() != size[0] * size[1] * 3 {
            warn!("Unexpected pixmap layout for page {}", page_num);
            continue;
        }
        images.push((page_num, egui::ColorImage::from_rgb(size, samples)));
    }
    Ok(images)
}

#[cfg(feature = "render")]
pub fn start_rasterize(document: Res<super::LoadedDocument>, mut previews: ResMut<PagePreviews>) {
    if previews.attempted || previews.task.is_some() {
        return;
    }
    let Some(doc) = document.current.as_ref() else {
        return;
    };

    previews.attempted = true;
    let bytes = doc.bytes.clone();
    let scale = crate::constants::PREVIEW_SCALE;
    previews.task = Some(
        AsyncComputeTaskPool::get().spawn(async move { rasterize(&bytes, scale) }),
    );
}

#[cfg(feature = "render")]
pub fn poll_rasterize(
    mut contexts: bevy_egui::EguiContexts,
    mut previews: ResMut<PagePreviews>,
) -> Result {
    use futures_lite::future;

    let Some(task) = previews.task.as_mut() else {
        return Ok(());
    };
    let Some(result) = future::block_on(future::poll_once(task)) else {
        return Ok(());
    };
    previews.task = None;

    match result {
        Ok(images) => {
            let ctx = contexts.ctx_mut()?;
            for (page_index, image) in images {
                let handle = ctx.load_texture(
                    format!("page-{}", page_index),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                previews.textures.insert(page_index, handle);
            }
            debug!("Uploaded {} page previews", previews.textures.len());
        }
        Err(e) => warn!("Page rendering failed, showing blank pages: {}", e),
    }
    Ok(())
}
