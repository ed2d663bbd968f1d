//! Burns placed snippets into a copy of the source PDF.
//!
//! Each touched page gets its existing content wrapped in `q … Q` followed
//! by a new content stream with one text object per item. The standard
//! Helvetica font is added to the page's effective resources; inherited
//! resource entries are copied down so nothing is shadowed.

use bevy::log::{debug, warn};
use futures_lite::future;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::StampStyle;
use crate::constants::{EXPORT_BATCH_SIZE, STAMP_FONT_KEY};
use crate::pdf::{inherited_attribute, page_box, resolve, Rotation};
use crate::placement::PlacedItem;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to load source PDF: {0}")]
    Load(String),
    #[error("source PDF has no pages")]
    NoPages,
    #[error("failed to update page: {0}")]
    Page(String),
    #[error("failed to encode content stream: {0}")]
    Encode(String),
    #[error("failed to serialize PDF: {0}")]
    Save(String),
    #[error("failed to write file: {0}")]
    Write(#[from] std::io::Error),
}

/// Outcome of a stamping pass
#[derive(Debug)]
pub struct StampOutput {
    pub bytes: Vec<u8>,
    pub written: usize,
    pub skipped: usize,
}

/// WinAnsi code points 0x80..=0x9F that differ from Latin-1
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Encode text for a WinAnsiEncoding simple font. Unmappable characters
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            _ => WIN_ANSI_EXTRAS
                .iter()
                .find(|(extra, _)| *extra == c)
                .map_or(b'?', |(_, code)| *code),
        })
        .collect()
}

/// Text positioning for a page shown with `rotation`. Rotated pages get a
/// counter-rotated text matrix so the stamp reads upright on screen.
fn position_operation(x: f32, y: f32, rotation: Rotation) -> Operation {
    let (cos, sin): (f32, f32) = match rotation {
        Rotation::None => return Operation::new("Td", vec![x.into(), y.into()]),
        Rotation::Quarter => (0.0, 1.0),
        Rotation::Half => (-1.0, 0.0),
        Rotation::ThreeQuarter => (0.0, -1.0),
    };
    Operation::new(
        "Tm",
        vec![
            cos.into(),
            sin.into(),
            (-sin).into(),
            cos.into(),
            x.into(),
            y.into(),
        ],
    )
}

fn text_operations(
    text: &str,
    x: f32,
    y: f32,
    rotation: Rotation,
    style: &StampStyle,
    font_key: &[u8],
) -> Vec<Operation> {
    let [r, g, b] = style.color;
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_key.to_vec()), style.font_size.into()],
        ),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        position_operation(x, y, rotation),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Working state for one export
struct Stamper {
    doc: Document,
    page_ids: Vec<ObjectId>,
    /// Text operations per touched page, in item order
    pending: BTreeMap<ObjectId, Vec<Operation>>,
    style: StampStyle,
    written: usize,
    skipped: usize,
}

impl Stamper {
    fn load(bytes: &[u8], style: StampStyle) -> Result<Self, ExportError> {
        let doc = Document::load_mem(bytes).map_err(|e| ExportError::Load(e.to_string()))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            return Err(ExportError::NoPages);
        }
        Ok(Self {
            doc,
            page_ids,
            pending: BTreeMap::new(),
            style,
            written: 0,
            skipped: 0,
        })
    }

    fn add_item(&mut self, item: &PlacedItem) {
        let Some(&page_id) = self.page_ids.get(item.page_index) else {
            warn!(
                "Skipping \"{}\": page {} is out of range ({} pages)",
                item.text,
                item.page_index,
                self.page_ids.len()
            );
            self.skipped += 1;
            return;
        };

        let fraction = item.fraction();
        let native = page_box(&self.doc, page_id);
        let (x, y) = native.from_fraction(fraction.x, fraction.y);
        debug!(
            "Stamping \"{}\" on page {} at ({:.2}, {:.2}), rotated {}",
            item.text,
            item.page_index,
            x,
            y,
            native.rotation.degrees()
        );

        let ops = text_operations(
            &item.text,
            x,
            y,
            native.rotation,
            &self.style,
            STAMP_FONT_KEY.as_bytes(),
        );
        self.pending.entry(page_id).or_default().extend(ops);
        self.written += 1;
    }

    /// Apply pending operations to their pages and serialize.
    fn finish(mut self) -> Result<StampOutput, ExportError> {
        if !self.pending.is_empty() {
            let font_id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            let save_state = self.add_stream(vec![Operation::new("q", vec![])])?;

            let pending = std::mem::take(&mut self.pending);
            for (page_id, ops) in pending {
                let font_key = self.install_font(page_id, font_id)?;
                let ops = if font_key == STAMP_FONT_KEY.as_bytes() {
                    ops
                } else {
                    rename_font(ops, &font_key)
                };

                let mut stamp = vec![
                    Operation::new("Q", vec![]),
                    Operation::new("q", vec![]),
                ];
                stamp.extend(ops);
                stamp.push(Operation::new("Q", vec![]));
                let stamp_id = self.add_stream(stamp)?;

                self.wrap_contents(page_id, save_state, stamp_id)?;
            }
        }

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| ExportError::Save(e.to_string()))?;

        Ok(StampOutput {
            bytes,
            written: self.written,
            skipped: self.skipped,
        })
    }

    fn add_stream(&mut self, operations: Vec<Operation>) -> Result<ObjectId, ExportError> {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        Ok(self.doc.add_object(Stream::new(Dictionary::new(), encoded)))
    }

    /// Give the page its own Resources holding every inherited entry plus
    /// the stamp font. Returns the font key actually used.
    fn install_font(&mut self, page_id: ObjectId, font_id: ObjectId) -> Result<Vec<u8>, ExportError> {
        let mut resources = match inherited_attribute(&self.doc, page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        let mut fonts = match resources
            .get(b"Font")
            .ok()
            .and_then(|obj| resolve(&self.doc, obj))
        {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };

        let font_key = unique_font_key(&fonts);
        fonts.set(font_key.clone(), Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));

        let page = self
            .doc
            .get_dictionary_mut(page_id)
            .map_err(|e| ExportError::Page(e.to_string()))?;
        page.set("Resources", Object::Dictionary(resources));
        Ok(font_key)
    }

    /// Contents becomes `[q, existing…, Q+stamp]`.
    fn wrap_contents(
        &mut self,
        page_id: ObjectId,
        save_state: ObjectId,
        stamp_id: ObjectId,
    ) -> Result<(), ExportError> {
        let existing = {
            let page = self
                .doc
                .get_dictionary(page_id)
                .map_err(|e| ExportError::Page(e.to_string()))?;
            match page.get(b"Contents").ok() {
                Some(Object::Reference(id)) => match self.doc.get_object(*id) {
                    Ok(Object::Array(refs)) => refs.clone(),
                    _ => vec![Object::Reference(*id)],
                },
                Some(Object::Array(refs)) => refs.clone(),
                _ => Vec::new(),
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_state));
        contents.extend(existing);
        contents.push(Object::Reference(stamp_id));

        let page = self
            .doc
            .get_dictionary_mut(page_id)
            .map_err(|e| ExportError::Page(e.to_string()))?;
        page.set("Contents", Object::Array(contents));
        Ok(())
    }
}

/// `FSnip`, or `FSnip1`, `FSnip2`… if the page already uses that name.
fn unique_font_key(fonts: &Dictionary) -> Vec<u8> {
    let base = STAMP_FONT_KEY.as_bytes().to_vec();
    if !fonts.has(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}{}", STAMP_FONT_KEY, n).into_bytes())
        .find(|key| !fonts.has(key))
        .unwrap_or(base)
}

fn rename_font(ops: Vec<Operation>, font_key: &[u8]) -> Vec<Operation> {
    ops.into_iter()
        .map(|mut op| {
            if op.operator == "Tf"
                && let Some(first) = op.operands.first_mut()
            {
                *first = Object::Name(font_key.to_vec());
            }
            op
        })
        .collect()
}

/// Stamp every item, yielding to the executor between batches.
pub async fn stamp_items_batched(
    bytes: &[u8],
    items: &[PlacedItem],
    style: StampStyle,
) -> Result<StampOutput, ExportError> {
    let mut stamper = Stamper::load(bytes, style)?;
    for batch in items.chunks(EXPORT_BATCH_SIZE) {
        for item in batch {
            stamper.add_item(item);
        }
        future::yield_now().await;
    }
    stamper.finish()
}
