//! Shared lopdf helpers for reading page geometry.
//!
//! PDF uses a **bottom-left origin**: (0, 0) is the lower-left corner of the
//! page's box and Y increases upward. The viewer works top-left with Y
//! increasing downward, so every conversion into native space flips Y.
//!
//! What a reader sees is the CropBox (clipped to the MediaBox) turned
//! clockwise by the page's /Rotate. Page sizes and drop fractions refer to
//! that displayed page, not the raw MediaBox.

use lopdf::{Document, Object, ObjectId};

/// Walk limit for inherited page attributes, guards against cyclic trees.
const MAX_INHERIT_DEPTH: usize = 16;

/// Clockwise display rotation of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Normalize a /Rotate value. Anything that is not a multiple of 90 is
    /// treated as unrotated.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Quarter,
            180 => Rotation::Half,
            270 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarter)
    }
}

/// A page's visible box in native PDF points, with its display rotation.
///
/// `width` and `height` are the unrotated box; use
/// [`displayed_size`](Self::displayed_size) for what the reader sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeBox {
    pub llx: f32,
    pub lly: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: Rotation,
}

impl NativeBox {
    /// US Letter, used when a page has no usable MediaBox.
    pub const LETTER: NativeBox = NativeBox {
        llx: 0.0,
        lly: 0.0,
        width: 612.0,
        height: 792.0,
        rotation: Rotation::None,
    };

    /// Width and height of the page as displayed.
    pub fn displayed_size(&self) -> (f32, f32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Map a top-left fractional position on the displayed page to native
    /// coordinates.
    pub fn from_fraction(&self, fx: f32, fy: f32) -> (f32, f32) {
        // Undo the clockwise display rotation first
        let (ux, uy) = match self.rotation {
            Rotation::None => (fx, fy),
            Rotation::Quarter => (fy, 1.0 - fx),
            Rotation::Half => (1.0 - fx, 1.0 - fy),
            Rotation::ThreeQuarter => (1.0 - fy, fx),
        };
        let x = self.llx + ux * self.width;
        let y = self.lly + self.height - uy * self.height;
        (x, y)
    }
}

/// Read a numeric PDF object as f32.
pub fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Follow a single indirect reference, if any.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, walking up the page tree for inherited keys
/// (MediaBox, Resources, Rotate, CropBox).
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_INHERIT_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Read a rectangle attribute as `[x0, y0, x1, y1]` with x0 < x1, y0 < y1.
fn rect_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let Some(Object::Array(values)) = inherited_attribute(doc, page_id, key) else {
        return None;
    };
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(object_to_f32))
        .collect();
    let &[a, b, c, d] = numbers.as_slice() else {
        return None;
    };

    let rect = [a.min(c), b.min(d), a.max(c), b.max(d)];
    (rect[2] > rect[0] && rect[3] > rect[1]).then_some(rect)
}

fn rotation(doc: &Document, page_id: ObjectId) -> Rotation {
    match inherited_attribute(doc, page_id, b"Rotate") {
        Some(Object::Integer(degrees)) => Rotation::from_degrees(*degrees),
        Some(Object::Real(degrees)) => Rotation::from_degrees(degrees.round() as i64),
        _ => Rotation::None,
    }
}

/// Visible box of a page: the CropBox clipped to the MediaBox, or the
/// MediaBox alone when there is no usable CropBox.
pub fn page_box(doc: &Document, page_id: ObjectId) -> NativeBox {
    let rotation = rotation(doc, page_id);
    let Some(media) = rect_attribute(doc, page_id, b"MediaBox") else {
        return NativeBox {
            rotation,
            ..NativeBox::LETTER
        };
    };

    let visible = rect_attribute(doc, page_id, b"CropBox")
        .map(|crop| {
            [
                crop[0].max(media[0]),
                crop[1].max(media[1]),
                crop[2].min(media[2]),
                crop[3].min(media[3]),
            ]
        })
        .filter(|clipped| clipped[2] > clipped[0] && clipped[3] > clipped[1])
        .unwrap_or(media);

    NativeBox {
        llx: visible[0],
        lly: visible[1],
        width: visible[2] - visible[0],
        height: visible[3] - visible[1],
        rotation,
    }
}
