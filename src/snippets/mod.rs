//! Pending text snippets awaiting placement.
//!
//! The list is the only owner of snippet text until a drop on the viewer
//! consumes an entry. Drags carry a [`SnippetPayload`] which is checked
//! against the list again at drop time, so a payload that went stale
//! (list edited mid-drag) places nothing.

use bevy::prelude::*;
use thiserror::Error;

/// User-entered text waiting to be dropped on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
}

/// Drag payload handed to egui's drag-and-drop system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetPayload {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("snippet index {index} is out of range (list has {len})")]
pub struct SnippetIndexError {
    pub index: usize,
    pub len: usize,
}

/// Ordered list of pending snippets
#[derive(Resource, Default, Debug)]
pub struct SnippetList {
    items: Vec<Snippet>,
}

impl SnippetList {
    /// Append trimmed text. Empty or whitespace-only input is ignored.
    pub fn append(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.items.push(Snippet {
            text: trimmed.to_string(),
        });
        true
    }

    pub fn delete(&mut self, index: usize) -> Result<Snippet, SnippetIndexError> {
        if index >= self.items.len() {
            return Err(SnippetIndexError {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Payload for dragging the entry at `index`.
    pub fn begin_drag(&self, index: usize) -> Option<SnippetPayload> {
        self.items.get(index).map(|s| SnippetPayload {
            index,
            text: s.text.clone(),
        })
    }

    /// Remove the entry a payload was created from, if it is still there.
    pub fn take_dropped(&mut self, payload: &SnippetPayload) -> Option<Snippet> {
        match self.items.get(payload.index) {
            Some(s) if s.text == payload.text => Some(self.items.remove(payload.index)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.items.iter()
    }
}

/// Text currently typed into the snippet input field
#[derive(Resource, Default)]
pub struct SnippetInput {
    pub buffer: String,
}

impl SnippetInput {
    /// Move the buffer into the list; the buffer is cleared only on success.
    pub fn commit(&mut self, list: &mut SnippetList) -> bool {
        if list.append(&self.buffer) {
            self.buffer.clear();
            true
        } else {
            debug!("Ignored empty snippet input");
            false
        }
    }
}

pub struct SnippetsPlugin;

impl Plugin for SnippetsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SnippetList>()
            .init_resource::<SnippetInput>();
    }
}
