// SPDX-License-Identifier: MIT OR Apache-2.0
//! The cutscene document: total length, prioritized elements and comments.

use crate::comment::{Comment, Comments};
use crate::element::{Element, ElementId, ElementKind, FrameData};
use crate::keyframe::Frame;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Length of a new document
pub const DEFAULT_TOTAL_FRAMES: Frame = 600;

/// A whole cutscene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayData {
    total_frames: Frame,
    /// Elements in priority order
    elements: IndexMap<ElementId, Element>,
    comments: Comments,
}

impl PlayData {
    /// Create an empty document of the default length
    pub fn new() -> Self {
        Self::with_total_frames(DEFAULT_TOTAL_FRAMES)
    }

    /// Create an empty document of a given length (at least one frame)
    pub fn with_total_frames(total_frames: Frame) -> Self {
        Self {
            total_frames: total_frames.max(1),
            elements: IndexMap::new(),
            comments: Comments::new(),
        }
    }

    /// Number of frames in the document
    pub fn total_frames(&self) -> Frame {
        self.total_frames
    }

    /// Resize the document, pulling element ranges inside the new length
    pub fn set_total_frames(&mut self, total_frames: Frame) {
        let total_frames = total_frames.max(1);
        self.total_frames = total_frames;
        for element in self.elements.values_mut() {
            element.fit_total_frames(total_frames);
        }
    }

    /// Append a new element of a kind, spanning `[0, 1)`
    pub fn add_element(&mut self, kind: ElementKind) -> ElementId {
        let id = self.push_element(Element::new(kind));
        tracing::debug!("Added {} element {:?}", kind.name(), id);
        id
    }

    /// Append an existing element
    pub fn push_element(&mut self, element: Element) -> ElementId {
        let id = element.id();
        self.elements.insert(id, element);
        id
    }

    /// Remove an element, keeping the order of the rest
    pub fn delete_element(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.elements.shift_remove(&id);
        if removed.is_some() {
            tracing::debug!("Deleted element {:?}", id);
        }
        removed
    }

    /// Get an element
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Get a mutable element
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Get an element by priority index
    pub fn element_at(&self, index: usize) -> Option<&Element> {
        self.elements.get_index(index).map(|(_, element)| element)
    }

    /// Priority index of an element
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.get_index_of(&id)
    }

    /// Elements in priority order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Mutable elements in priority order
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.values_mut()
    }

    /// Get element count
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Move the element at `source` so it lands before the element now at `target`.
    ///
    /// `target` may equal the element count to move to the end. Out of range
    /// indices leave the order unchanged.
    pub fn move_element_priority(&mut self, source: usize, target: usize) {
        let len = self.elements.len();
        if source >= len || target > len {
            return;
        }
        let target = if target > source { target - 1 } else { target };
        self.elements.move_index(source, target);
        tracing::debug!("Moved element priority {} -> {}", source, target);
    }

    /// Open `count` frames at `base` across every element and comment
    pub fn insert_frames(&mut self, base: Frame, count: Frame) {
        if count <= 0 {
            return;
        }
        self.total_frames = self.total_frames.saturating_add(count);
        for element in self.elements.values_mut() {
            element.insert_frames(base, count);
        }
        self.comments.insert_frames(base, count);
        tracing::debug!("Inserted {} frames at {}", count, base);
    }

    /// Remove the frames `[base, base + count)`. Refuses to remove the whole document.
    pub fn delete_frames(&mut self, base: Frame, count: Frame) {
        if count <= 0 || count >= self.total_frames {
            return;
        }
        self.total_frames -= count;
        for element in self.elements.values_mut() {
            element.delete_frames(base, count);
        }
        self.comments.delete_frames(base, count);
        tracing::debug!("Deleted {} frames at {}", count, base);
    }

    /// Per-element snapshots at a frame, in priority order
    pub fn frame_data(&self, frame: Frame) -> Vec<(ElementId, FrameData)> {
        self.elements
            .iter()
            .map(|(&id, element)| (id, element.frame_data(frame)))
            .collect()
    }

    /// Get the comments
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    /// Insert a comment in frame order
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.add(comment);
    }

    /// Set the comment text on a frame
    pub fn set_comment(&mut self, frame: Frame, text: impl Into<String>) {
        self.comments.set(frame, text);
    }

    /// Remove the comment on a frame
    pub fn delete_comment(&mut self, frame: Frame) -> Option<Comment> {
        self.comments.remove(frame)
    }

    /// Snapshot the document as RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Restore a document from a RON snapshot
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

impl Default for PlayData {
    fn default() -> Self {
        Self::new()
    }
}
