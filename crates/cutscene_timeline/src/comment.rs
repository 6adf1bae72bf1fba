// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-indexed editor notes.

use crate::keyframe::Frame;
use serde::{Deserialize, Serialize};

/// A note pinned to one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Frame the note is pinned to
    pub frame: Frame,
    /// Note text
    pub text: String,
}

impl Comment {
    /// Create a new comment
    pub fn new(frame: Frame, text: impl Into<String>) -> Self {
        Self {
            frame,
            text: text.into(),
        }
    }
}

/// Frame-sorted comments, at most one per frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comments {
    entries: Vec<Comment>,
}

impl Comments {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// All comments, ascending by frame
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.entries.iter()
    }

    /// Number of comments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no comments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, frame: Frame) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&frame, |c| c.frame)
    }

    /// Comment at a frame
    pub fn get(&self, frame: Frame) -> Option<&Comment> {
        self.search(frame).ok().map(|idx| &self.entries[idx])
    }

    /// Insert a comment in frame order. A comment already on that frame is replaced.
    pub fn add(&mut self, comment: Comment) {
        match self.search(comment.frame) {
            Ok(idx) => self.entries[idx] = comment,
            Err(idx) => self.entries.insert(idx, comment),
        }
    }

    /// Set the text on a frame, creating the comment if needed
    pub fn set(&mut self, frame: Frame, text: impl Into<String>) {
        match self.search(frame) {
            Ok(idx) => self.entries[idx].text = text.into(),
            Err(idx) => self.entries.insert(idx, Comment::new(frame, text)),
        }
    }

    /// Remove the comment on a frame
    pub fn remove(&mut self, frame: Frame) -> Option<Comment> {
        let idx = self.search(frame).ok()?;
        Some(self.entries.remove(idx))
    }

    /// Shift comments at or after `base` right by `count`
    pub fn insert_frames(&mut self, base: Frame, count: Frame) {
        for comment in self.entries.iter_mut().filter(|c| c.frame >= base) {
            comment.frame = comment.frame.saturating_add(count);
        }
    }

    /// Drop comments in `[base, base + count)` and shift later ones left
    pub fn delete_frames(&mut self, base: Frame, count: Frame) {
        if count <= 0 {
            return;
        }
        let end = base.checked_add(count);
        self.entries.retain_mut(|comment| match end {
            Some(end) if comment.frame >= end => {
                comment.frame -= count;
                true
            }
            _ => comment.frame < base,
        });
    }
}

impl<'a> IntoIterator for &'a Comments {
    type Item = &'a Comment;
    type IntoIter = std::slice::Iter<'a, Comment>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Comment> for Comments {
    fn from_iter<I: IntoIterator<Item = Comment>>(iter: I) -> Self {
        let mut comments = Comments::new();
        for comment in iter {
            comments.add(comment);
        }
        comments
    }
}
