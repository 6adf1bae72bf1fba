// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authoring commands.
//!
//! An [`Editor`] owns the open document and the current authoring frame.
//! Every edit arrives as an [`EditCommand`] and is applied synchronously.

use crate::asset::{Asset, AssetKind};
use crate::config::TimelineConfig;
use crate::element::{Element, ElementId, ElementKind};
use crate::keyframe::{Frame, ParamValue};
use crate::markup::{self, DocumentError};
use crate::param::{Param, ValueMismatch};
use crate::play_data::PlayData;
use crate::setting::Setting;
use std::path::Path;

/// Error type for command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Element not found
    #[error("Element not found: {0:?}")]
    ElementNotFound(ElementId),

    /// Param index out of range
    #[error("Element {element:?} has no param at index {index}")]
    ParamNotFound {
        /// Element searched
        element: ElementId,
        /// Requested param index
        index: usize,
    },

    /// Asset kind not in the element's schema
    #[error("Element {element:?} has no {kind:?} asset")]
    AssetNotFound {
        /// Element searched
        element: ElementId,
        /// Requested asset kind
        kind: AssetKind,
    },

    /// Value of the wrong type
    #[error("Invalid value: {0}")]
    Value(#[from] ValueMismatch),
}

/// An authoring edit
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Add an element spanning the current frame to the end
    AddElement(ElementKind),
    /// Delete an element
    DeleteElement(ElementId),
    /// Rename an element
    RenameElement {
        /// Target element
        element: ElementId,
        /// New name
        name: String,
    },
    /// Expand or collapse an element row
    ExpandElement {
        /// Target element
        element: ElementId,
        /// Whether the row is expanded
        expanded: bool,
    },
    /// Move the authoring cursor
    SetCurrentFrame(Frame),
    /// Resize the document
    SetTotalFrames(Frame),
    /// Toggle a keyframe and move the cursor onto it
    SwitchKeyFrame {
        /// Target element
        element: ElementId,
        /// Param index within the element
        param: usize,
        /// Keyframe frame
        frame: Frame,
    },
    /// Add a keyframe without changing the value there
    AddKeyFrame {
        /// Target element
        element: ElementId,
        /// Param index within the element
        param: usize,
        /// Keyframe frame
        frame: Frame,
    },
    /// Move one keyframe
    MoveKeyFrame {
        /// Target element
        element: ElementId,
        /// Param index within the element
        param: usize,
        /// Current keyframe frame
        frame: Frame,
        /// Offset in frames
        delta: Frame,
    },
    /// Delete one keyframe
    DeleteKeyFrame {
        /// Target element
        element: ElementId,
        /// Param index within the element
        param: usize,
        /// Keyframe frame
        frame: Frame,
    },
    /// Translate a whole element in time
    MoveElement {
        /// Target element
        element: ElementId,
        /// Offset in frames
        delta: Frame,
    },
    /// Set an element's first active frame
    SetStartFrame {
        /// Target element
        element: ElementId,
        /// New start frame
        frame: Frame,
    },
    /// Set an element's end frame
    SetEndFrame {
        /// Target element
        element: ElementId,
        /// New end frame
        frame: Frame,
    },
    /// Write a param value at the current frame
    SetParamValue {
        /// Target element
        element: ElementId,
        /// Param index within the element
        param: usize,
        /// New value
        value: ParamValue,
    },
    /// Replace an asset slot
    SetAsset {
        /// Target element
        element: ElementId,
        /// New asset
        asset: Asset,
    },
    /// Pick the animator condition
    SelectCondition {
        /// Target element
        element: ElementId,
        /// Condition name
        condition: String,
    },
    /// Replace a setting slot
    ApplySetting {
        /// Target element
        element: ElementId,
        /// New setting
        setting: Setting,
    },
    /// Reorder elements
    MoveElementPriority {
        /// Index to move from
        source: usize,
        /// Index to land before
        target: usize,
    },
    /// Open frames
    InsertFrames {
        /// First shifted frame
        base: Frame,
        /// Frames to open
        count: Frame,
    },
    /// Remove frames
    DeleteFrames {
        /// First removed frame
        base: Frame,
        /// Frames to remove
        count: Frame,
    },
    /// Set the comment on a frame
    SetComment {
        /// Comment frame
        frame: Frame,
        /// Comment text
        text: String,
    },
    /// Delete the comment on a frame
    DeleteComment(Frame),
}

/// What an applied command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Editor state changed
    Changed,
    /// Nothing to do
    Unchanged,
    /// An element was added
    ElementAdded(ElementId),
    /// A param value was written
    ValueSet {
        /// Whether a new keyframe was created
        created: bool,
    },
}

impl EditOutcome {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Changed
        } else {
            Self::Unchanged
        }
    }
}

/// The authoring session
#[derive(Debug, Clone)]
pub struct Editor {
    data: PlayData,
    current_frame: Frame,
    config: TimelineConfig,
}

impl Editor {
    /// Create an editor with an empty document
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            data: PlayData::with_total_frames(config.default_total_frames),
            current_frame: 0,
            config,
        }
    }

    /// Create an editor over an existing document
    pub fn with_document(data: PlayData, config: TimelineConfig) -> Self {
        Self {
            data,
            current_frame: 0,
            config,
        }
    }

    /// Open a document file, replacing the current one
    pub fn open(&mut self, path: &Path) -> Result<(), DocumentError> {
        self.data = markup::load_document(path, &self.config)?;
        self.current_frame = 0;
        Ok(())
    }

    /// Save the document to a file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        markup::save_document(path, &self.data, &self.config)
    }

    /// Start over with an empty document
    pub fn reset(&mut self) {
        self.data = PlayData::with_total_frames(self.config.default_total_frames);
        self.current_frame = 0;
        tracing::debug!("Started new document");
    }

    /// The open document
    pub fn data(&self) -> &PlayData {
        &self.data
    }

    /// Authoring cursor
    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    /// Editor config
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Read a param at the current frame
    pub fn param_value(&self, element: ElementId, param: usize) -> Result<ParamValue, CommandError> {
        let target = self
            .data
            .element(element)
            .ok_or(CommandError::ElementNotFound(element))?;
        let param = target.param(param).ok_or(CommandError::ParamNotFound {
            element,
            index: param,
        })?;
        Ok(param.value_at(self.current_frame))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, CommandError> {
        self.data
            .element_mut(id)
            .ok_or(CommandError::ElementNotFound(id))
    }

    fn param_mut(&mut self, element: ElementId, index: usize) -> Result<&mut Param, CommandError> {
        self.element_mut(element)?
            .param_mut(index)
            .ok_or(CommandError::ParamNotFound { element, index })
    }

    /// Apply one command
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, CommandError> {
        tracing::trace!("Applying {:?}", command);
        let outcome = match command {
            EditCommand::AddElement(kind) => {
                let (start, end) = (self.current_frame, self.data.total_frames());
                let id = self.data.add_element(kind);
                let element = self.element_mut(id)?;
                element.set_start_frame(start);
                element.set_end_frame(end);
                EditOutcome::ElementAdded(id)
            }
            EditCommand::DeleteElement(id) => {
                self.data
                    .delete_element(id)
                    .ok_or(CommandError::ElementNotFound(id))?;
                EditOutcome::Changed
            }
            EditCommand::RenameElement { element, name } => {
                self.element_mut(element)?.name = name;
                EditOutcome::Changed
            }
            EditCommand::ExpandElement { element, expanded } => {
                self.element_mut(element)?.expanded = expanded;
                EditOutcome::Changed
            }
            EditCommand::SetCurrentFrame(frame) => {
                self.current_frame = frame;
                EditOutcome::Changed
            }
            EditCommand::SetTotalFrames(total) => {
                if total <= 0 {
                    return Ok(EditOutcome::Unchanged);
                }
                self.data.set_total_frames(total);
                EditOutcome::Changed
            }
            EditCommand::SwitchKeyFrame {
                element,
                param,
                frame,
            } => {
                self.param_mut(element, param)?.switch_keyframe(frame);
                self.current_frame = frame;
                EditOutcome::Changed
            }
            EditCommand::AddKeyFrame {
                element,
                param,
                frame,
            } => {
                self.param_mut(element, param)?.add_keyframe(frame);
                EditOutcome::Changed
            }
            EditCommand::MoveKeyFrame {
                element,
                param,
                frame,
                delta,
            } => EditOutcome::from_changed(self.param_mut(element, param)?.move_keyframe(frame, delta)),
            EditCommand::DeleteKeyFrame {
                element,
                param,
                frame,
            } => EditOutcome::from_changed(self.param_mut(element, param)?.delete_keyframe(frame)),
            EditCommand::MoveElement { element, delta } => {
                self.element_mut(element)?.move_by(delta);
                EditOutcome::Changed
            }
            EditCommand::SetStartFrame { element, frame } => {
                self.element_mut(element)?.set_start_frame(frame);
                EditOutcome::Changed
            }
            EditCommand::SetEndFrame { element, frame } => {
                self.element_mut(element)?.set_end_frame(frame);
                EditOutcome::Changed
            }
            EditCommand::SetParamValue {
                element,
                param,
                value,
            } => {
                let frame = self.current_frame;
                let created = self.param_mut(element, param)?.set_value(frame, value)?;
                EditOutcome::ValueSet { created }
            }
            EditCommand::SetAsset { element, asset } => {
                let kind = asset.kind();
                if !self.element_mut(element)?.set_asset(asset) {
                    return Err(CommandError::AssetNotFound { element, kind });
                }
                EditOutcome::Changed
            }
            EditCommand::SelectCondition { element, condition } => {
                let kind = AssetKind::Animator;
                let asset = self
                    .element_mut(element)?
                    .asset_mut(kind)
                    .ok_or(CommandError::AssetNotFound { element, kind })?;
                EditOutcome::from_changed(asset.select_condition(condition))
            }
            EditCommand::ApplySetting { element, setting } => {
                EditOutcome::from_changed(self.element_mut(element)?.set_setting(setting))
            }
            EditCommand::MoveElementPriority { source, target } => {
                self.data.move_element_priority(source, target);
                EditOutcome::Changed
            }
            EditCommand::InsertFrames { base, count } => {
                if count <= 0 {
                    return Ok(EditOutcome::Unchanged);
                }
                self.data.insert_frames(base, count);
                EditOutcome::Changed
            }
            EditCommand::DeleteFrames { base, count } => {
                if count <= 0 {
                    return Ok(EditOutcome::Unchanged);
                }
                let total = self.data.total_frames();
                // Always leave at least one frame
                let count = if count >= total { total - 1 } else { count };
                self.data.delete_frames(base, count);
                EditOutcome::from_changed(self.data.total_frames() != total)
            }
            EditCommand::SetComment { frame, text } => {
                self.data.set_comment(frame, text);
                EditOutcome::Changed
            }
            EditCommand::DeleteComment(frame) => {
                EditOutcome::from_changed(self.data.delete_comment(frame).is_some())
            }
        };
        Ok(outcome)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamKind;
    use crate::setting::EventFlags;

    fn editor_with(kind: ElementKind) -> (Editor, ElementId) {
        let mut editor = Editor::default();
        let EditOutcome::ElementAdded(id) = editor.apply(EditCommand::AddElement(kind)).unwrap() else {
            panic!("expected an added element");
        };
        (editor, id)
    }

    #[test]
    fn test_add_element_spans_cursor_to_end() {
        let mut editor = Editor::default();
        editor.apply(EditCommand::SetCurrentFrame(30)).unwrap();
        let EditOutcome::ElementAdded(id) = editor.apply(EditCommand::AddElement(ElementKind::Image)).unwrap()
        else {
            panic!("expected an added element");
        };
        let element = editor.data().element(id).unwrap();
        assert_eq!((element.start_frame(), element.end_frame()), (30, 600));
    }

    #[test]
    fn test_set_param_value_at_cursor() {
        let (mut editor, id) = editor_with(ElementKind::Sound);
        editor.apply(EditCommand::SetCurrentFrame(12)).unwrap();
        let set = |value| EditCommand::SetParamValue {
            element: id,
            param: 0,
            value,
        };
        assert_eq!(
            editor.apply(set(ParamValue::Float(0.3))).unwrap(),
            EditOutcome::ValueSet { created: true }
        );
        assert_eq!(
            editor.apply(set(ParamValue::Float(0.4))).unwrap(),
            EditOutcome::ValueSet { created: false }
        );
        assert_eq!(editor.param_value(id, 0).unwrap(), ParamValue::Float(0.4));

        let err = editor.apply(set(ParamValue::Bool(true))).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Value(ValueMismatch {
                param: ParamKind::Volume,
                ..
            })
        ));
    }

    #[test]
    fn test_switch_keyframe_moves_cursor() {
        let (mut editor, id) = editor_with(ElementKind::Image);
        editor
            .apply(EditCommand::SwitchKeyFrame {
                element: id,
                param: 1,
                frame: 44,
            })
            .unwrap();
        assert_eq!(editor.current_frame(), 44);
        assert!(editor.data().element(id).unwrap().params()[1].has_keyframe(44));
    }

    #[test]
    fn test_move_keyframe_reports_collision() {
        let (mut editor, id) = editor_with(ElementKind::Panel);
        for frame in [3, 7] {
            editor
                .apply(EditCommand::AddKeyFrame {
                    element: id,
                    param: 0,
                    frame,
                })
                .unwrap();
        }
        let move_by = |delta| EditCommand::MoveKeyFrame {
            element: id,
            param: 0,
            frame: 3,
            delta,
        };
        assert_eq!(editor.apply(move_by(4)).unwrap(), EditOutcome::Unchanged);
        assert_eq!(editor.apply(move_by(1)).unwrap(), EditOutcome::Changed);
    }

    #[test]
    fn test_delete_frames_keeps_one_frame() {
        let mut editor = Editor::default();
        assert_eq!(
            editor
                .apply(EditCommand::DeleteFrames { base: 0, count: 0 })
                .unwrap(),
            EditOutcome::Unchanged
        );
        editor
            .apply(EditCommand::DeleteFrames {
                base: 0,
                count: 10_000,
            })
            .unwrap();
        assert_eq!(editor.data().total_frames(), 1);
    }

    #[test]
    fn test_insert_frames_ignores_non_positive_count() {
        let mut editor = Editor::default();
        assert_eq!(
            editor
                .apply(EditCommand::InsertFrames { base: 0, count: -3 })
                .unwrap(),
            EditOutcome::Unchanged
        );
        editor
            .apply(EditCommand::InsertFrames { base: 0, count: 5 })
            .unwrap();
        assert_eq!(editor.data().total_frames(), 605);
    }

    #[test]
    fn test_set_total_frames_ignores_non_positive() {
        let (mut editor, id) = editor_with(ElementKind::Text);
        for total in [-1, 0] {
            assert_eq!(
                editor.apply(EditCommand::SetTotalFrames(total)).unwrap(),
                EditOutcome::Unchanged
            );
        }
        editor.apply(EditCommand::SetTotalFrames(100)).unwrap();
        assert_eq!(editor.data().total_frames(), 100);
        assert_eq!(editor.data().element(id).unwrap().end_frame(), 100);
    }

    #[test]
    fn test_unknown_targets_are_errors() {
        let (mut editor, id) = editor_with(ElementKind::Panel);
        let missing = ElementId::new();
        assert!(matches!(
            editor.apply(EditCommand::DeleteElement(missing)),
            Err(CommandError::ElementNotFound(_))
        ));
        assert!(matches!(
            editor.param_value(id, 9),
            Err(CommandError::ParamNotFound { index: 9, .. })
        ));
        assert!(matches!(
            editor.apply(EditCommand::SetAsset {
                element: id,
                asset: Asset::new(AssetKind::Audio),
            }),
            Err(CommandError::AssetNotFound {
                kind: AssetKind::Audio,
                ..
            })
        ));
    }

    #[test]
    fn test_assets_and_settings() {
        let (mut editor, id) = editor_with(ElementKind::Image);
        let mut sprite = Asset::new(AssetKind::Image);
        sprite.path = "Sprites/hero.png".into();
        editor
            .apply(EditCommand::SetAsset {
                element: id,
                asset: sprite,
            })
            .unwrap();
        editor
            .apply(EditCommand::SelectCondition {
                element: id,
                condition: "Wave".into(),
            })
            .unwrap();
        assert_eq!(
            editor
                .apply(EditCommand::ApplySetting {
                    element: id,
                    setting: Setting::Loop(true),
                })
                .unwrap(),
            EditOutcome::Unchanged
        );
        editor
            .apply(EditCommand::ApplySetting {
                element: id,
                setting: Setting::Flags(EventFlags::FLAG_07),
            })
            .unwrap();

        let element = editor.data().element(id).unwrap();
        assert!(element.asset(AssetKind::Image).unwrap().is_assigned());
        assert_eq!(element.asset(AssetKind::Animator).unwrap().condition(), Some("Wave"));
        assert_eq!(element.flags(), EventFlags::FLAG_07);
    }

    #[test]
    fn test_comments_and_reset() {
        let (mut editor, _) = editor_with(ElementKind::Choices);
        editor
            .apply(EditCommand::SetComment {
                frame: 8,
                text: "branch".into(),
            })
            .unwrap();
        assert_eq!(
            editor.apply(EditCommand::DeleteComment(9)).unwrap(),
            EditOutcome::Unchanged
        );
        assert_eq!(
            editor.apply(EditCommand::DeleteComment(8)).unwrap(),
            EditOutcome::Changed
        );

        let config = TimelineConfig {
            default_total_frames: 90,
            ..TimelineConfig::default()
        };
        let mut editor = Editor::new(config);
        editor.apply(EditCommand::AddElement(ElementKind::Sound)).unwrap();
        editor.apply(EditCommand::SetCurrentFrame(20)).unwrap();
        editor.reset();
        assert_eq!(editor.data().element_count(), 0);
        assert_eq!(editor.data().total_frames(), 90);
        assert_eq!(editor.current_frame(), 0);
    }

    #[test]
    fn test_priority_and_rename() {
        let (mut editor, first) = editor_with(ElementKind::Panel);
        editor.apply(EditCommand::AddElement(ElementKind::Text)).unwrap();
        editor
            .apply(EditCommand::MoveElementPriority { source: 0, target: 2 })
            .unwrap();
        assert_eq!(editor.data().index_of(first), Some(1));
        editor
            .apply(EditCommand::RenameElement {
                element: first,
                name: "Backdrop".into(),
            })
            .unwrap();
        assert_eq!(editor.data().element(first).unwrap().name, "Backdrop");
    }
}
