// SPDX-License-Identifier: MIT OR Apache-2.0
//! Params: one animatable attribute's full timeline.
//!
//! A [`Timeline`] is a frame-sorted list of keyframes with no duplicate
//! frames. New keyframes are placed by binary search, never appended and
//! re-sorted. A [`Param`] pairs a timeline of the right value type with a
//! [`ParamKind`], which fixes the default value and evaluation policy.

use crate::keyframe::{
    ChoiceData, Color, Evaluation, Frame, KeyFrame, Keyable, ParamValue, ValueKind, Vec2, WHITE,
};
use serde::{Deserialize, Serialize};

/// Type of param
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Position (x, y)
    Position,
    /// Rotation in degrees
    Rotation,
    /// Scale (x, y)
    Scale,
    /// Tint color
    Color,
    /// Animator transition index
    Animator,
    /// Text label (table key)
    TextLabel,
    /// Sound volume
    Volume,
    /// Choice entry
    Choices,
    /// Raycast target toggle
    Raycast,
}

impl ParamKind {
    /// All param kinds, in type-tag order
    pub const ALL: [ParamKind; 9] = [
        Self::Position,
        Self::Rotation,
        Self::Scale,
        Self::Color,
        Self::Animator,
        Self::TextLabel,
        Self::Volume,
        Self::Choices,
        Self::Raycast,
    ];

    /// Get the display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Rotation => "Rotation",
            Self::Scale => "Scale",
            Self::Color => "Color",
            Self::Animator => "Animator",
            Self::TextLabel => "TextLabel",
            Self::Volume => "Volume",
            Self::Choices => "Choices",
            Self::Raycast => "Raycast",
        }
    }

    /// Type tag used in documents
    pub fn code(self) -> i32 {
        match self {
            Self::Position => 0,
            Self::Rotation => 1,
            Self::Scale => 2,
            Self::Color => 3,
            Self::Animator => 4,
            Self::TextLabel => 5,
            Self::Volume => 6,
            Self::Choices => 7,
            Self::Raycast => 8,
        }
    }

    /// Look up a type tag
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Value type stored by this kind
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Position | Self::Scale => ValueKind::Vec2,
            Self::Rotation | Self::Volume => ValueKind::Float,
            Self::Color => ValueKind::Color,
            Self::Animator => ValueKind::Int,
            Self::TextLabel => ValueKind::Text,
            Self::Choices => ValueKind::Choice,
            Self::Raycast => ValueKind::Bool,
        }
    }

    /// How frames between keyframes evaluate
    pub fn evaluation(self) -> Evaluation {
        match self {
            Self::Position | Self::Rotation | Self::Scale | Self::Color | Self::Volume => {
                Evaluation::Linear
            }
            // The animator index is a state, not a blend
            Self::Animator | Self::Raycast => Evaluation::Hold,
            Self::TextLabel | Self::Choices => Evaluation::Trigger,
        }
    }

    /// Value before the first keyframe (and between triggers)
    pub fn default_value(self) -> ParamValue {
        match self {
            Self::Position => ParamValue::Vec2([0.0, 0.0]),
            Self::Rotation => ParamValue::Float(0.0),
            Self::Scale => ParamValue::Vec2([1.0, 1.0]),
            Self::Color => ParamValue::Color(WHITE),
            Self::Animator => ParamValue::Int(-1),
            Self::TextLabel => ParamValue::Text(String::new()),
            Self::Volume => ParamValue::Float(1.0),
            Self::Choices => ParamValue::Choice(ChoiceData::empty()),
            Self::Raycast => ParamValue::Bool(false),
        }
    }

    fn channel(self) -> Channel {
        let mode = self.evaluation();
        match self.default_value() {
            ParamValue::Vec2(d) => Channel::Vec2(Timeline::new(d, mode)),
            ParamValue::Float(d) => Channel::Float(Timeline::new(d, mode)),
            ParamValue::Color(d) => Channel::Color(Timeline::new(d, mode)),
            ParamValue::Int(d) => Channel::Int(Timeline::new(d, mode)),
            ParamValue::Text(d) => Channel::Text(Timeline::new(d, mode)),
            ParamValue::Bool(d) => Channel::Bool(Timeline::new(d, mode)),
            ParamValue::Choice(d) => Channel::Choice(Timeline::new(d, mode)),
        }
    }
}

/// Frame-sorted keyframes of one value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline<T> {
    keyframes: Vec<KeyFrame<T>>,
    default: T,
    evaluation: Evaluation,
}

impl<T: Keyable> Timeline<T> {
    /// Create an empty timeline
    pub fn new(default: T, evaluation: Evaluation) -> Self {
        Self {
            keyframes: Vec::new(),
            default,
            evaluation,
        }
    }

    /// Get all keyframes
    pub fn keyframes(&self) -> &[KeyFrame<T>] {
        &self.keyframes
    }

    /// Get keyframe at frame (if exists)
    pub fn keyframe_at(&self, frame: Frame) -> Option<&KeyFrame<T>> {
        self.search(frame).ok().map(|idx| &self.keyframes[idx])
    }

    fn search(&self, frame: Frame) -> Result<usize, usize> {
        self.keyframes.binary_search_by_key(&frame, |k| k.frame())
    }

    /// Evaluate the timeline at a frame
    pub fn evaluate(&self, frame: Frame) -> T {
        // First keyframe strictly after `frame`; the one before it is current
        let next_idx = self.keyframes.partition_point(|k| k.frame() <= frame);
        let Some(current) = next_idx.checked_sub(1).map(|idx| &self.keyframes[idx]) else {
            return self.default.clone();
        };

        match self.evaluation {
            Evaluation::Hold => current.value.clone(),
            Evaluation::Trigger if current.frame() == frame => current.value.clone(),
            Evaluation::Trigger => self.default.clone(),
            Evaluation::Linear => match self.keyframes.get(next_idx) {
                None => current.value.clone(),
                Some(next) => {
                    let t = (frame - current.frame()) as f32 / (next.frame() - current.frame()) as f32;
                    T::interpolate(&current.value, &next.value, t)
                }
            },
        }
    }

    /// Insert or update keyframe at frame. Returns whether a keyframe was created.
    pub fn set(&mut self, frame: Frame, value: T) -> bool {
        match self.search(frame) {
            Ok(idx) => {
                self.keyframes[idx].value = value;
                false
            }
            Err(idx) => {
                self.keyframes.insert(idx, KeyFrame::new(frame, value));
                true
            }
        }
    }

    /// Add a keyframe holding the value the timeline already has at that frame
    pub fn add_keyframe(&mut self, frame: Frame) {
        let value = self.evaluate(frame);
        self.set(frame, value);
    }

    /// Delete the keyframe at frame, or add one if there is none
    pub fn switch_keyframe(&mut self, frame: Frame) {
        if self.remove(frame).is_none() {
            self.add_keyframe(frame);
        }
    }

    /// Remove a keyframe
    pub fn remove(&mut self, frame: Frame) -> Option<KeyFrame<T>> {
        let idx = self.search(frame).ok()?;
        Some(self.keyframes.remove(idx))
    }

    /// Move one keyframe by `delta` frames. Never overwrites another keyframe.
    pub fn move_keyframe(&mut self, frame: Frame, delta: Frame) -> bool {
        let Ok(idx) = self.search(frame) else {
            return false;
        };
        let Err(target_idx) = self.search(frame.saturating_add(delta)) else {
            return false;
        };

        let mut keyframe = self.keyframes.remove(idx);
        keyframe.shift(delta);
        // The removal shifted everything past `idx` one slot left
        let target_idx = if target_idx > idx { target_idx - 1 } else { target_idx };
        self.keyframes.insert(target_idx, keyframe);
        true
    }

    /// Offset all keyframes by a frame delta
    pub fn shift_all(&mut self, delta: Frame) {
        for keyframe in &mut self.keyframes {
            keyframe.shift(delta);
        }
    }

    /// Shift every keyframe at or after `base` right by `count`
    pub fn insert_frames(&mut self, base: Frame, count: Frame) {
        for keyframe in self.keyframes.iter_mut().filter(|k| k.frame() >= base) {
            keyframe.shift(count);
        }
    }

    /// Drop keyframes in `[base, base + count)` and shift later ones left by `count`
    pub fn delete_frames(&mut self, base: Frame, count: Frame) {
        if count <= 0 {
            return;
        }
        // No end past Frame::MAX means everything from `base` on goes
        let end = base.checked_add(count);
        self.keyframes.retain_mut(|keyframe| match end {
            Some(end) if keyframe.frame() >= end => {
                keyframe.shift(-count);
                true
            }
            _ => keyframe.frame() < base,
        });
    }
}

/// Keyframes of a param, by value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Channel {
    /// 2D vector timeline
    Vec2(Timeline<Vec2>),
    /// Float timeline
    Float(Timeline<f32>),
    /// Color timeline
    Color(Timeline<Color>),
    /// Integer timeline
    Int(Timeline<i32>),
    /// String timeline
    Text(Timeline<String>),
    /// Boolean timeline
    Bool(Timeline<bool>),
    /// Choice timeline
    Choice(Timeline<ChoiceData>),
}

/// Run the same generic timeline operation whatever the value type
macro_rules! with_timeline {
    ($channel:expr, $timeline:ident => $body:expr) => {
        match $channel {
            Channel::Vec2($timeline) => $body,
            Channel::Float($timeline) => $body,
            Channel::Color($timeline) => $body,
            Channel::Int($timeline) => $body,
            Channel::Text($timeline) => $body,
            Channel::Bool($timeline) => $body,
            Channel::Choice($timeline) => $body,
        }
    };
}

/// A value of the wrong type was offered to a param
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{param:?} param cannot hold a {found:?} value")]
pub struct ValueMismatch {
    /// Param that rejected the value
    pub param: ParamKind,
    /// Type of the offered value
    pub found: ValueKind,
}

/// One animatable attribute of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    kind: ParamKind,
    name: String,
    segment: i32,
    channel: Channel,
}

impl Param {
    /// Segment of a param that is the only one of its kind on its element
    pub const NO_SEGMENT: i32 = -1;

    /// Create a new param with no keyframes
    pub fn new(kind: ParamKind) -> Self {
        Self {
            kind,
            name: kind.name().to_string(),
            segment: Self::NO_SEGMENT,
            channel: kind.channel(),
        }
    }

    /// Param kind
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Param name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index among same-kind params on one element (`NO_SEGMENT` if unique)
    pub fn segment(&self) -> i32 {
        self.segment
    }

    /// Set the segment index
    pub fn set_segment(&mut self, segment: i32) {
        self.segment = segment;
    }

    /// Typed keyframe storage
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Evaluate the param at a frame
    pub fn value_at(&self, frame: Frame) -> ParamValue {
        match &self.channel {
            Channel::Vec2(t) => ParamValue::Vec2(t.evaluate(frame)),
            Channel::Float(t) => ParamValue::Float(t.evaluate(frame)),
            Channel::Color(t) => ParamValue::Color(t.evaluate(frame)),
            Channel::Int(t) => ParamValue::Int(t.evaluate(frame)),
            Channel::Text(t) => ParamValue::Text(t.evaluate(frame)),
            Channel::Bool(t) => ParamValue::Bool(t.evaluate(frame)),
            Channel::Choice(t) => ParamValue::Choice(t.evaluate(frame)),
        }
    }

    /// Insert or update keyframe at frame. `Ok(true)` means a keyframe was created.
    pub fn set_value(&mut self, frame: Frame, value: ParamValue) -> Result<bool, ValueMismatch> {
        let created = match (&mut self.channel, value) {
            (Channel::Vec2(t), ParamValue::Vec2(v)) => t.set(frame, v),
            (Channel::Float(t), ParamValue::Float(v)) => t.set(frame, v),
            (Channel::Color(t), ParamValue::Color(v)) => t.set(frame, v),
            (Channel::Int(t), ParamValue::Int(v)) => t.set(frame, v),
            (Channel::Text(t), ParamValue::Text(v)) => t.set(frame, v),
            (Channel::Bool(t), ParamValue::Bool(v)) => t.set(frame, v),
            (Channel::Choice(t), ParamValue::Choice(v)) => t.set(frame, v),
            (_, value) => {
                return Err(ValueMismatch {
                    param: self.kind,
                    found: value.kind(),
                })
            }
        };
        Ok(created)
    }

    /// Add a keyframe without changing the value at that frame
    pub fn add_keyframe(&mut self, frame: Frame) {
        with_timeline!(&mut self.channel, t => t.add_keyframe(frame));
    }

    /// Toggle the keyframe at frame
    pub fn switch_keyframe(&mut self, frame: Frame) {
        with_timeline!(&mut self.channel, t => t.switch_keyframe(frame));
    }

    /// Move the keyframe at `frame` by `delta`. Fails on a missing source or an occupied target.
    pub fn move_keyframe(&mut self, frame: Frame, delta: Frame) -> bool {
        with_timeline!(&mut self.channel, t => t.move_keyframe(frame, delta))
    }

    /// Delete the keyframe at frame. Returns whether one was removed.
    pub fn delete_keyframe(&mut self, frame: Frame) -> bool {
        with_timeline!(&mut self.channel, t => t.remove(frame).is_some())
    }

    /// Offset every keyframe by `delta`
    pub fn shift_all(&mut self, delta: Frame) {
        with_timeline!(&mut self.channel, t => t.shift_all(delta));
    }

    /// Open `count` frames at `base`
    pub fn insert_frames(&mut self, base: Frame, count: Frame) {
        with_timeline!(&mut self.channel, t => t.insert_frames(base, count));
    }

    /// Remove the frames `[base, base + count)`
    pub fn delete_frames(&mut self, base: Frame, count: Frame) {
        with_timeline!(&mut self.channel, t => t.delete_frames(base, count));
    }

    /// Check if a keyframe exists at frame
    pub fn has_keyframe(&self, frame: Frame) -> bool {
        with_timeline!(&self.channel, t => t.keyframe_at(frame).is_some())
    }

    /// Get keyframe count
    pub fn keyframe_count(&self) -> usize {
        with_timeline!(&self.channel, t => t.keyframes().len())
    }

    /// Frames holding a keyframe, ascending
    pub fn keyframe_frames(&self) -> Vec<Frame> {
        with_timeline!(&self.channel, t => t.keyframes().iter().map(KeyFrame::frame).collect())
    }

    /// Stored keyframes as dynamic values, ascending by frame
    pub fn keyframes(&self) -> Vec<(Frame, ParamValue)> {
        fn collect<T: Clone>(t: &Timeline<T>, wrap: fn(T) -> ParamValue) -> Vec<(Frame, ParamValue)> {
            t.keyframes
                .iter()
                .map(|k| (k.frame(), wrap(k.value.clone())))
                .collect()
        }

        match &self.channel {
            Channel::Vec2(t) => collect(t, ParamValue::Vec2),
            Channel::Float(t) => collect(t, ParamValue::Float),
            Channel::Color(t) => collect(t, ParamValue::Color),
            Channel::Int(t) => collect(t, ParamValue::Int),
            Channel::Text(t) => collect(t, ParamValue::Text),
            Channel::Bool(t) => collect(t, ParamValue::Bool),
            Channel::Choice(t) => collect(t, ParamValue::Choice),
        }
    }
}
