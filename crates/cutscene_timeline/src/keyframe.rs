// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the timeline.

use crate::setting::EventFlags;
use serde::{Deserialize, Serialize};

/// Discrete timeline position. Signed so that deltas and shifts stay in one type.
pub type Frame = i32;

/// 2D vector (x, y)
pub type Vec2 = [f32; 2];

/// Color (RGBA)
pub type Color = [f32; 4];

/// Opaque white
pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

/// How a timeline evaluates the frames between its keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Evaluation {
    /// Linear blend between the surrounding keyframes, holding the last value
    #[default]
    Linear,
    /// Step: keep the latest keyframe value until the next keyframe is hit
    Hold,
    /// Value only on the exact frame of a keyframe, default everywhere else
    Trigger,
}

/// One entry of a choice prompt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceData {
    /// Text shown for the choice (or a table key)
    pub label: String,
    /// Flags raised when the choice is picked
    pub flags: EventFlags,
}

impl ChoiceData {
    /// Create a new choice
    pub fn new(label: impl Into<String>, flags: EventFlags) -> Self {
        Self {
            label: label.into(),
            flags,
        }
    }

    /// An empty choice (no label, no flags)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this choice carries nothing
    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.flags.is_empty()
    }
}

/// A time-stamped value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame<T> {
    frame: Frame,
    /// Value at this keyframe
    pub value: T,
}

impl<T> KeyFrame<T> {
    /// Create a new keyframe
    pub fn new(frame: Frame, value: T) -> Self {
        Self { frame, value }
    }

    /// Frame of this keyframe
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub(crate) fn shift(&mut self, delta: Frame) {
        self.frame = self.frame.saturating_add(delta);
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        (b - a) * t + a
    }

    /// Interpolate Vec2
    pub fn lerp_vec2(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        [Self::lerp(a[0], b[0], t), Self::lerp(a[1], b[1], t)]
    }

    /// Interpolate Color, channel by channel
    pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }

    /// Interpolate integers, rounding half up before truncation
    pub fn lerp_int(a: i32, b: i32, t: f32) -> i32 {
        ((b - a) as f32 * t + 0.5) as i32 + a
    }
}

/// A value type that can live on a timeline
pub trait Keyable: Clone + PartialEq + std::fmt::Debug {
    /// Blend from `a` towards `b` by `t` in `[0, 1)`
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self;
}

impl Keyable for f32 {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Interpolation::lerp(*a, *b, t)
    }
}

impl Keyable for Vec2 {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Interpolation::lerp_vec2(*a, *b, t)
    }
}

impl Keyable for Color {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Interpolation::lerp_color(*a, *b, t)
    }
}

impl Keyable for i32 {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Interpolation::lerp_int(*a, *b, t)
    }
}

// Discrete values never blend

impl Keyable for bool {
    fn interpolate(a: &Self, _b: &Self, _t: f32) -> Self {
        *a
    }
}

impl Keyable for String {
    fn interpolate(a: &Self, _b: &Self, _t: f32) -> Self {
        a.clone()
    }
}

impl Keyable for ChoiceData {
    fn interpolate(a: &Self, _b: &Self, _t: f32) -> Self {
        a.clone()
    }
}

/// Value type tag of a [`ParamValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// 2D vector
    Vec2,
    /// Float
    Float,
    /// Color (RGBA)
    Color,
    /// Integer
    Int,
    /// String
    Text,
    /// Boolean
    Bool,
    /// Choice entry
    Choice,
}

/// A value crossing the param boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// 2D vector
    Vec2(Vec2),
    /// Float value
    Float(f32),
    /// Color (RGBA)
    Color(Color),
    /// Integer
    Int(i32),
    /// String
    Text(String),
    /// Boolean
    Bool(bool),
    /// Choice entry
    Choice(ChoiceData),
}

impl ParamValue {
    /// Value type tag
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Vec2(_) => ValueKind::Vec2,
            ParamValue::Float(_) => ValueKind::Float,
            ParamValue::Color(_) => ValueKind::Color,
            ParamValue::Int(_) => ValueKind::Int,
            ParamValue::Text(_) => ValueKind::Text,
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::Choice(_) => ValueKind::Choice,
        }
    }

    /// Get as Vec2 if possible
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            ParamValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as color if possible
    pub fn as_color(&self) -> Option<Color> {
        match self {
            ParamValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer if possible
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get as boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as choice if possible
    pub fn as_choice(&self) -> Option<&ChoiceData> {
        match self {
            ParamValue::Choice(v) => Some(v),
            _ => None,
        }
    }
}
