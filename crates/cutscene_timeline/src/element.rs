// SPDX-License-Identifier: MIT OR Apache-2.0
//! Elements: timed objects with a fixed param/asset/setting schema per kind.

use crate::asset::{Asset, AssetKind};
use crate::keyframe::{ChoiceData, Color, Frame, ParamValue, Vec2};
use crate::param::{Param, ParamKind};
use crate::setting::{EventFlags, Setting, SettingKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Sprite with optional animator
    Image,
    /// Flat colored panel
    Panel,
    /// Message window text
    Text,
    /// Two-way choice prompt
    Choices,
    /// Sound with volume envelope
    Sound,
    /// Fire-and-forget sound, one frame long
    SoundOneShot,
}

impl ElementKind {
    /// All element kinds, in menu order
    pub const ALL: [ElementKind; 6] = [
        Self::Image,
        Self::Panel,
        Self::Text,
        Self::Choices,
        Self::Sound,
        Self::SoundOneShot,
    ];

    /// Get the name given to new elements
    pub fn name(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Panel => "Panel",
            Self::Text => "Text",
            Self::Choices => "Choices",
            Self::Sound => "Sound",
            Self::SoundOneShot => "SoundOneShot",
        }
    }

    /// Get the label shown in add-element menus
    pub fn label(self) -> &'static str {
        match self {
            Self::SoundOneShot => "Sound(OneShot)",
            other => other.name(),
        }
    }

    /// Type tag used in documents. The high byte groups visual, text and sound kinds.
    pub fn code(self) -> i32 {
        match self {
            Self::Image => 0x0000,
            Self::Panel => 0x0001,
            Self::Text => 0x0100,
            Self::Choices => 0x0101,
            Self::Sound => 0x0200,
            Self::SoundOneShot => 0x0201,
        }
    }

    /// Look up a type tag
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Params owned by this kind, in order
    pub fn param_layout(self) -> &'static [ParamKind] {
        use ParamKind as P;
        match self {
            Self::Image => &[P::Position, P::Rotation, P::Scale, P::Color, P::Animator, P::Raycast],
            Self::Panel => &[P::Position, P::Rotation, P::Scale, P::Color, P::Raycast],
            Self::Text => &[P::TextLabel],
            Self::Choices => &[P::Choices, P::Choices],
            Self::Sound => &[P::Volume],
            Self::SoundOneShot => &[],
        }
    }

    /// Assets owned by this kind, in order
    pub fn asset_layout(self) -> &'static [AssetKind] {
        match self {
            Self::Image => &[AssetKind::Image, AssetKind::Animator],
            Self::Panel => &[],
            Self::Text | Self::Choices => &[AssetKind::SharedTableData],
            Self::Sound | Self::SoundOneShot => &[AssetKind::Audio],
        }
    }

    /// Settings owned by this kind, in order. Flags always come first.
    pub fn setting_layout(self) -> &'static [SettingKind] {
        match self {
            Self::Sound => &[SettingKind::Flags, SettingKind::Loop],
            _ => &[SettingKind::Flags],
        }
    }
}

/// Per-frame snapshot of an image element
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    /// Position (x, y)
    pub position: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    /// Scale (x, y)
    pub scale: Vec2,
    /// Tint color
    pub color: Color,
    /// Animator transition index (-1 for none)
    pub transition_no: i32,
    /// Whether the image catches pointer input
    pub raycast_target: bool,
}

/// Per-frame snapshot of a panel element
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFrame {
    /// Position (x, y)
    pub position: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    /// Scale (x, y)
    pub scale: Vec2,
    /// Fill color
    pub color: Color,
    /// Whether the panel catches pointer input
    pub raycast_target: bool,
}

/// Per-frame snapshot of a text element
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    /// Label triggered on this frame (empty otherwise)
    pub label: String,
}

/// Per-frame snapshot of a choices element
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicesFrame {
    /// One entry per choice param, in segment order
    pub choices: Vec<ChoiceData>,
}

/// Per-frame snapshot of a sound element
#[derive(Debug, Clone, PartialEq)]
pub struct SoundFrame {
    /// Volume
    pub volume: f32,
}

/// Kind-specific per-frame data handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Image data
    Image(ImageFrame),
    /// Panel data
    Panel(PanelFrame),
    /// Text data
    Text(TextFrame),
    /// Choices data
    Choices(ChoicesFrame),
    /// Sound data
    Sound(SoundFrame),
    /// One-shot sounds carry nothing beyond activity
    SoundOneShot,
}

/// One element's state at one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    /// Whether the frame lies in `[start_frame, end_frame)`
    pub is_active: bool,
    /// Kind-specific values
    pub payload: Payload,
}

/// A timed object on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    /// Element name
    pub name: String,
    start_frame: Frame,
    end_frame: Frame,
    /// Whether the element is expanded in the editor
    pub expanded: bool,
    params: Vec<Param>,
    assets: Vec<Asset>,
    settings: Vec<Setting>,
}

impl Element {
    /// Create an element with the schema of its kind, spanning `[0, 1)`
    pub fn new(kind: ElementKind) -> Self {
        let mut element = Self {
            id: ElementId::new(),
            kind,
            name: kind.name().to_string(),
            start_frame: 0,
            end_frame: 1,
            expanded: true,
            params: Vec::new(),
            assets: kind.asset_layout().iter().map(|&k| Asset::new(k)).collect(),
            settings: kind
                .setting_layout()
                .iter()
                .map(|&k| Setting::default_for(k))
                .collect(),
        };
        for &param_kind in kind.param_layout() {
            element.add_param(Param::new(param_kind));
        }
        element
    }

    /// Attach a param, numbering segments when its kind repeats
    fn add_param(&mut self, mut param: Param) {
        let kind = param.kind();
        let same_kind = self.params.iter().filter(|p| p.kind() == kind).count();
        if same_kind > 0 {
            for (segment, existing) in self.params.iter_mut().filter(|p| p.kind() == kind).enumerate() {
                existing.set_segment(segment as i32);
            }
            param.set_segment(same_kind as i32);
        }
        self.params.push(param);
    }

    /// Element ID
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Element kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// First active frame
    pub fn start_frame(&self) -> Frame {
        self.start_frame
    }

    /// First inactive frame after the start. One-shot sounds always last one frame.
    pub fn end_frame(&self) -> Frame {
        match self.kind {
            ElementKind::SoundOneShot => self.start_frame.saturating_add(1),
            _ => self.end_frame,
        }
    }

    /// Set the first active frame
    pub fn set_start_frame(&mut self, frame: Frame) {
        self.start_frame = frame;
        self.sync_one_shot();
    }

    /// Set the end frame (ignored by one-shot sounds)
    pub fn set_end_frame(&mut self, frame: Frame) {
        self.end_frame = frame;
        self.sync_one_shot();
    }

    // One-shot sounds keep the stored end pinned to start + 1
    fn sync_one_shot(&mut self) {
        if self.kind == ElementKind::SoundOneShot {
            self.end_frame = self.start_frame.saturating_add(1);
        }
    }

    /// Whether `frame` lies in `[start_frame, end_frame)`
    pub fn is_active_at(&self, frame: Frame) -> bool {
        frame >= self.start_frame && frame < self.end_frame()
    }

    /// Get all params
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Get a param by index
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    /// Get a mutable param by index
    pub fn param_mut(&mut self, index: usize) -> Option<&mut Param> {
        self.params.get_mut(index)
    }

    /// Find a param by kind and segment
    pub fn find_param(&self, kind: ParamKind, segment: i32) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.kind() == kind && p.segment() == segment)
    }

    /// Replace the param slot with the same kind and segment
    pub fn set_param(&mut self, param: Param) -> bool {
        let slot = self
            .params
            .iter_mut()
            .find(|p| p.kind() == param.kind() && p.segment() == param.segment());
        match slot {
            Some(slot) => {
                *slot = param;
                true
            }
            None => false,
        }
    }

    /// Get all assets
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Get the asset of a kind
    pub fn asset(&self, kind: AssetKind) -> Option<&Asset> {
        self.assets.iter().find(|a| a.kind() == kind)
    }

    /// Get the mutable asset of a kind
    pub fn asset_mut(&mut self, kind: AssetKind) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.kind() == kind)
    }

    /// Replace the asset slot of the same kind
    pub fn set_asset(&mut self, asset: Asset) -> bool {
        match self.asset_mut(asset.kind()) {
            Some(slot) => {
                *slot = asset;
                true
            }
            None => false,
        }
    }

    /// Assign the resolvable path of an asset slot
    pub fn set_asset_path(&mut self, kind: AssetKind, path: impl Into<String>) -> bool {
        match self.asset_mut(kind) {
            Some(asset) => {
                asset.path = path.into();
                true
            }
            None => false,
        }
    }

    /// Set the sprite name of the image asset
    pub fn set_sprite_name(&mut self, name: impl Into<String>) -> bool {
        self.asset_mut(AssetKind::Image)
            .is_some_and(|asset| asset.set_sprite_name(name))
    }

    /// Select the condition of the animator asset
    pub fn select_condition(&mut self, condition: impl Into<String>) -> bool {
        self.asset_mut(AssetKind::Animator)
            .is_some_and(|asset| asset.select_condition(condition))
    }

    /// Get all settings
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    /// Get the setting of a kind
    pub fn setting(&self, kind: SettingKind) -> Option<&Setting> {
        self.settings.iter().find(|s| s.kind() == kind)
    }

    /// Replace the setting slot of the same kind
    pub fn set_setting(&mut self, setting: Setting) -> bool {
        self.settings
            .iter_mut()
            .find(|s| s.kind() == setting.kind())
            .is_some_and(|slot| slot.apply(setting))
    }

    /// Visibility flags (empty = always shown)
    pub fn flags(&self) -> EventFlags {
        match self.setting(SettingKind::Flags) {
            Some(Setting::Flags(flags)) => *flags,
            _ => EventFlags::empty(),
        }
    }

    /// Whether a sound loops
    pub fn is_loop(&self) -> bool {
        matches!(self.setting(SettingKind::Loop), Some(Setting::Loop(true)))
    }

    /// Translate the whole element in time
    pub fn move_by(&mut self, delta: Frame) {
        self.start_frame = self.start_frame.saturating_add(delta);
        self.end_frame = self.end_frame.saturating_add(delta);
        for param in &mut self.params {
            param.shift_all(delta);
        }
        self.sync_one_shot();
    }

    /// Open `count` frames at `base`
    pub fn insert_frames(&mut self, base: Frame, count: Frame) {
        if self.start_frame >= base {
            self.start_frame = self.start_frame.saturating_add(count);
        }
        // An end sitting exactly on `base` stays put
        if self.end_frame > base {
            self.end_frame = self.end_frame.saturating_add(count);
        }
        for param in &mut self.params {
            param.insert_frames(base, count);
        }
        self.sync_one_shot();
    }

    /// Remove the frames `[base, base + count)`, clamping bounds inside the window to `base`
    pub fn delete_frames(&mut self, base: Frame, count: Frame) {
        if count <= 0 {
            return;
        }
        if self.start_frame >= base {
            self.start_frame = clamp_deleted(self.start_frame, base, count);
        }
        if self.end_frame > base {
            self.end_frame = clamp_deleted(self.end_frame, base, count);
        }
        for param in &mut self.params {
            param.delete_frames(base, count);
        }
        self.sync_one_shot();
    }

    /// Clamp the range to a new total frame count
    pub(crate) fn fit_total_frames(&mut self, total: Frame) {
        if self.start_frame >= total {
            self.start_frame = (total - 1).max(0);
        }
        if self.end_frame() > total {
            self.end_frame = total;
        }
        self.sync_one_shot();
    }

    /// Snapshot of this element at a frame
    pub fn frame_data(&self, frame: Frame) -> FrameData {
        FrameData {
            is_active: self.is_active_at(frame),
            payload: self.payload(frame),
        }
    }

    fn sample(&self, kind: ParamKind, frame: Frame) -> ParamValue {
        self.find_param(kind, Param::NO_SEGMENT)
            .map_or_else(|| kind.default_value(), |p| p.value_at(frame))
    }

    fn payload(&self, frame: Frame) -> Payload {
        let vec2 = |kind| self.sample(kind, frame).as_vec2().unwrap_or_default();
        let float = |kind| self.sample(kind, frame).as_float().unwrap_or_default();
        let color = || self.sample(ParamKind::Color, frame).as_color().unwrap_or_default();
        let raycast = || self.sample(ParamKind::Raycast, frame).as_bool().unwrap_or_default();

        match self.kind {
            ElementKind::Image => Payload::Image(ImageFrame {
                position: vec2(ParamKind::Position),
                rotation: float(ParamKind::Rotation),
                scale: vec2(ParamKind::Scale),
                color: color(),
                transition_no: self
                    .sample(ParamKind::Animator, frame)
                    .as_int()
                    .unwrap_or(-1),
                raycast_target: raycast(),
            }),
            ElementKind::Panel => Payload::Panel(PanelFrame {
                position: vec2(ParamKind::Position),
                rotation: float(ParamKind::Rotation),
                scale: vec2(ParamKind::Scale),
                color: color(),
                raycast_target: raycast(),
            }),
            ElementKind::Text => Payload::Text(TextFrame {
                label: self
                    .sample(ParamKind::TextLabel, frame)
                    .as_text()
                    .unwrap_or_default()
                    .to_string(),
            }),
            ElementKind::Choices => Payload::Choices(ChoicesFrame {
                choices: self
                    .params
                    .iter()
                    .filter(|p| p.kind() == ParamKind::Choices)
                    .map(|p| p.value_at(frame).as_choice().cloned().unwrap_or_default())
                    .collect(),
            }),
            ElementKind::Sound => Payload::Sound(SoundFrame {
                volume: float(ParamKind::Volume),
            }),
            ElementKind::SoundOneShot => Payload::SoundOneShot,
        }
    }
}

fn clamp_deleted(frame: Frame, base: Frame, count: Frame) -> Frame {
    match base.checked_add(count) {
        Some(end) if frame >= end => frame - count,
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::WHITE;

    fn spanning(kind: ElementKind, start: Frame, end: Frame) -> Element {
        let mut element = Element::new(kind);
        element.set_start_frame(start);
        element.set_end_frame(end);
        element
    }

    #[test]
    fn test_schema_per_kind() {
        let image = Element::new(ElementKind::Image);
        assert_eq!(image.params().len(), 6);
        assert_eq!(image.assets().len(), 2);
        assert_eq!(image.settings(), [Setting::Flags(EventFlags::empty())]);

        let sound = Element::new(ElementKind::Sound);
        assert_eq!(sound.settings().len(), 2);
        assert!(!sound.is_loop());

        let one_shot = Element::new(ElementKind::SoundOneShot);
        assert!(one_shot.params().is_empty());
        assert_eq!(one_shot.asset(AssetKind::Audio).map(Asset::kind), Some(AssetKind::Audio));
    }

    #[test]
    fn test_repeated_params_get_segments() {
        let choices = Element::new(ElementKind::Choices);
        let segments: Vec<_> = choices.params().iter().map(Param::segment).collect();
        assert_eq!(segments, vec![0, 1]);

        let image = Element::new(ElementKind::Image);
        assert!(image.params().iter().all(|p| p.segment() == Param::NO_SEGMENT));
    }

    #[test]
    fn test_one_shot_end_is_derived() {
        let mut one_shot = spanning(ElementKind::SoundOneShot, 4, 40);
        assert_eq!(one_shot.end_frame(), 5);
        assert!(one_shot.is_active_at(4));
        assert!(!one_shot.is_active_at(5));
        one_shot.move_by(3);
        assert_eq!(one_shot.end_frame(), 8);
    }

    #[test]
    fn test_delete_frames_clamps_into_window() {
        let mut element = spanning(ElementKind::Panel, 10, 20);
        element.delete_frames(12, 5);
        assert_eq!(element.start_frame(), 10);
        assert_eq!(element.end_frame(), 15);

        let mut element = spanning(ElementKind::Panel, 13, 20);
        element.delete_frames(12, 5);
        assert_eq!(element.start_frame(), 12);
        assert_eq!(element.end_frame(), 15);

        let mut element = spanning(ElementKind::Panel, 10, 14);
        element.delete_frames(12, 5);
        assert_eq!(element.end_frame(), 12);
    }

    #[test]
    fn test_insert_frames_boundaries() {
        let mut element = spanning(ElementKind::Panel, 10, 20);
        element.insert_frames(12, 5);
        assert_eq!(element.start_frame(), 10);
        assert_eq!(element.end_frame(), 25);

        // End exactly on base does not grow
        let mut element = spanning(ElementKind::Panel, 10, 12);
        element.insert_frames(12, 5);
        assert_eq!(element.end_frame(), 12);

        // End one past base does
        let mut element = spanning(ElementKind::Panel, 10, 13);
        element.insert_frames(12, 5);
        assert_eq!(element.end_frame(), 18);

        // Start exactly on base shifts
        let mut element = spanning(ElementKind::Panel, 12, 20);
        element.insert_frames(12, 5);
        assert_eq!(element.start_frame(), 17);
        assert_eq!(element.end_frame(), 25);
    }

    #[test]
    fn test_move_shifts_range_and_keyframes() {
        let mut element = spanning(ElementKind::Sound, 2, 8);
        element
            .param_mut(0)
            .unwrap()
            .set_value(4, ParamValue::Float(0.5))
            .unwrap();
        element.move_by(10);
        assert_eq!((element.start_frame(), element.end_frame()), (12, 18));
        assert_eq!(element.params()[0].keyframe_frames(), vec![14]);
    }

    #[test]
    fn test_frame_data_image() {
        let mut image = spanning(ElementKind::Image, 0, 10);
        image
            .param_mut(0)
            .unwrap()
            .set_value(0, ParamValue::Vec2([0.0, 0.0]))
            .unwrap();
        image
            .param_mut(0)
            .unwrap()
            .set_value(10, ParamValue::Vec2([10.0, 20.0]))
            .unwrap();

        let data = image.frame_data(5);
        assert!(data.is_active);
        let Payload::Image(frame) = data.payload else {
            panic!("expected image payload");
        };
        assert_eq!(frame.position, [5.0, 10.0]);
        assert_eq!(frame.scale, [1.0, 1.0]);
        assert_eq!(frame.color, WHITE);
        assert_eq!(frame.transition_no, -1);
        assert!(!frame.raycast_target);

        assert!(!image.frame_data(10).is_active);
    }

    #[test]
    fn test_frame_data_choices_in_segment_order() {
        let mut choices = spanning(ElementKind::Choices, 0, 10);
        let first = ChoiceData::new("left", EventFlags::FLAG_00);
        let second = ChoiceData::new("right", EventFlags::FLAG_01);
        choices
            .param_mut(0)
            .unwrap()
            .set_value(3, ParamValue::Choice(first.clone()))
            .unwrap();
        choices
            .param_mut(1)
            .unwrap()
            .set_value(3, ParamValue::Choice(second.clone()))
            .unwrap();

        assert_eq!(
            choices.frame_data(3).payload,
            Payload::Choices(ChoicesFrame {
                choices: vec![first, second]
            })
        );
        assert_eq!(
            choices.frame_data(4).payload,
            Payload::Choices(ChoicesFrame {
                choices: vec![ChoiceData::empty(), ChoiceData::empty()]
            })
        );
    }

    #[test]
    fn test_set_slots_by_kind() {
        let mut sound = Element::new(ElementKind::Sound);
        assert!(sound.set_setting(Setting::Loop(true)));
        assert!(sound.is_loop());
        assert!(sound.set_setting(Setting::Flags(EventFlags::FLAG_03)));
        assert_eq!(sound.flags(), EventFlags::FLAG_03);

        let mut panel = Element::new(ElementKind::Panel);
        assert!(!panel.set_setting(Setting::Loop(true)));
        assert!(!panel.set_asset_path(AssetKind::Audio, "a.wav"));
        assert!(!panel.set_param(Param::new(ParamKind::Volume)));

        let mut volume = Param::new(ParamKind::Volume);
        volume.set_value(1, ParamValue::Float(0.25)).unwrap();
        assert!(sound.set_param(volume.clone()));
        assert_eq!(sound.params()[0], volume);
    }

    #[test]
    fn test_fit_total_frames() {
        let mut element = spanning(ElementKind::Panel, 50, 80);
        element.fit_total_frames(40);
        assert_eq!((element.start_frame(), element.end_frame()), (39, 40));

        let mut element = spanning(ElementKind::Panel, 5, 80);
        element.fit_total_frames(0);
        assert_eq!(element.start_frame(), 0);
    }

    #[test]
    fn test_kind_codes() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ElementKind::from_code(0x0300), None);
        assert_eq!(ElementKind::SoundOneShot.label(), "Sound(OneShot)");
    }
}
