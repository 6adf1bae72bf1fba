// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe timeline model for cutscene sequencing.
//!
//! This crate provides the engine-independent core of a cutscene tool:
//! - Typed params with sorted keyframes and per-kind evaluation
//! - Elements (image, panel, text, choices, sound) with a fixed schema per kind
//! - Document-wide frame insertion, deletion and priority reordering
//! - Frame-indexed comments
//! - Markup documents and RON snapshots
//!
//! ## Architecture
//!
//! The timeline is built on:
//! - [`PlayData`] owning elements in priority order
//! - [`Editor`] applying typed authoring commands
//! - [`Player`] driving host-side [`Reflector`]s one frame per tick

pub mod asset;
pub mod commands;
pub mod comment;
pub mod config;
pub mod element;
pub mod keyframe;
pub mod markup;
pub mod param;
pub mod play_data;
pub mod player;
pub mod setting;

pub use asset::{Asset, AssetDetail, AssetKind, NO_TABLE_KEY};
pub use commands::{CommandError, EditCommand, EditOutcome, Editor};
pub use comment::{Comment, Comments};
pub use config::{ConfigError, TimelineConfig};
pub use element::{
    ChoicesFrame, Element, ElementId, ElementKind, FrameData, ImageFrame, PanelFrame, Payload,
    SoundFrame, TextFrame,
};
pub use keyframe::{
    ChoiceData, Color, Evaluation, Frame, Interpolation, KeyFrame, Keyable, ParamValue, ValueKind,
    Vec2, WHITE,
};
pub use markup::{
    load_document, read_document, save_document, write_document, DocumentError, FORMAT_VERSION,
};
pub use param::{Channel, Param, ParamKind, Timeline, ValueMismatch};
pub use play_data::{PlayData, DEFAULT_TOTAL_FRAMES};
pub use player::{PlaybackState, Player, Reflector};
pub use setting::{EventFlags, Setting, SettingKind};
