// SPDX-License-Identifier: MIT OR Apache-2.0
//! Markup documents: the on-disk interchange format for a [`PlayData`].
//!
//! Reading is a stack machine. Each container tag pushes a reader, scalar
//! child tags feed it, and when the container closes its finished value is
//! merged into the reader below it. Recoverable problems (bad scalars,
//! unknown type tags) are logged and skipped; a version mismatch rejects
//! the whole document.
//!
//! Documents are written with a `Cutscene` root and `UInteger` flag
//! fields. The reader takes any root name and also the legacy
//! `cm_xmlTagUInteger` spelling, so older files load here, but tools that
//! only know the legacy tag names cannot read files written by this module.

use crate::asset::{Asset, AssetKind};
use crate::comment::Comment;
use crate::config::TimelineConfig;
use crate::element::{Element, ElementKind};
use crate::keyframe::{ChoiceData, Frame, ParamValue};
use crate::param::{Param, ParamKind};
use crate::play_data::PlayData;
use crate::setting::{EventFlags, Setting, SettingKind};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Document format version
pub const FORMAT_VERSION: i32 = 0x100;

const TAG_ROOT: &str = "Cutscene";
const TAG_VERSION: &str = "Version";
const TAG_PLAY_DATA: &str = "PlayData";
const TAG_TOTAL_FRAMES: &str = "TotalFrames";
const TAG_ELEMENT: &str = "Element";
const TAG_TYPE: &str = "Type";
const TAG_NAME: &str = "Name";
const TAG_START_FRAME: &str = "StartFrame";
const TAG_END_FRAME: &str = "EndFrame";
const TAG_IS_EXPAND: &str = "IsExpand";
const TAG_PARAM: &str = "Param";
const TAG_SEGMENT: &str = "Segment";
const TAG_KEY_FRAMES: &str = "KeyFrames";
const TAG_KEY: &str = "Key";
const TAG_FRAME: &str = "Frame";
const TAG_X: &str = "X";
const TAG_Y: &str = "Y";
const TAG_ROTATION: &str = "Rotation";
const TAG_R: &str = "R";
const TAG_G: &str = "G";
const TAG_B: &str = "B";
const TAG_A: &str = "A";
const TAG_TRANSITION_NO: &str = "TransitionNo";
const TAG_STRING: &str = "String";
const TAG_VOLUME: &str = "Volume";
const TAG_UINTEGER: &str = "UInteger";
const TAG_UINTEGER_LEGACY: &str = "cm_xmlTagUInteger";
const TAG_BOOL: &str = "Bool";
const TAG_ASSET: &str = "Asset";
const TAG_PATH: &str = "Path";
const TAG_SPRITE_NAME: &str = "SpriteName";
const TAG_CONDITION: &str = "Condition";
const TAG_SETTING: &str = "Setting";
const TAG_COMMENT: &str = "Comment";

/// Errors that reject a whole document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Not well-formed markup
    #[error("Malformed markup: {0}")]
    Markup(#[from] quick_xml::Error),
    /// Written by an incompatible version
    #[error("Unsupported document version {found:#x} (expected {expected:#x})")]
    VersionMismatch {
        /// Version found in the document
        found: i32,
        /// Version this reader understands
        expected: i32,
    },
    /// No version tag, and the config requires one
    #[error("Document has no version tag")]
    MissingVersion,
    /// No play data block
    #[error("Document has no PlayData block")]
    MissingPlayData,
    /// Input ended inside an open tag
    #[error("Document ends inside <{0}>")]
    Truncated(String),
}

/// Encode a document as markup
pub fn write_document(data: &PlayData, config: &TimelineConfig) -> Result<String, DocumentError> {
    let mut out = DocumentWriter::new(config.indent);
    out.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    out.open(TAG_ROOT)?;
    out.scalar(TAG_VERSION, FORMAT_VERSION)?;
    out.open(TAG_PLAY_DATA)?;
    out.scalar(TAG_TOTAL_FRAMES, data.total_frames())?;
    for element in data.elements() {
        out.element(element)?;
    }
    for comment in data.comments() {
        out.open(TAG_COMMENT)?;
        out.scalar(TAG_FRAME, comment.frame)?;
        out.scalar(TAG_STRING, &comment.text)?;
        out.close(TAG_COMMENT)?;
    }
    out.close(TAG_PLAY_DATA)?;
    out.close(TAG_ROOT)?;
    Ok(String::from_utf8_lossy(&out.writer.into_inner()).into_owned())
}

/// Decode a document. Nothing is returned unless the whole document is accepted.
pub fn read_document(text: &str, config: &TimelineConfig) -> Result<PlayData, DocumentError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => open(&mut stack, &tag_name(&e), config)?,
            Event::Empty(e) => {
                open(&mut stack, &tag_name(&e), config)?;
                close(&mut stack, &mut root, config)?;
            }
            Event::End(_) => close(&mut stack, &mut root, config)?,
            Event::Text(e) => {
                if let Some(Node::Scalar { text, .. }) = stack.last_mut() {
                    text.push_str(&e.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(e) => {
                if let Some(Node::Scalar { text, .. }) = stack.last_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(node) = stack.last() {
        return Err(DocumentError::Truncated(node.tag().to_string()));
    }
    let root: RootReader = root.ok_or(DocumentError::MissingPlayData)?;
    if root.version.is_none() && !config.accept_missing_version {
        return Err(DocumentError::MissingVersion);
    }
    root.play_data.ok_or(DocumentError::MissingPlayData)
}

/// Write a document to a file
pub fn save_document(path: &Path, data: &PlayData, config: &TimelineConfig) -> Result<(), DocumentError> {
    std::fs::write(path, write_document(data, config)?)?;
    tracing::info!("Saved cutscene to {:?}", path);
    Ok(())
}

/// Read a document from a file
pub fn load_document(path: &Path, config: &TimelineConfig) -> Result<PlayData, DocumentError> {
    let text = std::fs::read_to_string(path)?;
    let data = read_document(&text, config)?;
    tracing::info!(
        "Loaded cutscene from {:?}: {} elements, {} frames",
        path,
        data.element_count(),
        data.total_frames()
    );
    Ok(data)
}

struct DocumentWriter {
    writer: Writer<Vec<u8>>,
}

impl DocumentWriter {
    fn new(indent: usize) -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', indent),
        }
    }

    fn open(&mut self, tag: &str) -> Result<(), DocumentError> {
        self.writer.write_event(Event::Start(BytesStart::new(tag)))?;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<(), DocumentError> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn scalar(&mut self, tag: &str, value: impl Display) -> Result<(), DocumentError> {
        let text = value.to_string();
        self.writer
            .create_element(tag)
            .write_text_content(BytesText::new(&text))?;
        Ok(())
    }

    fn flag(&mut self, tag: &str, value: bool) -> Result<(), DocumentError> {
        self.scalar(tag, if value { "True" } else { "False" })
    }

    fn element(&mut self, element: &Element) -> Result<(), DocumentError> {
        self.open(TAG_ELEMENT)?;
        self.scalar(TAG_TYPE, element.kind().code())?;
        self.scalar(TAG_NAME, &element.name)?;
        self.scalar(TAG_START_FRAME, element.start_frame())?;
        self.scalar(TAG_END_FRAME, element.end_frame())?;
        self.flag(TAG_IS_EXPAND, element.expanded)?;
        for param in element.params() {
            self.param(param)?;
        }
        for asset in element.assets() {
            self.asset(asset)?;
        }
        for setting in element.settings() {
            self.open(TAG_SETTING)?;
            self.scalar(TAG_TYPE, setting.kind().code())?;
            match setting {
                Setting::Flags(flags) => self.scalar(TAG_UINTEGER, flags.bits())?,
                Setting::Loop(looping) => self.flag(TAG_BOOL, *looping)?,
            }
            self.close(TAG_SETTING)?;
        }
        self.close(TAG_ELEMENT)
    }

    fn param(&mut self, param: &Param) -> Result<(), DocumentError> {
        let code = param.kind().code();
        self.open(TAG_PARAM)?;
        self.scalar(TAG_TYPE, code)?;
        self.scalar(TAG_SEGMENT, param.segment())?;
        self.open(TAG_KEY_FRAMES)?;
        for (frame, value) in param.keyframes() {
            self.open(TAG_KEY)?;
            self.scalar(TAG_TYPE, code)?;
            self.scalar(TAG_FRAME, frame)?;
            self.key_value(param.kind(), &value)?;
            self.close(TAG_KEY)?;
        }
        self.close(TAG_KEY_FRAMES)?;
        self.close(TAG_PARAM)
    }

    fn key_value(&mut self, kind: ParamKind, value: &ParamValue) -> Result<(), DocumentError> {
        match value {
            ParamValue::Vec2([x, y]) => {
                self.scalar(TAG_X, x)?;
                self.scalar(TAG_Y, y)
            }
            ParamValue::Float(v) if kind == ParamKind::Volume => self.scalar(TAG_VOLUME, v),
            ParamValue::Float(v) => self.scalar(TAG_ROTATION, v),
            ParamValue::Color([r, g, b, a]) => {
                self.scalar(TAG_R, r)?;
                self.scalar(TAG_G, g)?;
                self.scalar(TAG_B, b)?;
                self.scalar(TAG_A, a)
            }
            ParamValue::Int(v) => self.scalar(TAG_TRANSITION_NO, v),
            ParamValue::Text(v) => self.scalar(TAG_STRING, v),
            ParamValue::Bool(v) => self.flag(TAG_BOOL, *v),
            ParamValue::Choice(choice) => {
                self.scalar(TAG_STRING, &choice.label)?;
                self.scalar(TAG_UINTEGER, choice.flags.bits())
            }
        }
    }

    fn asset(&mut self, asset: &Asset) -> Result<(), DocumentError> {
        self.open(TAG_ASSET)?;
        self.scalar(TAG_TYPE, asset.kind().code())?;
        self.scalar(TAG_PATH, &asset.path)?;
        if let Some(sprite_name) = asset.sprite_name() {
            self.scalar(TAG_SPRITE_NAME, sprite_name)?;
        }
        if let Some(condition) = asset.condition() {
            self.scalar(TAG_CONDITION, condition)?;
        }
        self.close(TAG_ASSET)
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn parse_scalar<T: FromStr + Default>(tag: &str, text: &str) -> T {
    text.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("Cannot read <{}> value {:?}, using default", tag, text);
        T::default()
    })
}

fn parse_flag(tag: &str, text: &str) -> bool {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        true
    } else if text.eq_ignore_ascii_case("false") {
        false
    } else {
        tracing::warn!("Cannot read <{}> value {:?}, using default", tag, text);
        false
    }
}

#[derive(Default)]
struct RootReader {
    version: Option<i32>,
    play_data: Option<PlayData>,
}

#[derive(Default)]
struct PlayDataReader {
    total_frames: Option<Frame>,
    elements: Vec<Element>,
    comments: Vec<Comment>,
}

impl PlayDataReader {
    fn finish(self, config: &TimelineConfig) -> PlayData {
        let mut data =
            PlayData::with_total_frames(self.total_frames.unwrap_or(config.default_total_frames));
        for element in self.elements {
            data.push_element(element);
        }
        for comment in self.comments {
            data.add_comment(comment);
        }
        data
    }
}

#[derive(Default)]
struct ElementReader {
    code: Option<i32>,
    name: Option<String>,
    start_frame: Option<Frame>,
    end_frame: Option<Frame>,
    expanded: Option<bool>,
    params: Vec<Param>,
    assets: Vec<Asset>,
    settings: Vec<Setting>,
}

impl ElementReader {
    fn finish(self) -> Option<Element> {
        let Some(kind) = self.code.and_then(ElementKind::from_code) else {
            tracing::warn!("Dropping element with unknown type {:?}", self.code);
            return None;
        };

        let mut element = Element::new(kind);
        if let Some(name) = self.name {
            element.name = name;
        }
        element.set_start_frame(self.start_frame.unwrap_or(0));
        element.set_end_frame(self.end_frame.unwrap_or(element.start_frame().saturating_add(1)));
        element.expanded = self.expanded.unwrap_or(true);

        for mut param in self.params {
            // Older documents leave the last of a repeated kind unnumbered
            let slots = kind.param_layout().iter().filter(|&&k| k == param.kind()).count();
            if slots > 1 && param.segment() == Param::NO_SEGMENT {
                param.set_segment(slots as i32 - 1);
            }
            let (param_kind, segment) = (param.kind(), param.segment());
            if !element.set_param(param) {
                tracing::warn!(
                    "{} element has no {:?} param at segment {}",
                    kind.name(),
                    param_kind,
                    segment
                );
            }
        }
        for asset in self.assets {
            let asset_kind = asset.kind();
            if !element.set_asset(asset) {
                tracing::warn!("{} element has no {:?} asset", kind.name(), asset_kind);
            }
        }
        for setting in self.settings {
            if !element.set_setting(setting) {
                tracing::warn!("{} element has no {:?} setting", kind.name(), setting.kind());
            }
        }
        Some(element)
    }
}

#[derive(Default)]
struct ParamReader {
    code: Option<i32>,
    segment: Option<i32>,
    keys: Vec<KeyReader>,
}

impl ParamReader {
    fn finish(self) -> Option<Param> {
        let Some(kind) = self.code.and_then(ParamKind::from_code) else {
            tracing::warn!("Dropping param with unknown type {:?}", self.code);
            return None;
        };

        let mut param = Param::new(kind);
        param.set_segment(self.segment.unwrap_or(Param::NO_SEGMENT));
        for key in self.keys {
            if key.code != Some(kind.code()) {
                tracing::warn!(
                    "Dropping key at frame {} with type {:?} inside {:?} param",
                    key.frame,
                    key.code,
                    kind
                );
                continue;
            }
            let frame = key.frame;
            if let Err(err) = param.set_value(frame, key.into_value(kind)) {
                tracing::warn!("Dropping key at frame {}: {}", frame, err);
            }
        }
        Some(param)
    }
}

#[derive(Default)]
struct KeyReader {
    code: Option<i32>,
    frame: Frame,
    x: f32,
    y: f32,
    rotation: f32,
    rgba: [f32; 4],
    transition_no: i32,
    text: String,
    bits: u32,
    volume: f32,
    flag: bool,
}

impl KeyReader {
    fn into_value(self, kind: ParamKind) -> ParamValue {
        match kind {
            ParamKind::Position | ParamKind::Scale => ParamValue::Vec2([self.x, self.y]),
            ParamKind::Rotation => ParamValue::Float(self.rotation),
            ParamKind::Color => ParamValue::Color(self.rgba),
            ParamKind::Animator => ParamValue::Int(self.transition_no),
            ParamKind::TextLabel => ParamValue::Text(self.text),
            ParamKind::Volume => ParamValue::Float(self.volume),
            ParamKind::Choices => ParamValue::Choice(ChoiceData::new(
                self.text,
                EventFlags::from_bits_retain(self.bits),
            )),
            ParamKind::Raycast => ParamValue::Bool(self.flag),
        }
    }
}

#[derive(Default)]
struct AssetReader {
    code: Option<i32>,
    path: String,
    sprite_name: Option<String>,
    condition: Option<String>,
}

impl AssetReader {
    fn finish(self) -> Option<Asset> {
        let Some(kind) = self.code.and_then(AssetKind::from_code) else {
            tracing::warn!("Dropping asset with unknown type {:?}", self.code);
            return None;
        };
        let mut asset = Asset::new(kind);
        asset.path = self.path;
        if let Some(sprite_name) = self.sprite_name {
            asset.set_sprite_name(sprite_name);
        }
        if let Some(condition) = self.condition {
            asset.select_condition(condition);
        }
        Some(asset)
    }
}

#[derive(Default)]
struct SettingReader {
    code: Option<i32>,
    bits: u32,
    flag: bool,
}

impl SettingReader {
    fn finish(self) -> Option<Setting> {
        match self.code.and_then(SettingKind::from_code) {
            Some(SettingKind::Flags) => Some(Setting::Flags(EventFlags::from_bits_retain(self.bits))),
            Some(SettingKind::Loop) => Some(Setting::Loop(self.flag)),
            None => {
                tracing::warn!("Dropping setting with unknown type {:?}", self.code);
                None
            }
        }
    }
}

#[derive(Default)]
struct CommentReader {
    frame: Frame,
    text: String,
}

enum Node {
    Root(RootReader),
    PlayData(PlayDataReader),
    Element(ElementReader),
    Param(ParamReader),
    KeyFrames(Vec<KeyReader>),
    Key(KeyReader),
    Asset(AssetReader),
    Setting(SettingReader),
    Comment(CommentReader),
    Scalar { tag: String, text: String },
}

impl Node {
    fn tag(&self) -> &str {
        match self {
            Node::Root(_) => TAG_ROOT,
            Node::PlayData(_) => TAG_PLAY_DATA,
            Node::Element(_) => TAG_ELEMENT,
            Node::Param(_) => TAG_PARAM,
            Node::KeyFrames(_) => TAG_KEY_FRAMES,
            Node::Key(_) => TAG_KEY,
            Node::Asset(_) => TAG_ASSET,
            Node::Setting(_) => TAG_SETTING,
            Node::Comment(_) => TAG_COMMENT,
            Node::Scalar { tag, .. } => tag,
        }
    }

    /// Feed a finished scalar child
    fn accept(&mut self, tag: &str, text: &str) -> Result<(), DocumentError> {
        match (self, tag) {
            (Node::Root(root), TAG_VERSION) => {
                let version = parse_scalar(tag, text);
                if version != FORMAT_VERSION {
                    tracing::error!("Rejecting document with version {:#x}", version);
                    return Err(DocumentError::VersionMismatch {
                        found: version,
                        expected: FORMAT_VERSION,
                    });
                }
                root.version = Some(version);
            }
            (Node::PlayData(data), TAG_TOTAL_FRAMES) => {
                let total: Frame = parse_scalar(tag, text);
                if total < 1 {
                    tracing::warn!("{} must be positive, got {}; using 1", tag, total);
                }
                data.total_frames = Some(total.max(1));
            }
            (Node::Element(element), TAG_TYPE) => element.code = Some(parse_scalar(tag, text)),
            (Node::Element(element), TAG_NAME) => element.name = Some(text.to_string()),
            (Node::Element(element), TAG_START_FRAME) => element.start_frame = Some(parse_scalar(tag, text)),
            (Node::Element(element), TAG_END_FRAME) => element.end_frame = Some(parse_scalar(tag, text)),
            (Node::Element(element), TAG_IS_EXPAND) => element.expanded = Some(parse_flag(tag, text)),
            (Node::Param(param), TAG_TYPE) => param.code = Some(parse_scalar(tag, text)),
            (Node::Param(param), TAG_SEGMENT) => param.segment = Some(parse_scalar(tag, text)),
            (Node::Key(key), TAG_TYPE) => key.code = Some(parse_scalar(tag, text)),
            (Node::Key(key), TAG_FRAME) => key.frame = parse_scalar(tag, text),
            (Node::Key(key), TAG_X) => key.x = parse_scalar(tag, text),
            (Node::Key(key), TAG_Y) => key.y = parse_scalar(tag, text),
            (Node::Key(key), TAG_ROTATION) => key.rotation = parse_scalar(tag, text),
            (Node::Key(key), TAG_R) => key.rgba[0] = parse_scalar(tag, text),
            (Node::Key(key), TAG_G) => key.rgba[1] = parse_scalar(tag, text),
            (Node::Key(key), TAG_B) => key.rgba[2] = parse_scalar(tag, text),
            (Node::Key(key), TAG_A) => key.rgba[3] = parse_scalar(tag, text),
            (Node::Key(key), TAG_TRANSITION_NO) => key.transition_no = parse_scalar(tag, text),
            (Node::Key(key), TAG_STRING) => key.text = text.to_string(),
            (Node::Key(key), TAG_UINTEGER | TAG_UINTEGER_LEGACY) => key.bits = parse_scalar(tag, text),
            (Node::Key(key), TAG_VOLUME) => key.volume = parse_scalar(tag, text),
            (Node::Key(key), TAG_BOOL) => key.flag = parse_flag(tag, text),
            (Node::Asset(asset), TAG_TYPE) => asset.code = Some(parse_scalar(tag, text)),
            (Node::Asset(asset), TAG_PATH) => asset.path = text.to_string(),
            (Node::Asset(asset), TAG_SPRITE_NAME) => asset.sprite_name = Some(text.to_string()),
            (Node::Asset(asset), TAG_CONDITION) => asset.condition = Some(text.to_string()),
            (Node::Setting(setting), TAG_TYPE) => setting.code = Some(parse_scalar(tag, text)),
            (Node::Setting(setting), TAG_UINTEGER | TAG_UINTEGER_LEGACY) => {
                setting.bits = parse_scalar(tag, text)
            }
            (Node::Setting(setting), TAG_BOOL) => setting.flag = parse_flag(tag, text),
            (Node::Comment(comment), TAG_FRAME) => comment.frame = parse_scalar(tag, text),
            (Node::Comment(comment), TAG_STRING) => comment.text = text.to_string(),
            (node, tag) => tracing::debug!("Ignoring <{}> inside <{}>", tag, node.tag()),
        }
        Ok(())
    }

    /// Fold a finished child container into this one
    fn merge(&mut self, child: Node, config: &TimelineConfig) -> Result<(), DocumentError> {
        match (self, child) {
            (parent, Node::Scalar { tag, text }) => return parent.accept(&tag, &text),
            (Node::Root(root), Node::PlayData(data)) => root.play_data = Some(data.finish(config)),
            (Node::PlayData(data), Node::Element(element)) => data.elements.extend(element.finish()),
            (Node::PlayData(data), Node::Comment(comment)) => data
                .comments
                .push(Comment::new(comment.frame, comment.text)),
            (Node::Element(element), Node::Param(param)) => element.params.extend(param.finish()),
            (Node::Element(element), Node::Asset(asset)) => element.assets.extend(asset.finish()),
            (Node::Element(element), Node::Setting(setting)) => {
                element.settings.extend(setting.finish())
            }
            (Node::Param(param), Node::KeyFrames(keys)) => param.keys.extend(keys),
            (Node::KeyFrames(keys), Node::Key(key)) => keys.push(key),
            (parent, child) => {
                tracing::warn!("Ignoring <{}> inside <{}>", child.tag(), parent.tag())
            }
        }
        Ok(())
    }
}

fn open(stack: &mut Vec<Node>, tag: &str, config: &TimelineConfig) -> Result<(), DocumentError> {
    let node = match tag {
        _ if stack.is_empty() => Node::Root(RootReader::default()),
        TAG_PLAY_DATA => {
            // The version must be known before any content is read
            let unversioned = matches!(stack.first(), Some(Node::Root(root)) if root.version.is_none());
            if unversioned && !config.accept_missing_version {
                return Err(DocumentError::MissingVersion);
            }
            Node::PlayData(PlayDataReader::default())
        }
        TAG_ELEMENT => Node::Element(ElementReader::default()),
        TAG_PARAM => Node::Param(ParamReader::default()),
        TAG_KEY_FRAMES => Node::KeyFrames(Vec::new()),
        TAG_KEY => Node::Key(KeyReader::default()),
        TAG_ASSET => Node::Asset(AssetReader::default()),
        TAG_SETTING => Node::Setting(SettingReader::default()),
        TAG_COMMENT => Node::Comment(CommentReader::default()),
        _ => Node::Scalar {
            tag: tag.to_string(),
            text: String::new(),
        },
    };
    stack.push(node);
    Ok(())
}

fn close(
    stack: &mut Vec<Node>,
    root: &mut Option<RootReader>,
    config: &TimelineConfig,
) -> Result<(), DocumentError> {
    let Some(node) = stack.pop() else {
        return Ok(());
    };
    match (stack.last_mut(), node) {
        (Some(parent), child) => parent.merge(child, config)?,
        (None, Node::Root(finished)) => *root = Some(finished),
        (None, _) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Color;

    fn assert_same_document(a: &PlayData, b: &PlayData) {
        assert_eq!(a.total_frames(), b.total_frames());
        assert_eq!(a.element_count(), b.element_count());
        for (x, y) in a.elements().zip(b.elements()) {
            assert_eq!(x.kind(), y.kind());
            assert_eq!(x.name, y.name);
            assert_eq!(x.start_frame(), y.start_frame());
            assert_eq!(x.end_frame(), y.end_frame());
            assert_eq!(x.expanded, y.expanded);
            assert_eq!(x.params(), y.params());
            assert_eq!(x.assets(), y.assets());
            assert_eq!(x.settings(), y.settings());
        }
        assert_eq!(a.comments(), b.comments());
    }

    fn keyed(data: &mut PlayData, kind: ElementKind, keys: &[(usize, Frame, ParamValue)]) {
        let id = data.add_element(kind);
        let element = data.element_mut(id).unwrap();
        element.set_start_frame(2);
        element.set_end_frame(40);
        for (index, frame, value) in keys {
            element
                .param_mut(*index)
                .unwrap()
                .set_value(*frame, value.clone())
                .unwrap();
        }
    }

    fn sample_document() -> PlayData {
        let mut data = PlayData::with_total_frames(120);
        let red: Color = [1.0, 0.0, 0.0, 0.5];
        keyed(
            &mut data,
            ElementKind::Image,
            &[
                (0, 0, ParamValue::Vec2([-12.5, 40.0])),
                (0, 30, ParamValue::Vec2([100.0, 0.1])),
                (1, 10, ParamValue::Float(45.0)),
                (2, 5, ParamValue::Vec2([2.0, 0.5])),
                (3, 7, ParamValue::Color(red)),
                (4, 9, ParamValue::Int(3)),
                (5, 11, ParamValue::Bool(true)),
            ],
        );
        keyed(&mut data, ElementKind::Panel, &[(4, 1, ParamValue::Bool(true))]);
        keyed(
            &mut data,
            ElementKind::Text,
            &[(0, 12, ParamValue::Text("intro <&> \"line\"".into()))],
        );
        keyed(
            &mut data,
            ElementKind::Choices,
            &[
                (0, 20, ParamValue::Choice(ChoiceData::new("Stay", EventFlags::FLAG_00))),
                (
                    1,
                    20,
                    ParamValue::Choice(ChoiceData::new(
                        "Run",
                        EventFlags::FLAG_04 | EventFlags::from_bits_retain(1 << 20),
                    )),
                ),
            ],
        );
        keyed(&mut data, ElementKind::Sound, &[(0, 3, ParamValue::Float(0.25))]);
        keyed(&mut data, ElementKind::SoundOneShot, &[]);

        let ids: Vec<_> = data.elements().map(Element::id).collect();
        let image = data.element_mut(ids[0]).unwrap();
        image.name = "Portrait".into();
        image.expanded = false;
        image.set_asset_path(AssetKind::Image, "Sprites/face.png");
        assert!(image.set_sprite_name("face_01"));
        image.set_asset_path(AssetKind::Animator, "Anim/face.controller");
        assert!(image.select_condition("Smile"));
        image.set_setting(Setting::Flags(EventFlags::FLAG_02));

        data.element_mut(ids[2])
            .unwrap()
            .set_asset_path(AssetKind::SharedTableData, "Tables/intro");
        let sound = data.element_mut(ids[4]).unwrap();
        sound.set_asset_path(AssetKind::Audio, "Audio/rain.wav");
        sound.set_setting(Setting::Loop(true));
        data.element_mut(ids[5])
            .unwrap()
            .set_asset_path(AssetKind::Audio, "Audio/door.wav");

        data.set_comment(0, "start");
        data.set_comment(64, "cut to black");
        data
    }

    #[test]
    fn test_roundtrip_every_kind() {
        let config = TimelineConfig::default();
        let data = sample_document();
        let text = write_document(&data, &config).unwrap();
        let restored = read_document(&text, &config).unwrap();
        assert_same_document(&data, &restored);
        assert_eq!(restored.element_at(5).unwrap().end_frame(), 3);
    }

    #[test]
    fn test_writes_expected_tags() {
        let text = write_document(&sample_document(), &TimelineConfig::default()).unwrap();
        assert!(text.contains("<Cutscene>"));
        assert!(text.contains("<Version>256</Version>"));
        assert!(text.contains("<IsExpand>False</IsExpand>"));
        assert!(text.contains("<UInteger>4</UInteger>"));
        assert!(text.contains("&lt;&amp;&gt;"));
    }

    #[test]
    fn test_version_mismatch_rejects_document() {
        let text = "<Cutscene><Version>255</Version><PlayData><TotalFrames>10</TotalFrames></PlayData></Cutscene>";
        let err = read_document(text, &TimelineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::VersionMismatch { found: 255, expected: 256 }
        ));
    }

    #[test]
    fn test_non_positive_total_frames_is_clamped() {
        for total in ["0", "-30"] {
            let text = format!(
                "<Cutscene><Version>256</Version><PlayData><TotalFrames>{total}</TotalFrames></PlayData></Cutscene>"
            );
            let data = read_document(&text, &TimelineConfig::default()).unwrap();
            assert_eq!(data.total_frames(), 1);
        }
    }

    #[test]
    fn test_missing_version_follows_config() {
        let text = "<Cutscene><PlayData><TotalFrames>10</TotalFrames></PlayData></Cutscene>";
        let lenient = TimelineConfig::default();
        assert_eq!(read_document(text, &lenient).unwrap().total_frames(), 10);

        let strict = TimelineConfig {
            accept_missing_version: false,
            ..TimelineConfig::default()
        };
        assert!(matches!(
            read_document(text, &strict),
            Err(DocumentError::MissingVersion)
        ));
    }

    #[test]
    fn test_missing_play_data() {
        let text = "<Cutscene><Version>256</Version></Cutscene>";
        assert!(matches!(
            read_document(text, &TimelineConfig::default()),
            Err(DocumentError::MissingPlayData)
        ));
    }

    #[test]
    fn test_malformed_markup_is_rejected() {
        let text = "<Cutscene><Version>256</Version><PlayData></Element></Cutscene>";
        assert!(read_document(text, &TimelineConfig::default()).is_err());
    }

    #[test]
    fn test_bad_scalar_falls_back_to_default() {
        let text = r#"<Cutscene>
            <Version>256</Version>
            <PlayData>
              <TotalFrames>50</TotalFrames>
              <Element>
                <Type>1</Type>
                <Name>Fade</Name>
                <StartFrame>soon</StartFrame>
                <EndFrame>30</EndFrame>
                <IsExpand>true</IsExpand>
              </Element>
            </PlayData>
          </Cutscene>"#;
        let data = read_document(text, &TimelineConfig::default()).unwrap();
        let panel = data.element_at(0).unwrap();
        assert_eq!(panel.kind(), ElementKind::Panel);
        assert_eq!(panel.start_frame(), 0);
        assert_eq!(panel.end_frame(), 30);
        assert!(panel.expanded);
    }

    #[test]
    fn test_unknown_and_mismatched_blocks_are_dropped() {
        let text = r#"<Cutscene>
            <Version>256</Version>
            <PlayData>
              <TotalFrames>50</TotalFrames>
              <Element><Type>999</Type><Name>Mystery</Name></Element>
              <Element>
                <Type>512</Type>
                <Param>
                  <Type>6</Type>
                  <Segment>-1</Segment>
                  <KeyFrames>
                    <Key><Type>6</Type><Frame>4</Frame><Volume>0.5</Volume></Key>
                    <Key><Type>1</Type><Frame>8</Frame><Rotation>90</Rotation></Key>
                  </KeyFrames>
                </Param>
                <Setting><Type>7</Type><Bool>True</Bool></Setting>
              </Element>
            </PlayData>
          </Cutscene>"#;
        let data = read_document(text, &TimelineConfig::default()).unwrap();
        assert_eq!(data.element_count(), 1);
        let sound = data.element_at(0).unwrap();
        assert_eq!(sound.kind(), ElementKind::Sound);
        assert_eq!(sound.params()[0].keyframe_frames(), vec![4]);
        assert!(!sound.is_loop());
    }

    #[test]
    fn test_reads_legacy_choice_layout() {
        let text = r#"<Cutscene>
            <Version>256</Version>
            <PlayData>
              <TotalFrames>50</TotalFrames>
              <Element>
                <Type>257</Type>
                <Param><Type>7</Type><Segment>0</Segment><KeyFrames>
                  <Key><Type>7</Type><Frame>5</Frame><String>A</String><cm_xmlTagUInteger>1</cm_xmlTagUInteger></Key>
                </KeyFrames></Param>
                <Param><Type>7</Type><Segment>-1</Segment><KeyFrames>
                  <Key><Type>7</Type><Frame>5</Frame><String>B</String><cm_xmlTagUInteger>2</cm_xmlTagUInteger></Key>
                </KeyFrames></Param>
                <Setting><Type>0</Type><cm_xmlTagUInteger>8</cm_xmlTagUInteger></Setting>
              </Element>
            </PlayData>
          </Cutscene>"#;
        let data = read_document(text, &TimelineConfig::default()).unwrap();
        let choices = data.element_at(0).unwrap();
        assert_eq!(
            choices.params()[0].value_at(5),
            ParamValue::Choice(ChoiceData::new("A", EventFlags::FLAG_00))
        );
        assert_eq!(
            choices.params()[1].value_at(5),
            ParamValue::Choice(ChoiceData::new("B", EventFlags::FLAG_01))
        );
        assert_eq!(choices.flags(), EventFlags::FLAG_03);
    }

    #[test]
    fn test_empty_tags_read_as_empty_values() {
        let text = "<Cutscene><Version>256</Version><PlayData><TotalFrames>9</TotalFrames>\
                    <Element><Type>256</Type><Name/></Element><Comment><Frame>2</Frame><String/></Comment>\
                    </PlayData></Cutscene>";
        let data = read_document(text, &TimelineConfig::default()).unwrap();
        assert_eq!(data.element_at(0).unwrap().name, "");
        assert_eq!(data.comments().get(2).map(|c| c.text.as_str()), Some(""));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("cutscene-{}.xml", uuid::Uuid::new_v4()));
        let config = TimelineConfig::default();
        let data = sample_document();
        save_document(&path, &data, &config).unwrap();
        let restored = load_document(&path, &config).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_same_document(&data, &restored);
    }
}
