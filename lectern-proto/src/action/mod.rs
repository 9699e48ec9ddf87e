//! The closed action catalogue.
//!
//! Wire format of one action payload (the framing in front of it carries
//! the body length, type tag and timestamp):
//! ```text
//! ┌──────────┬──────────────────────────────┬────────────┐
//! │ header   │ key event (iff header bit 0) │ body       │
//! │ i32      │ i32 code, i32 mods, i8 phase │ per variant│
//! └──────────┴──────────────────────────────┴────────────┘
//! ```

mod codec;
mod dispatch;

use lectern_core::{Brush, KeyEvent, LatexFont, PenPoint, Point, Rect, TextFont};
use serde::{Deserialize, Serialize};

pub use codec::{decode_payload, encode_payload, HEADER_LEN, KEY_EVENT_LEN};
pub(crate) use codec::{put_prefixed_str, read_prefixed_str};
pub use dispatch::{parse, read_action_record, write_action_record, ACTION_RECORD_PREFIX_LEN};

/// Wire tag of each action variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionType {
    Pen = 0,
    Highlighter = 1,
    Pointer = 2,
    Arrow = 3,
    Line = 4,
    Rectangle = 5,
    Ellipse = 6,
    Text = 7,
    TextChange = 8,
    TextFontChange = 9,
    TextMove = 10,
    TextRemove = 11,
    TextHighlight = 12,
    Latex = 13,
    LatexFontChange = 14,
    Clone = 15,
    Select = 16,
    SelectGroup = 17,
    Undo = 18,
    Redo = 19,
    ClearShapes = 20,
    Panning = 21,
    ExtendView = 22,
    Zoom = 23,
    ZoomOut = 24,
    Rubber = 25,
    Key = 26,
    ToolBegin = 27,
    ToolExecute = 28,
    ToolEnd = 29,
}

impl ActionType {
    pub const ALL: [ActionType; 30] = [
        Self::Pen,
        Self::Highlighter,
        Self::Pointer,
        Self::Arrow,
        Self::Line,
        Self::Rectangle,
        Self::Ellipse,
        Self::Text,
        Self::TextChange,
        Self::TextFontChange,
        Self::TextMove,
        Self::TextRemove,
        Self::TextHighlight,
        Self::Latex,
        Self::LatexFontChange,
        Self::Clone,
        Self::Select,
        Self::SelectGroup,
        Self::Undo,
        Self::Redo,
        Self::ClearShapes,
        Self::Panning,
        Self::ExtendView,
        Self::Zoom,
        Self::ZoomOut,
        Self::Rubber,
        Self::Key,
        Self::ToolBegin,
        Self::ToolExecute,
        Self::ToolEnd,
    ];

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Shape handle plus the brush a drawing tool was selected with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushAction {
    pub handle: i32,
    pub brush: Brush,
}

impl BrushAction {
    pub fn new(handle: i32, brush: Brush) -> Self {
        Self { handle, brush }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    Pen(BrushAction),
    Highlighter(BrushAction),
    Pointer(BrushAction),
    Arrow(BrushAction),
    Line(BrushAction),
    Rectangle(BrushAction),
    Ellipse(BrushAction),
    Text { handle: i32 },
    TextChange { handle: i32, text: String },
    TextFontChange { handle: i32, font: TextFont },
    TextMove { handle: i32, position: Point },
    TextRemove { handle: i32 },
    TextHighlight { handle: i32, rects: Vec<Rect> },
    Latex { handle: i32 },
    LatexFontChange { handle: i32, font: LatexFont },
    Clone,
    Select,
    SelectGroup,
    Undo,
    Redo,
    ClearShapes,
    Panning,
    ExtendView(Rect),
    Zoom(BrushAction),
    ZoomOut,
    Rubber,
    Key,
    ToolBegin(PenPoint),
    ToolExecute(PenPoint),
    ToolEnd(PenPoint),
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Pen(_) => ActionType::Pen,
            Self::Highlighter(_) => ActionType::Highlighter,
            Self::Pointer(_) => ActionType::Pointer,
            Self::Arrow(_) => ActionType::Arrow,
            Self::Line(_) => ActionType::Line,
            Self::Rectangle(_) => ActionType::Rectangle,
            Self::Ellipse(_) => ActionType::Ellipse,
            Self::Text { .. } => ActionType::Text,
            Self::TextChange { .. } => ActionType::TextChange,
            Self::TextFontChange { .. } => ActionType::TextFontChange,
            Self::TextMove { .. } => ActionType::TextMove,
            Self::TextRemove { .. } => ActionType::TextRemove,
            Self::TextHighlight { .. } => ActionType::TextHighlight,
            Self::Latex { .. } => ActionType::Latex,
            Self::LatexFontChange { .. } => ActionType::LatexFontChange,
            Self::Clone => ActionType::Clone,
            Self::Select => ActionType::Select,
            Self::SelectGroup => ActionType::SelectGroup,
            Self::Undo => ActionType::Undo,
            Self::Redo => ActionType::Redo,
            Self::ClearShapes => ActionType::ClearShapes,
            Self::Panning => ActionType::Panning,
            Self::ExtendView(_) => ActionType::ExtendView,
            Self::Zoom(_) => ActionType::Zoom,
            Self::ZoomOut => ActionType::ZoomOut,
            Self::Rubber => ActionType::Rubber,
            Self::Key => ActionType::Key,
            Self::ToolBegin(_) => ActionType::ToolBegin,
            Self::ToolExecute(_) => ActionType::ToolExecute,
            Self::ToolEnd(_) => ActionType::ToolEnd,
        }
    }
}

/// One recorded user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Replay ordering key, carried by the record framing.
    pub timestamp: i32,
    pub key_event: Option<KeyEvent>,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(timestamp: i32, kind: ActionKind) -> Self {
        Self {
            timestamp,
            key_event: None,
            kind,
        }
    }

    pub fn with_key_event(mut self, key_event: KeyEvent) -> Self {
        self.key_event = Some(key_event);
        self
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    /// Payload size in bytes (header, optional key event and body).
    pub fn encoded_len(&self) -> usize {
        codec::payload_len(self)
    }
}
