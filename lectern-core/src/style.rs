//! Brush and font descriptors carried by drawing and text actions.

use serde::{Deserialize, Serialize};

/// RGBA color, packed on the wire as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const RED: Color = Color::rgba(255, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_packed(rgba: u32) -> Self {
        let [r, g, b, a] = rgba.to_be_bytes();
        Self { r, g, b, a }
    }

    pub fn to_packed(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }
}

/// Stroke end decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum LineCap {
    Butt = 0,
    #[default]
    Round = 1,
    Square = 2,
}

impl LineCap {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }
}

/// Stroke appearance shared by pen-like and shape tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Color,
    pub line_cap: LineCap,
    pub width: f64,
}

impl Brush {
    pub fn new(color: Color, line_cap: LineCap, width: f64) -> Self {
        Self {
            color,
            line_cap,
            width,
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(Color::BLACK, LineCap::Round, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FontPosture {
    #[default]
    Regular = 0,
    Italic = 1,
}

impl FontPosture {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Regular),
            1 => Some(Self::Italic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FontWeight {
    #[default]
    Normal = 0,
    Bold = 1,
}

impl FontWeight {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Bold),
            _ => None,
        }
    }
}

/// Font of a plain text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFont {
    pub family: String,
    pub size: f64,
    pub posture: FontPosture,
    pub weight: FontWeight,
    pub strikethrough: bool,
    pub underline: bool,
}

impl Default for TextFont {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 24.0,
            posture: FontPosture::Regular,
            weight: FontWeight::Normal,
            strikethrough: false,
            underline: false,
        }
    }
}

/// Font of a rendered LaTeX formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatexFont {
    pub font_type: i32,
    pub size: f32,
    pub color: Color,
    pub style: i32,
}

impl Default for LatexFont {
    fn default() -> Self {
        Self {
            font_type: 0,
            size: 20.0,
            color: Color::BLACK,
            style: 0,
        }
    }
}
