//! Shapes stored on a page.
//!
//! Every shape is addressed by the integer handle the presenter assigned
//! when it was created; actions refer to shapes only through that handle.

use serde::{Deserialize, Serialize};

use crate::geometry::{bounds_of, PenPoint, Point, Rect};
use crate::style::{Brush, LatexFont, TextFont};

/// Drawing style of a stroke-based shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokeStyle {
    Pen,
    Highlighter,
    Pointer,
    Arrow,
    Line,
    Rectangle,
    Ellipse,
}

impl StrokeStyle {
    /// Two-point shapes keep only the anchor and the latest sample.
    pub fn is_two_point(&self) -> bool {
        matches!(
            self,
            StrokeStyle::Arrow | StrokeStyle::Line | StrokeStyle::Rectangle | StrokeStyle::Ellipse
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextFormat {
    Plain,
    Latex,
}

/// Positioned text or LaTeX formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub format: TextFormat,
    pub origin: Point,
    pub content: String,
    pub font: TextFont,
    pub latex_font: LatexFont,
    pub highlights: Vec<Rect>,
}

impl TextBox {
    pub fn new(format: TextFormat, origin: Point) -> Self {
        Self {
            format,
            origin,
            content: String::new(),
            font: TextFont::default(),
            latex_font: LatexFont::default(),
            highlights: Vec::new(),
        }
    }

    fn font_size(&self) -> f64 {
        match self.format {
            TextFormat::Plain => self.font.size,
            TextFormat::Latex => f64::from(self.latex_font.size),
        }
    }

    /// Estimated extent; glyph metrics belong to the renderer.
    pub fn bounds(&self) -> Rect {
        let size = self.font_size();
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let lines = self.content.lines().count().max(1);
        Rect::new(
            self.origin.x,
            self.origin.y,
            widest as f64 * size * 0.5,
            lines as f64 * size,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Stroke {
        style: StrokeStyle,
        brush: Brush,
        points: Vec<PenPoint>,
    },
    Text(TextBox),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub handle: i32,
    pub kind: ShapeKind,
    pub selected: bool,
}

impl Shape {
    pub fn stroke(handle: i32, style: StrokeStyle, brush: Brush) -> Self {
        Self {
            handle,
            kind: ShapeKind::Stroke {
                style,
                brush,
                points: Vec::new(),
            },
            selected: false,
        }
    }

    pub fn text(handle: i32, format: TextFormat, origin: Point) -> Self {
        Self {
            handle,
            kind: ShapeKind::Text(TextBox::new(format, origin)),
            selected: false,
        }
    }

    pub fn points(&self) -> &[PenPoint] {
        match &self.kind {
            ShapeKind::Stroke { points, .. } => points,
            ShapeKind::Text(_) => &[],
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut Vec<PenPoint>> {
        match &mut self.kind {
            ShapeKind::Stroke { points, .. } => Some(points),
            ShapeKind::Text(_) => None,
        }
    }

    pub fn text_box(&self) -> Option<&TextBox> {
        match &self.kind {
            ShapeKind::Text(text) => Some(text),
            ShapeKind::Stroke { .. } => None,
        }
    }

    pub fn text_box_mut(&mut self) -> Option<&mut TextBox> {
        match &mut self.kind {
            ShapeKind::Text(text) => Some(text),
            ShapeKind::Stroke { .. } => None,
        }
    }

    /// Bounding box, widened by half the stroke width for strokes.
    pub fn bounds(&self) -> Option<Rect> {
        match &self.kind {
            ShapeKind::Stroke { brush, points, .. } => {
                bounds_of(points).map(|r| r.inflate(brush.width / 2.0))
            }
            ShapeKind::Text(text) => Some(text.bounds()),
        }
    }

    pub fn hit(&self, point: Point) -> bool {
        self.bounds().is_some_and(|b| b.contains(point))
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.kind {
            ShapeKind::Stroke { points, .. } => {
                for p in points.iter_mut() {
                    p.x += dx as f32;
                    p.y += dy as f32;
                }
            }
            ShapeKind::Text(text) => {
                text.origin.x += dx;
                text.origin.y += dy;
                for r in text.highlights.iter_mut() {
                    *r = r.translate(dx, dy);
                }
            }
        }
    }
}
