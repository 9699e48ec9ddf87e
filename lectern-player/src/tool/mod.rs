//! Tools driven by the executors.
//!
//! A tool receives `begin → execute* → end` with a pen point each time,
//! plus a [`ToolScope`] borrowing the page and surface it works on.
//! Atomic tools do all of their work in `begin`; the executor runs the
//! whole sequence at once without making them current.

mod atomic;
mod select;
mod stroke;
mod text;

use std::fmt;

use lectern_core::{KeyEvent, Modifiers, Page, PenPoint, RenderSurface, Shape};
use thiserror::Error;

pub use atomic::{ClearShapesTool, ExtendViewTool, RedoTool, UndoTool, ZoomOutTool};
pub use select::{CloneTool, PanTool, RubberTool, SelectMode, SelectTool};
pub use stroke::{ShapeTool, ZoomTool};
pub use text::{TextEdit, TextEditTool, TextTool};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("shape {handle} not found")]
    ShapeNotFound { handle: i32 },
    #[error("shape {handle} is not a text box")]
    NotText { handle: i32 },
    #[error("{phase} called before begin")]
    NotStarted { phase: &'static str },
}

pub type ToolResult = Result<(), ToolError>;

/// Page and surface a tool call operates on.
pub struct ToolScope<'a> {
    pub page: &'a mut Page,
    pub surface: &'a mut dyn RenderSurface,
    pub key_event: Option<KeyEvent>,
    pub seek: bool,
}

impl ToolScope<'_> {
    pub fn render(&mut self) {
        self.surface.render(self.page);
    }

    /// Preview of an uncommitted shape; suppressed while seeking.
    pub fn render_volatile(&mut self, shape: &Shape) {
        if !self.seek {
            self.surface.render_volatile(self.page, shape);
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.key_event
            .map(|key| key.modifiers)
            .unwrap_or_else(Modifiers::empty)
    }
}

pub trait Tool: Send + fmt::Debug {
    fn name(&self) -> &'static str;

    fn begin(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult;

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult;

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult;
}
