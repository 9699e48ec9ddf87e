//! Maps decoded actions onto executor calls.

use lectern_core::StrokeStyle;
use lectern_proto::{Action, ActionKind, BrushAction};

use crate::executor::{ActionExecutor, ExecResult};
use crate::tool::{
    ClearShapesTool, CloneTool, ExtendViewTool, PanTool, RedoTool, RubberTool, SelectMode,
    SelectTool, ShapeTool, TextEdit, TextEditTool, TextTool, Tool, UndoTool, ZoomOutTool,
    ZoomTool,
};

/// Counts of actions applied during a drain or hydration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub executed: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn total(&self) -> usize {
        self.executed + self.failed
    }

    pub fn merge(&mut self, other: TickReport) {
        self.executed += other.executed;
        self.failed += other.failed;
    }
}

pub trait ExecuteAction: ActionExecutor {
    /// Applies one action. A carried key event is installed first.
    fn execute_action(&mut self, action: &Action) -> ExecResult<()> {
        if action.key_event.is_some() {
            self.set_key_event(action.key_event);
        }

        match &action.kind {
            ActionKind::Pen(b) => self.set_tool(stroke(StrokeStyle::Pen, *b)),
            ActionKind::Highlighter(b) => self.set_tool(stroke(StrokeStyle::Highlighter, *b)),
            ActionKind::Pointer(b) => self.set_tool(stroke(StrokeStyle::Pointer, *b)),
            ActionKind::Arrow(b) => self.set_tool(stroke(StrokeStyle::Arrow, *b)),
            ActionKind::Line(b) => self.set_tool(stroke(StrokeStyle::Line, *b)),
            ActionKind::Rectangle(b) => self.set_tool(stroke(StrokeStyle::Rectangle, *b)),
            ActionKind::Ellipse(b) => self.set_tool(stroke(StrokeStyle::Ellipse, *b)),
            ActionKind::Zoom(b) => self.set_tool(boxed(ZoomTool::new(*b))),
            ActionKind::Text { handle } => self.set_tool(boxed(TextTool::plain(*handle))),
            ActionKind::Latex { handle } => self.set_tool(boxed(TextTool::latex(*handle))),
            ActionKind::Clone => self.set_tool(boxed(CloneTool::new())),
            ActionKind::Select => self.set_tool(boxed(SelectTool::new(SelectMode::Single))),
            ActionKind::SelectGroup => self.set_tool(boxed(SelectTool::new(SelectMode::Group))),
            ActionKind::Rubber => self.set_tool(boxed(RubberTool)),
            ActionKind::Panning => self.set_tool(boxed(PanTool::new())),

            ActionKind::TextChange { handle, text } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::Content(text.clone())))
            }
            ActionKind::TextFontChange { handle, font } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::Font(font.clone())))
            }
            ActionKind::TextMove { handle, position } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::Move(*position)))
            }
            ActionKind::TextHighlight { handle, rects } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::Highlight(rects.clone())))
            }
            ActionKind::LatexFontChange { handle, font } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::LatexFont(*font)))
            }
            ActionKind::TextRemove { handle } => {
                self.select_and_execute_tool(text_edit(*handle, TextEdit::Remove))
            }
            ActionKind::Undo => self.select_and_execute_tool(boxed(UndoTool)),
            ActionKind::Redo => self.select_and_execute_tool(boxed(RedoTool)),
            ActionKind::ClearShapes => self.select_and_execute_tool(boxed(ClearShapesTool)),
            ActionKind::ZoomOut => self.select_and_execute_tool(boxed(ZoomOutTool)),
            ActionKind::ExtendView(rect) => {
                self.select_and_execute_tool(boxed(ExtendViewTool::new(*rect)))
            }

            // The key event travelled with the action and is installed above.
            ActionKind::Key => Ok(()),

            ActionKind::ToolBegin(point) => self.begin_tool(*point),
            ActionKind::ToolExecute(point) => self.execute_tool(*point),
            ActionKind::ToolEnd(point) => self.end_tool(*point),
        }
    }
}

impl<E: ActionExecutor + ?Sized> ExecuteAction for E {}

fn boxed(tool: impl Tool + 'static) -> Option<Box<dyn Tool>> {
    Some(Box::new(tool))
}

fn stroke(style: StrokeStyle, brush: BrushAction) -> Option<Box<dyn Tool>> {
    boxed(ShapeTool::new(style, brush))
}

fn text_edit(handle: i32, edit: TextEdit) -> Option<Box<dyn Tool>> {
    boxed(TextEditTool::new(handle, edit))
}
