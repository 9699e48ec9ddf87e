//! Page commands that complete in a single step.

use lectern_core::{PenPoint, Rect};

use super::{Tool, ToolResult, ToolScope};

macro_rules! atomic_tool {
    ($ty:ident, $name:literal, |$self_:ident, $scope:ident| $body:block) => {
        impl Tool for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn begin(&mut $self_, _point: PenPoint, $scope: &mut ToolScope<'_>) -> ToolResult {
                $body
                $scope.render();
                Ok(())
            }

            fn execute(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
                Ok(())
            }

            fn end(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
                Ok(())
            }
        }
    };
}

#[derive(Debug, Default)]
pub struct UndoTool;

#[derive(Debug, Default)]
pub struct RedoTool;

#[derive(Debug, Default)]
pub struct ClearShapesTool;

#[derive(Debug, Default)]
pub struct ZoomOutTool;

#[derive(Debug)]
pub struct ExtendViewTool {
    view: Rect,
}

impl ExtendViewTool {
    pub fn new(view: Rect) -> Self {
        Self { view }
    }
}

atomic_tool!(UndoTool, "undo", |self, scope| {
    scope.page.undo();
});

atomic_tool!(RedoTool, "redo", |self, scope| {
    scope.page.redo();
});

atomic_tool!(ClearShapesTool, "clear-shapes", |self, scope| {
    scope.page.clear_shapes();
});

atomic_tool!(ZoomOutTool, "zoom-out", |self, scope| {
    scope.page.reset_view();
});

atomic_tool!(ExtendViewTool, "extend-view", |self, scope| {
    scope.page.set_view_rect(self.view);
});
