use lectern_core::{PenPoint, Rect, Shape};

use super::{Tool, ToolError, ToolResult, ToolScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Replace the selection with what the gesture covers.
    Single,
    /// Add what the gesture covers to the current selection.
    Group,
}

/// Marks shapes whose bounds meet the dragged rectangle.
///
/// A click without movement selects the topmost shape under the pen.
#[derive(Debug)]
pub struct SelectTool {
    mode: SelectMode,
    anchor: Option<PenPoint>,
}

impl SelectTool {
    pub fn new(mode: SelectMode) -> Self {
        Self { mode, anchor: None }
    }
}

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        match self.mode {
            SelectMode::Single => "select",
            SelectMode::Group => "select-group",
        }
    }

    fn begin(&mut self, point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        self.anchor = Some(point);
        Ok(())
    }

    fn execute(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        self.anchor
            .map(|_| ())
            .ok_or(ToolError::NotStarted { phase: "execute" })
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let anchor = self.anchor.take().ok_or(ToolError::NotStarted { phase: "end" })?;
        let area = Rect::from_corners(anchor.to_point(), point.to_point());

        let mut handles: Vec<i32> = if area.is_empty() {
            scope
                .page
                .shape_at(point.to_point())
                .map(|shape| vec![shape.handle])
                .unwrap_or_default()
        } else {
            scope
                .page
                .shapes()
                .iter()
                .filter(|shape| shape.bounds().is_some_and(|b| b.intersects(&area)))
                .map(|shape| shape.handle)
                .collect()
        };
        if self.mode == SelectMode::Group {
            handles.extend(scope.page.selected_handles());
        }
        scope.page.set_selection(&handles);
        scope.render();
        Ok(())
    }
}

/// Duplicates the selection under fresh handles and drags the copies.
#[derive(Debug, Default)]
pub struct CloneTool {
    clones: Vec<Shape>,
    last: Option<PenPoint>,
}

impl CloneTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn drag_to(&mut self, point: PenPoint, phase: &'static str) -> ToolResult {
        let last = self.last.ok_or(ToolError::NotStarted { phase })?;
        let (dx, dy) = (f64::from(point.x - last.x), f64::from(point.y - last.y));
        for shape in self.clones.iter_mut() {
            shape.translate(dx, dy);
        }
        self.last = Some(point);
        Ok(())
    }
}

impl Tool for CloneTool {
    fn name(&self) -> &'static str {
        "clone"
    }

    fn begin(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let mut next = scope.page.next_free_handle();
        self.clones = scope
            .page
            .shapes()
            .iter()
            .filter(|shape| shape.selected)
            .map(|shape| {
                let mut copy = shape.clone();
                copy.handle = next;
                copy.selected = false;
                next = next.saturating_add(1);
                copy
            })
            .collect();
        self.last = Some(point);
        Ok(())
    }

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        self.drag_to(point, "execute")?;
        for shape in &self.clones {
            scope.render_volatile(shape);
        }
        Ok(())
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        self.drag_to(point, "end")?;
        self.last = None;
        let clones = std::mem::take(&mut self.clones);
        let handles: Vec<i32> = clones.iter().map(|shape| shape.handle).collect();
        scope.page.add_shapes(clones);
        scope.page.set_selection(&handles);
        scope.render();
        Ok(())
    }
}

/// Erases every shape the pen passes over.
#[derive(Debug, Default)]
pub struct RubberTool;

impl RubberTool {
    fn erase(point: PenPoint, scope: &mut ToolScope<'_>) {
        let mut erased = false;
        while let Some(handle) = scope.page.shape_at(point.to_point()).map(|s| s.handle) {
            scope.page.remove_shape(handle);
            erased = true;
        }
        if erased {
            scope.render();
        }
    }
}

impl Tool for RubberTool {
    fn name(&self) -> &'static str {
        "rubber"
    }

    fn begin(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        Self::erase(point, scope);
        Ok(())
    }

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        Self::erase(point, scope);
        Ok(())
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        Self::erase(point, scope);
        Ok(())
    }
}

/// Moves the view against the drag direction.
#[derive(Debug, Default)]
pub struct PanTool {
    last: Option<PenPoint>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn pan(&mut self, point: PenPoint, scope: &mut ToolScope<'_>, phase: &'static str) -> ToolResult {
        let last = self.last.ok_or(ToolError::NotStarted { phase })?;
        let (dx, dy) = (f64::from(point.x - last.x), f64::from(point.y - last.y));
        let view = scope.page.view_rect().translate(-dx, -dy);
        scope.page.set_view_rect(view);
        self.last = Some(point);
        scope.render();
        Ok(())
    }
}

impl Tool for PanTool {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn begin(&mut self, point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        self.last = Some(point);
        Ok(())
    }

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        self.pan(point, scope, "execute")
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        self.pan(point, scope, "end")?;
        self.last = None;
        Ok(())
    }
}
