use lectern_core::{Modifiers, PenPoint, Rect, Shape, StrokeStyle};
use lectern_proto::BrushAction;

use super::{Tool, ToolError, ToolResult, ToolScope};

/// Freehand and two-point shape drawing.
///
/// Freehand styles collect every point; two-point styles keep the anchor
/// and the latest point. The pointer is shown while dragging but never
/// committed to the page.
#[derive(Debug)]
pub struct ShapeTool {
    style: StrokeStyle,
    brush: BrushAction,
    shape: Option<Shape>,
    anchor: PenPoint,
}

impl ShapeTool {
    pub fn new(style: StrokeStyle, brush: BrushAction) -> Self {
        Self {
            style,
            brush,
            shape: None,
            anchor: PenPoint::default(),
        }
    }

    fn update(
        &mut self,
        point: PenPoint,
        modifiers: Modifiers,
        phase: &'static str,
    ) -> Result<&Shape, ToolError> {
        let style = self.style;
        let anchor = self.anchor;
        let shape = self.shape.as_mut().ok_or(ToolError::NotStarted { phase })?;
        if let Some(points) = shape.points_mut() {
            if style.is_two_point() {
                let end = if modifiers.contains(Modifiers::SHIFT) {
                    constrain(style, anchor, point)
                } else {
                    point
                };
                points.clear();
                points.push(anchor);
                points.push(end);
            } else {
                points.push(point);
            }
        }
        Ok(&*shape)
    }
}

/// Shift-drag keeps rectangles square and ellipses circular.
fn constrain(style: StrokeStyle, anchor: PenPoint, point: PenPoint) -> PenPoint {
    if !matches!(style, StrokeStyle::Rectangle | StrokeStyle::Ellipse) {
        return point;
    }
    let dx = point.x - anchor.x;
    let dy = point.y - anchor.y;
    let side = dx.abs().max(dy.abs());
    PenPoint::new(
        anchor.x + side.copysign(dx),
        anchor.y + side.copysign(dy),
        point.pressure,
    )
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        match self.style {
            StrokeStyle::Pen => "pen",
            StrokeStyle::Highlighter => "highlighter",
            StrokeStyle::Pointer => "pointer",
            StrokeStyle::Arrow => "arrow",
            StrokeStyle::Line => "line",
            StrokeStyle::Rectangle => "rectangle",
            StrokeStyle::Ellipse => "ellipse",
        }
    }

    fn begin(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let mut shape = Shape::stroke(self.brush.handle, self.style, self.brush.brush);
        if let Some(points) = shape.points_mut() {
            points.push(point);
        }
        self.anchor = point;
        scope.render_volatile(&shape);
        self.shape = Some(shape);
        Ok(())
    }

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let shape = self.update(point, scope.modifiers(), "execute")?.clone();
        scope.render_volatile(&shape);
        Ok(())
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        self.update(point, scope.modifiers(), "end")?;
        let shape = self.shape.take().ok_or(ToolError::NotStarted { phase: "end" })?;
        if self.style != StrokeStyle::Pointer {
            scope.page.add_shape(shape);
        }
        scope.render();
        Ok(())
    }
}

/// Zooms the view onto the dragged rectangle.
#[derive(Debug)]
pub struct ZoomTool {
    brush: BrushAction,
    anchor: Option<PenPoint>,
}

impl ZoomTool {
    pub fn new(brush: BrushAction) -> Self {
        Self {
            brush,
            anchor: None,
        }
    }

    fn frame(&self, anchor: PenPoint, point: PenPoint) -> Shape {
        let mut shape = Shape::stroke(self.brush.handle, StrokeStyle::Rectangle, self.brush.brush);
        if let Some(points) = shape.points_mut() {
            points.extend([anchor, point]);
        }
        shape
    }
}

impl Tool for ZoomTool {
    fn name(&self) -> &'static str {
        "zoom"
    }

    fn begin(&mut self, point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        self.anchor = Some(point);
        Ok(())
    }

    fn execute(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let anchor = self.anchor.ok_or(ToolError::NotStarted { phase: "execute" })?;
        let frame = self.frame(anchor, point);
        scope.render_volatile(&frame);
        Ok(())
    }

    fn end(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let anchor = self.anchor.take().ok_or(ToolError::NotStarted { phase: "end" })?;
        let rect = Rect::from_corners(anchor.to_point(), point.to_point());
        if !rect.is_empty() {
            scope.page.set_view_rect(rect);
        }
        scope.render();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::drag;
    use lectern_core::{Brush, KeyEvent, KeyPhase, NullSurface, Page};

    fn brush(handle: i32) -> BrushAction {
        BrushAction::new(handle, Brush::default())
    }

    #[test]
    fn test_pen_collects_all_points() {
        let mut page = Page::new(0);
        let mut tool = ShapeTool::new(StrokeStyle::Pen, brush(4));
        let points = [
            PenPoint::new(0.1, 0.1, 1.0),
            PenPoint::new(0.2, 0.2, 1.0),
            PenPoint::new(0.3, 0.3, 1.0),
        ];
        drag(&mut tool, &mut page, &points).unwrap();
        let shape = page.shape(4).unwrap();
        // begin + 2 executes + end
        assert_eq!(shape.points().len(), 4);
        assert!(page.can_undo());
    }

    #[test]
    fn test_line_keeps_two_points() {
        let mut page = Page::new(0);
        let mut tool = ShapeTool::new(StrokeStyle::Line, brush(1));
        let points = [
            PenPoint::new(0.0, 0.0, 1.0),
            PenPoint::new(0.5, 0.1, 1.0),
            PenPoint::new(0.8, 0.4, 1.0),
        ];
        drag(&mut tool, &mut page, &points).unwrap();
        assert_eq!(
            page.shape(1).unwrap().points(),
            &[PenPoint::new(0.0, 0.0, 1.0), PenPoint::new(0.8, 0.4, 1.0)]
        );
    }

    #[test]
    fn test_pointer_is_never_committed() {
        let mut page = Page::new(0);
        let mut tool = ShapeTool::new(StrokeStyle::Pointer, brush(1));
        drag(&mut tool, &mut page, &[PenPoint::default(), PenPoint::new(0.5, 0.5, 1.0)]).unwrap();
        assert!(page.shapes().is_empty());
        assert!(!page.can_undo());
    }

    #[test]
    fn test_shift_squares_rectangle() {
        let mut page = Page::new(0);
        let mut surface = NullSurface;
        let mut scope = ToolScope {
            page: &mut page,
            surface: &mut surface,
            key_event: Some(KeyEvent::new(16, Modifiers::SHIFT, KeyPhase::Down)),
            seek: false,
        };
        let mut tool = ShapeTool::new(StrokeStyle::Rectangle, brush(2));
        tool.begin(PenPoint::new(0.0, 0.0, 1.0), &mut scope).unwrap();
        tool.end(PenPoint::new(0.2, -0.5, 1.0), &mut scope).unwrap();
        let end = page.shape(2).unwrap().points()[1];
        assert_eq!((end.x, end.y), (0.5, -0.5));
    }

    #[test]
    fn test_execute_before_begin_fails() {
        let mut page = Page::new(0);
        let mut surface = NullSurface;
        let mut scope = ToolScope {
            page: &mut page,
            surface: &mut surface,
            key_event: None,
            seek: false,
        };
        let mut tool = ShapeTool::new(StrokeStyle::Pen, brush(1));
        assert_eq!(
            tool.execute(PenPoint::default(), &mut scope),
            Err(ToolError::NotStarted { phase: "execute" })
        );
    }

    #[test]
    fn test_zoom_sets_view() {
        let mut page = Page::new(0);
        let mut tool = ZoomTool::new(brush(0));
        drag(
            &mut tool,
            &mut page,
            &[PenPoint::new(0.5, 0.5, 1.0), PenPoint::new(0.25, 0.75, 1.0)],
        )
        .unwrap();
        assert_eq!(page.view_rect(), Rect::new(0.25, 0.5, 0.25, 0.25));
        assert!(page.shapes().is_empty());
    }

    #[test]
    fn test_zero_area_zoom_keeps_view() {
        let mut page = Page::new(0);
        let mut tool = ZoomTool::new(brush(0));
        drag(&mut tool, &mut page, &[PenPoint::new(0.5, 0.5, 1.0)]).unwrap();
        assert_eq!(page.view_rect(), Rect::unit());
    }
}
