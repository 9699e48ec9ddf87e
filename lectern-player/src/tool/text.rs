use lectern_core::{LatexFont, PenPoint, Point, Rect, Shape, TextFont, TextFormat};

use super::{Tool, ToolError, ToolResult, ToolScope};

/// Places a text box (or LaTeX formula) at the pen position.
#[derive(Debug)]
pub struct TextTool {
    format: TextFormat,
    handle: i32,
}

impl TextTool {
    pub fn plain(handle: i32) -> Self {
        Self {
            format: TextFormat::Plain,
            handle,
        }
    }

    pub fn latex(handle: i32) -> Self {
        Self {
            format: TextFormat::Latex,
            handle,
        }
    }
}

impl Tool for TextTool {
    fn name(&self) -> &'static str {
        match self.format {
            TextFormat::Plain => "text",
            TextFormat::Latex => "latex",
        }
    }

    fn begin(&mut self, point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        if let Some(existing) = scope.page.shape(self.handle) {
            // Re-selecting a box the presenter already placed.
            if existing.text_box().is_some() {
                return Ok(());
            }
        }
        let shape = Shape::text(self.handle, self.format, point.to_point());
        scope.page.add_shape(shape);
        scope.render();
        Ok(())
    }

    fn execute(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        Ok(())
    }

    fn end(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextEdit {
    Content(String),
    Font(TextFont),
    Move(Point),
    Highlight(Vec<Rect>),
    LatexFont(LatexFont),
    Remove,
}

/// One-shot edit of the text shape with a given handle.
#[derive(Debug)]
pub struct TextEditTool {
    handle: i32,
    edit: TextEdit,
}

impl TextEditTool {
    pub fn new(handle: i32, edit: TextEdit) -> Self {
        Self { handle, edit }
    }
}

impl Tool for TextEditTool {
    fn name(&self) -> &'static str {
        match self.edit {
            TextEdit::Content(_) => "text-change",
            TextEdit::Font(_) => "text-font-change",
            TextEdit::Move(_) => "text-move",
            TextEdit::Highlight(_) => "text-highlight",
            TextEdit::LatexFont(_) => "latex-font-change",
            TextEdit::Remove => "text-remove",
        }
    }

    fn begin(&mut self, _point: PenPoint, scope: &mut ToolScope<'_>) -> ToolResult {
        let handle = self.handle;
        let current = scope
            .page
            .shape(handle)
            .ok_or(ToolError::ShapeNotFound { handle })?;
        if current.text_box().is_none() {
            return Err(ToolError::NotText { handle });
        }

        if matches!(self.edit, TextEdit::Remove) {
            scope.page.remove_shape(handle);
            scope.render();
            return Ok(());
        }

        let mut edited = current.clone();
        let text = edited.text_box_mut().ok_or(ToolError::NotText { handle })?;
        match &self.edit {
            TextEdit::Content(content) => text.content.clone_from(content),
            TextEdit::Font(font) => text.font = font.clone(),
            TextEdit::Move(origin) => {
                let (dx, dy) = (origin.x - text.origin.x, origin.y - text.origin.y);
                edited.translate(dx, dy);
            }
            TextEdit::Highlight(rects) => text.highlights.clone_from(rects),
            TextEdit::LatexFont(font) => text.latex_font = *font,
            TextEdit::Remove => {}
        }
        scope.page.replace_shape(edited);
        scope.render();
        Ok(())
    }

    fn execute(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        Ok(())
    }

    fn end(&mut self, _point: PenPoint, _scope: &mut ToolScope<'_>) -> ToolResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::apply;
    use lectern_core::{Brush, Page, StrokeStyle};

    fn page_with_text(handle: i32) -> Page {
        let mut page = Page::new(0);
        apply(&mut TextTool::plain(handle), &mut page).unwrap();
        page
    }

    #[test]
    fn test_text_tool_places_box() {
        let page = page_with_text(3);
        let text = page.shape(3).unwrap().text_box().unwrap();
        assert_eq!(text.format, TextFormat::Plain);
        assert!(text.content.is_empty());
    }

    #[test]
    fn test_change_content_is_undoable() {
        let mut page = page_with_text(1);
        apply(
            &mut TextEditTool::new(1, TextEdit::Content("E = mc^2".into())),
            &mut page,
        )
        .unwrap();
        assert_eq!(page.shape(1).unwrap().text_box().unwrap().content, "E = mc^2");

        assert!(page.undo());
        assert!(page.shape(1).unwrap().text_box().unwrap().content.is_empty());
    }

    #[test]
    fn test_move_carries_highlights() {
        let mut page = page_with_text(1);
        apply(
            &mut TextEditTool::new(1, TextEdit::Highlight(vec![Rect::new(0.0, 0.0, 1.0, 1.0)])),
            &mut page,
        )
        .unwrap();
        apply(
            &mut TextEditTool::new(1, TextEdit::Move(Point::new(2.0, 3.0))),
            &mut page,
        )
        .unwrap();
        let text = page.shape(1).unwrap().text_box().unwrap();
        assert_eq!(text.origin, Point::new(2.0, 3.0));
        assert_eq!(text.highlights, vec![Rect::new(2.0, 3.0, 1.0, 1.0)]);
    }

    #[test]
    fn test_remove() {
        let mut page = page_with_text(1);
        apply(&mut TextEditTool::new(1, TextEdit::Remove), &mut page).unwrap();
        assert!(page.shapes().is_empty());
    }

    #[test]
    fn test_missing_or_wrong_shape() {
        let mut page = Page::new(0);
        assert_eq!(
            apply(&mut TextEditTool::new(9, TextEdit::Remove), &mut page),
            Err(ToolError::ShapeNotFound { handle: 9 })
        );

        page.add_shape(Shape::stroke(2, StrokeStyle::Pen, Brush::default()));
        assert_eq!(
            apply(&mut TextEditTool::new(2, TextEdit::Content("x".into())), &mut page),
            Err(ToolError::NotText { handle: 2 })
        );
    }
}
