use lectern_core::{Document, KeyEvent, Page, PenPoint, RenderSurface};

use super::{check_page, ActionExecutor, ExecResult, ExecutorError, ToolMachine, ToolState};
use crate::tool::Tool;

/// Executor bound to one document for the lifetime of a replay.
///
/// `set_document` and `set_seek` are accepted and ignored.
pub struct LocalExecutor {
    document: Document,
    surface: Box<dyn RenderSurface>,
    machine: ToolMachine,
}

impl LocalExecutor {
    pub fn new(document: Document, surface: Box<dyn RenderSurface>) -> Self {
        Self {
            document,
            surface,
            machine: ToolMachine::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn parts(&mut self) -> ExecResult<(&mut Page, &mut dyn RenderSurface, &mut ToolMachine)> {
        let number = self
            .document
            .current_page_number()
            .ok_or(ExecutorError::NoPage)?;
        let page = self.document.page_mut(number)?;
        Ok((page, self.surface.as_mut(), &mut self.machine))
    }
}

impl ActionExecutor for LocalExecutor {
    fn set_document(&mut self, _document_id: u64) -> ExecResult<()> {
        Ok(())
    }

    fn set_page_number(&mut self, page_number: i32) -> ExecResult<()> {
        check_page(page_number, self.document.page_count())?;
        if self.document.current_page_number() != Some(page_number) {
            self.machine.clear();
        }
        self.document.select_page(page_number)?;
        let page = self.document.page(page_number)?;
        self.surface.set_page(page);
        Ok(())
    }

    fn remove_page_number(&mut self, page_number: i32) -> ExecResult<()> {
        check_page(page_number, self.document.page_count())?;
        self.document.remove_page(page_number)?;
        Ok(())
    }

    fn set_tool(&mut self, tool: Option<Box<dyn Tool>>) -> ExecResult<()> {
        self.machine.set_tool(tool)
    }

    fn current_tool(&self) -> Option<&dyn Tool> {
        self.machine.current()
    }

    fn begin_tool(&mut self, point: PenPoint) -> ExecResult<()> {
        self.machine.has_tool()?;
        let (page, surface, machine) = self.parts()?;
        machine.begin(point, page, surface)
    }

    fn execute_tool(&mut self, point: PenPoint) -> ExecResult<()> {
        self.machine.has_tool()?;
        let (page, surface, machine) = self.parts()?;
        machine.execute(point, page, surface)
    }

    fn end_tool(&mut self, point: PenPoint) -> ExecResult<()> {
        self.machine.has_tool()?;
        let (page, surface, machine) = self.parts()?;
        machine.end(point, page, surface)
    }

    fn select_and_execute_tool(&mut self, tool: Option<Box<dyn Tool>>) -> ExecResult<()> {
        let tool = tool.ok_or(ExecutorError::ToolMissing)?;
        let (page, surface, machine) = self.parts()?;
        machine.run_atomic(tool, page, surface)
    }

    fn set_key_event(&mut self, key_event: Option<KeyEvent>) {
        self.machine.set_key_event(key_event);
    }

    fn set_seek(&mut self, _seek: bool) {}

    fn is_seeking(&self) -> bool {
        false
    }

    fn tool_state(&self) -> ToolState {
        self.machine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ClearShapesTool, ShapeTool};
    use lectern_core::{Brush, NullSurface, RecordingSurface, StrokeStyle};
    use lectern_proto::BrushAction;

    fn executor() -> LocalExecutor {
        LocalExecutor::new(Document::whiteboard(1, 2), Box::new(NullSurface))
    }

    #[test]
    fn test_document_and_seek_are_ignored() {
        let surface = RecordingSurface::new();
        let mut executor = LocalExecutor::new(Document::whiteboard(1, 2), Box::new(surface.clone()));
        executor.set_document(99).unwrap();
        executor.set_seek(true);
        assert!(!executor.is_seeking());
        assert!(surface.events().is_empty());
        assert_eq!(executor.document().id(), 1);
    }

    #[test]
    fn test_bounds_match_live_executor() {
        let mut executor = executor();
        assert_eq!(
            executor.set_page_number(2).unwrap_err().to_string(),
            "Page number 2 out of bounds"
        );
        assert!(executor.remove_page_number(5).is_err());
        executor.set_page_number(1).unwrap();
    }

    #[test]
    fn test_draw_and_clear() {
        let mut executor = executor();
        executor.set_page_number(0).unwrap();
        executor
            .set_tool(Some(Box::new(ShapeTool::new(
                StrokeStyle::Pen,
                BrushAction::new(1, Brush::default()),
            ))))
            .unwrap();
        executor.begin_tool(PenPoint::default()).unwrap();
        executor.end_tool(PenPoint::new(0.5, 0.5, 1.0)).unwrap();
        assert_eq!(executor.document().page(0).unwrap().shapes().len(), 1);

        executor
            .select_and_execute_tool(Some(Box::new(ClearShapesTool)))
            .unwrap();
        assert!(executor.document().page(0).unwrap().shapes().is_empty());
        assert_eq!(executor.current_tool().map(|t| t.name()), Some("pen"));
    }

    #[test]
    fn test_remove_current_page() {
        let mut executor = executor();
        executor.set_page_number(1).unwrap();
        executor.remove_page_number(1).unwrap();
        assert_eq!(executor.document().page_count(), 1);
        assert_eq!(executor.document().current_page_number(), Some(0));
    }
}
