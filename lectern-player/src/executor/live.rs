use std::collections::HashMap;

use lectern_core::{Document, KeyEvent, Page, PenPoint, RenderSurface};
use lectern_proto::RecordedPage;
use log::{debug, info, warn};

use super::{check_page, ActionExecutor, ExecResult, ExecutorError, ToolMachine, ToolState};
use crate::apply::{ExecuteAction, TickReport};
use crate::tool::Tool;

/// Executor for a live session: many documents, one selected.
pub struct LiveExecutor {
    documents: HashMap<u64, Document>,
    selected: Option<u64>,
    surface: Box<dyn RenderSurface>,
    machine: ToolMachine,
}

impl LiveExecutor {
    pub fn new(surface: Box<dyn RenderSurface>) -> Self {
        Self {
            documents: HashMap::new(),
            selected: None,
            surface,
            machine: ToolMachine::default(),
        }
    }

    /// Adds a resolved document; a document with the same id is replaced.
    pub fn register_document(&mut self, document: Document) {
        let id = document.id();
        info!(
            "Registered document {id} \"{}\" ({} pages)",
            document.title(),
            document.page_count()
        );
        if self.documents.insert(id, document).is_some() {
            debug!("Document {id} replaced an earlier instance");
        }
    }

    pub fn select_document(&mut self, document_id: u64) -> ExecResult<()> {
        let document = self
            .documents
            .get(&document_id)
            .ok_or(ExecutorError::UnknownDocument(document_id))?;
        if self.selected != Some(document_id) {
            self.machine.clear();
        }
        self.selected = Some(document_id);
        if let Some(page) = document
            .current_page_number()
            .and_then(|n| document.page(n).ok())
        {
            self.surface.set_page(page);
        }
        Ok(())
    }

    pub fn close_document(&mut self, document_id: u64) -> ExecResult<Document> {
        let document = self
            .documents
            .remove(&document_id)
            .ok_or(ExecutorError::UnknownDocument(document_id))?;
        if self.selected == Some(document_id) {
            self.selected = None;
            self.machine.clear();
        }
        info!("Closed document {document_id}");
        Ok(document)
    }

    pub fn create_page(&mut self, document_id: u64, page_number: i32) -> ExecResult<()> {
        let document = self.document_entry(document_id)?;
        document.insert_page(page_number)?;
        Ok(())
    }

    pub fn delete_page(&mut self, document_id: u64, page_number: i32) -> ExecResult<()> {
        let document = self.document_entry(document_id)?;
        check_page(page_number, document.page_count())?;
        document.remove_page(page_number)?;
        Ok(())
    }

    pub fn select_page(&mut self, document_id: u64, page_number: i32) -> ExecResult<()> {
        self.select_document(document_id)?;
        self.set_page_number(page_number)
    }

    /// Rebuilds a page from its recorded actions.
    ///
    /// The page is reset, then static and playback actions are applied in
    /// seek mode inside one bulk render. A failing action is logged and
    /// skipped.
    pub fn hydrate_page(
        &mut self,
        document_id: u64,
        recorded: &RecordedPage,
    ) -> ExecResult<TickReport> {
        self.select_page(document_id, recorded.page_number)?;
        self.selected_page_mut()?.reset();

        let was_seeking = self.machine.seek();
        self.surface.begin_bulk_render();
        self.set_seek(true);

        let mut report = TickReport::default();
        for action in recorded.static_actions.iter().chain(&recorded.playback_actions) {
            match self.execute_action(action) {
                Ok(()) => report.executed += 1,
                Err(e) => {
                    warn!(
                        "Hydrating page {} of document {document_id}: {:?} failed: {e}",
                        recorded.page_number,
                        action.action_type()
                    );
                    report.failed += 1;
                }
            }
        }

        self.machine.clear();
        self.set_seek(was_seeking);
        self.surface.end_bulk_render();
        let (page, surface, _) = self.parts()?;
        surface.render(page);
        debug!(
            "Hydrated page {} of document {document_id}: {} applied, {} failed",
            recorded.page_number, report.executed, report.failed
        );
        Ok(report)
    }

    pub fn document(&self, document_id: u64) -> Option<&Document> {
        self.documents.get(&document_id)
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.selected.and_then(|id| self.documents.get(&id))
    }

    pub fn selected_document_id(&self) -> Option<u64> {
        self.selected
    }

    /// Page number currently shown for the selected document.
    pub fn selected_page_number(&self) -> Option<i32> {
        self.selected_document()
            .and_then(Document::current_page_number)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn document_entry(&mut self, document_id: u64) -> ExecResult<&mut Document> {
        self.documents
            .get_mut(&document_id)
            .ok_or(ExecutorError::UnknownDocument(document_id))
    }

    fn selected_document_mut(&mut self) -> ExecResult<&mut Document> {
        let id = self.selected.ok_or(ExecutorError::NoDocument)?;
        self.document_entry(id)
    }

    fn selected_page_mut(&mut self) -> ExecResult<&mut Page> {
        let document = self.selected_document_mut()?;
        let number = document.current_page_number().ok_or(ExecutorError::NoPage)?;
        Ok(document.page_mut(number)?)
    }

    /// Splits the borrow of the selected page from the surface and tools.
    fn parts(&mut self) -> ExecResult<(&mut Page, &mut dyn RenderSurface, &mut ToolMachine)> {
        let id = self.selected.ok_or(ExecutorError::NoDocument)?;
        let document = self
            .documents
            .get_mut(&id)
            .ok_or(ExecutorError::UnknownDocument(id))?;
        let number = document.current_page_number().ok_or(ExecutorError::NoPage)?;
        let page = document.page_mut(number)?;
        Ok((page, self.surface.as_mut(), &mut self.machine))
    }
}

impl ActionExecutor for LiveExecutor {
    fn set_document(&mut self, document_id: u64) -> ExecResult<()> {
        self.select_document(document_id)
    }

    fn set_page_number(&mut self, page_number: i32) -> ExecResult<()> {
        let id = self.selected.ok_or(ExecutorError::NoDocument)?;
        let document = self
            .documents
            .get_mut(&id)
            .ok_or(ExecutorError::UnknownDocument(id))?;
        check_page(page_number, document.page_count())?;
        let changed = document.current_page_number() != Some(page_number);
        document.select_page(page_number)?;
        let page = document.page(page_number)?;
        self.surface.set_page(page);
        if changed {
            self.machine.clear();
        }
        Ok(())
    }

    fn remove_page_number(&mut self, page_number: i32) -> ExecResult<()> {
        let document = self.selected_document_mut()?;
        check_page(page_number, document.page_count())?;
        document.remove_page(page_number)?;
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

    fn set_seek(&mut self, seek: bool) {
        self.machine.set_seek(seek);
        self.surface.set_seek(seek);
    }

    fn is_seeking(&self) -> bool {
        self.machine.seek()
    }

    fn tool_state(&self) -> ToolState {
        self.machine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ShapeTool, UndoTool};
    use lectern_core::{Brush, NullSurface, RecordingSurface, RenderEvent, StrokeStyle};
    use lectern_proto::{Action, ActionKind, BrushAction};

    fn executor_with(surface: RecordingSurface) -> LiveExecutor {
        let mut executor = LiveExecutor::new(Box::new(surface));
        executor.register_document(Document::whiteboard(1, 3));
        executor
    }

    fn pen() -> Option<Box<dyn Tool>> {
        Some(Box::new(ShapeTool::new(
            StrokeStyle::Pen,
            BrushAction::new(1, Brush::default()),
        )))
    }

    #[test]
    fn test_page_bounds() {
        let mut executor = executor_with(RecordingSurface::new());
        executor.select_document(1).unwrap();
        let err = executor.set_page_number(3).unwrap_err();
        assert_eq!(err.to_string(), "Page number 3 out of bounds");
        assert_eq!(
            executor.set_page_number(-1),
            Err(ExecutorError::PageOutOfBounds {
                page: -1,
                page_count: 3
            })
        );
        executor.set_page_number(2).unwrap();
        assert_eq!(executor.selected_page_number(), Some(2));
    }

    #[test]
    fn test_tool_required() {
        let mut executor = executor_with(RecordingSurface::new());
        executor.select_page(1, 0).unwrap();
        assert_eq!(executor.set_tool(None), Err(ExecutorError::ToolMissing));
        let err = executor.begin_tool(PenPoint::default()).unwrap_err();
        assert_eq!(err.to_string(), "Tool must not be null");
        assert_eq!(
            executor.select_and_execute_tool(None),
            Err(ExecutorError::ToolMissing)
        );
    }

    #[test]
    fn test_tool_lifecycle() {
        let surface = RecordingSurface::new();
        let mut executor = executor_with(surface.clone());
        executor.select_page(1, 0).unwrap();
        executor.set_tool(pen()).unwrap();
        assert_eq!(executor.tool_state(), ToolState::Idle);

        executor.begin_tool(PenPoint::new(0.1, 0.1, 1.0)).unwrap();
        assert_eq!(executor.tool_state(), ToolState::ToolActive);
        executor.execute_tool(PenPoint::new(0.2, 0.2, 1.0)).unwrap();
        executor.end_tool(PenPoint::new(0.3, 0.3, 1.0)).unwrap();
        assert_eq!(executor.tool_state(), ToolState::Idle);

        let page = executor.selected_document().unwrap().page(0).unwrap();
        assert_eq!(page.shapes().len(), 1);
        assert!(surface
            .events()
            .contains(&RenderEvent::Render { page: 0, shapes: 1 }));
    }

    #[test]
    fn test_atomic_tool_does_not_replace_current() {
        let mut executor = executor_with(RecordingSurface::new());
        executor.select_page(1, 0).unwrap();
        executor.set_tool(pen()).unwrap();
        executor
            .select_and_execute_tool(Some(Box::new(UndoTool)))
            .unwrap();
        assert_eq!(executor.current_tool().map(|t| t.name()), Some("pen"));
    }

    #[test]
    fn test_set_tool_drops_active_tool() {
        let mut executor = executor_with(RecordingSurface::new());
        executor.select_page(1, 0).unwrap();
        executor.set_tool(pen()).unwrap();
        executor.begin_tool(PenPoint::default()).unwrap();
        executor.set_tool(pen()).unwrap();
        assert_eq!(executor.tool_state(), ToolState::Idle);
        let page = executor.selected_document().unwrap().page(0).unwrap();
        assert!(page.shapes().is_empty());
    }

    #[test]
    fn test_no_document_or_page() {
        let mut executor = LiveExecutor::new(Box::new(NullSurface));
        assert_eq!(executor.set_page_number(0), Err(ExecutorError::NoDocument));
        assert_eq!(executor.select_document(5), Err(ExecutorError::UnknownDocument(5)));

        executor.register_document(Document::whiteboard(5, 1));
        executor.select_document(5).unwrap();
        executor.set_tool(pen()).unwrap();
        assert_eq!(
            executor.begin_tool(PenPoint::default()),
            Err(ExecutorError::NoPage)
        );
    }

    #[test]
    fn test_seek_forwarded_to_surface() {
        let surface = RecordingSurface::new();
        let mut executor = executor_with(surface.clone());
        executor.set_seek(true);
        assert!(executor.is_seeking());
        assert_eq!(surface.events(), vec![RenderEvent::Seek(true)]);
    }

    #[test]
    fn test_hydrate_isolates_failures() {
        let surface = RecordingSurface::new();
        let mut executor = executor_with(surface.clone());
        let mut recorded = RecordedPage::new(1, 0);
        recorded.static_actions = vec![
            // Fails: no text shape with handle 9.
            Action::new(0, ActionKind::TextRemove { handle: 9 }),
            Action::new(1, ActionKind::Pen(BrushAction::new(1, Brush::default()))),
            Action::new(2, ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 1.0))),
            Action::new(3, ActionKind::ToolEnd(PenPoint::new(0.2, 0.2, 1.0))),
        ];
        recorded.playback_actions = vec![Action::new(4, ActionKind::Undo)];

        let report = executor.hydrate_page(1, &recorded).unwrap();
        assert_eq!(report, TickReport { executed: 4, failed: 1 });
        assert!(!executor.is_seeking());

        let page = executor.selected_document().unwrap().page(1).unwrap();
        assert!(page.shapes().is_empty());
        assert!(page.can_redo());

        let events = surface.events();
        let begin = events.iter().position(|e| *e == RenderEvent::BeginBulk).unwrap();
        let end = events.iter().position(|e| *e == RenderEvent::EndBulk).unwrap();
        assert!(begin < end);
        assert_eq!(events[begin + 1], RenderEvent::Seek(true));
        assert_eq!(events[end - 1], RenderEvent::Seek(false));
    }

    #[test]
    fn test_page_lifecycle() {
        let mut executor = executor_with(RecordingSurface::new());
        executor.create_page(1, 3).unwrap();
        assert_eq!(executor.document(1).unwrap().page_count(), 4);
        executor.delete_page(1, 0).unwrap();
        assert_eq!(executor.document(1).unwrap().page_count(), 3);
        assert!(matches!(
            executor.delete_page(1, 7),
            Err(ExecutorError::PageOutOfBounds { page: 7, .. })
        ));
        assert_eq!(
            executor.create_page(2, 0),
            Err(ExecutorError::UnknownDocument(2))
        );
        executor.close_document(1).unwrap();
        assert_eq!(executor.document_count(), 0);
    }
}
