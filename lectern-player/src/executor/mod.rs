//! Action executors.
//!
//! ```text
//!            set_tool                begin_tool
//!   ┌──────┐ ───────► (tool held) ──────────────► ┌────────────┐
//!   │ Idle │                                      │ ToolActive │
//!   └──────┘ ◄──────────────────────────────────── └────────────┘
//!                          end_tool
//! ```
//!
//! The `seek` flag is orthogonal: it suppresses volatile rendering while
//! state is rebuilt in bulk.

mod live;
mod local;

use lectern_core::{KeyEvent, ModelError, Page, PenPoint, RenderSurface};
use thiserror::Error;

use crate::tool::{Tool, ToolError, ToolScope};

pub use live::LiveExecutor;
pub use local::LocalExecutor;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Tool must not be null")]
    ToolMissing,
    #[error("Page number {page} out of bounds")]
    PageOutOfBounds { page: i32, page_count: i32 },
    #[error("No document selected")]
    NoDocument,
    #[error("No page selected")]
    NoPage,
    #[error("Unknown document {0}")]
    UnknownDocument(u64),
    #[error("Tool {tool} failed: {source}")]
    Tool {
        tool: &'static str,
        #[source]
        source: ToolError,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type ExecResult<T> = Result<T, ExecutorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    ToolActive,
}

/// Receives decoded actions and drives tools against a document.
pub trait ActionExecutor {
    /// Makes `document_id` the target of subsequent actions.
    fn set_document(&mut self, document_id: u64) -> ExecResult<()>;

    fn set_page_number(&mut self, page_number: i32) -> ExecResult<()>;

    fn remove_page_number(&mut self, page_number: i32) -> ExecResult<()>;

    /// Replaces the current tool. An active tool is dropped without `end`.
    fn set_tool(&mut self, tool: Option<Box<dyn Tool>>) -> ExecResult<()>;

    fn current_tool(&self) -> Option<&dyn Tool>;

    fn begin_tool(&mut self, point: PenPoint) -> ExecResult<()>;

    fn execute_tool(&mut self, point: PenPoint) -> ExecResult<()>;

    fn end_tool(&mut self, point: PenPoint) -> ExecResult<()>;

    /// Runs `tool` through begin, execute and end at once; it never
    /// becomes the current tool.
    fn select_and_execute_tool(&mut self, tool: Option<Box<dyn Tool>>) -> ExecResult<()>;

    fn set_key_event(&mut self, key_event: Option<KeyEvent>);

    fn set_seek(&mut self, seek: bool);

    fn is_seeking(&self) -> bool;

    fn tool_state(&self) -> ToolState;
}

/// Tool bookkeeping shared by both executors.
#[derive(Debug, Default)]
pub(crate) struct ToolMachine {
    tool: Option<Box<dyn Tool>>,
    state: ToolState,
    key_event: Option<KeyEvent>,
    seek: bool,
}

#[derive(Clone, Copy)]
enum Phase {
    Begin,
    Execute,
    End,
}

impl ToolMachine {
    pub(crate) fn set_tool(&mut self, tool: Option<Box<dyn Tool>>) -> ExecResult<()> {
        let tool = tool.ok_or(ExecutorError::ToolMissing)?;
        self.tool = Some(tool);
        self.state = ToolState::Idle;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.tool = None;
        self.state = ToolState::Idle;
    }

    pub(crate) fn current(&self) -> Option<&dyn Tool> {
        self.tool.as_deref()
    }

    pub(crate) fn state(&self) -> ToolState {
        self.state
    }

    pub(crate) fn set_key_event(&mut self, key_event: Option<KeyEvent>) {
        self.key_event = key_event;
    }

    pub(crate) fn seek(&self) -> bool {
        self.seek
    }

    pub(crate) fn set_seek(&mut self, seek: bool) {
        self.seek = seek;
    }

    pub(crate) fn has_tool(&self) -> ExecResult<()> {
        self.tool
            .as_ref()
            .map(|_| ())
            .ok_or(ExecutorError::ToolMissing)
    }

    pub(crate) fn begin(
        &mut self,
        point: PenPoint,
        page: &mut Page,
        surface: &mut dyn RenderSurface,
    ) -> ExecResult<()> {
        self.drive(Phase::Begin, point, page, surface)?;
        self.state = ToolState::ToolActive;
        Ok(())
    }

    pub(crate) fn execute(
        &mut self,
        point: PenPoint,
        page: &mut Page,
        surface: &mut dyn RenderSurface,
    ) -> ExecResult<()> {
        self.drive(Phase::Execute, point, page, surface)
    }

    pub(crate) fn end(
        &mut self,
        point: PenPoint,
        page: &mut Page,
        surface: &mut dyn RenderSurface,
    ) -> ExecResult<()> {
        let result = self.drive(Phase::End, point, page, surface);
        self.state = ToolState::Idle;
        result
    }

    /// Runs an atomic tool to completion without touching the current one.
    pub(crate) fn run_atomic(
        &self,
        mut tool: Box<dyn Tool>,
        page: &mut Page,
        surface: &mut dyn RenderSurface,
    ) -> ExecResult<()> {
        let mut scope = self.scope(page, surface);
        let point = PenPoint::default();
        let name = tool.name();
        tool.begin(point, &mut scope)
            .and_then(|()| tool.execute(point, &mut scope))
            .and_then(|()| tool.end(point, &mut scope))
            .map_err(|source| ExecutorError::Tool { tool: name, source })
    }

    fn drive(
        &mut self,
        phase: Phase,
        point: PenPoint,
        page: &mut Page,
        surface: &mut dyn RenderSurface,
    ) -> ExecResult<()> {
        let mut scope = ToolScope {
            page,
            surface,
            key_event: self.key_event,
            seek: self.seek,
        };
        let tool = self.tool.as_mut().ok_or(ExecutorError::ToolMissing)?;
        let result = match phase {
            Phase::Begin => tool.begin(point, &mut scope),
            Phase::Execute => tool.execute(point, &mut scope),
            Phase::End => tool.end(point, &mut scope),
        };
        result.map_err(|source| ExecutorError::Tool {
            tool: tool.name(),
            source,
        })
    }

    fn scope<'a>(&self, page: &'a mut Page, surface: &'a mut dyn RenderSurface) -> ToolScope<'a> {
        ToolScope {
            page,
            surface,
            key_event: self.key_event,
            seek: self.seek,
        }
    }
}

/// Rejects page numbers outside `[0, page_count)`.
pub(crate) fn check_page(page: i32, page_count: i32) -> ExecResult<()> {
    if (0..page_count).contains(&page) {
        Ok(())
    } else {
        Err(ExecutorError::PageOutOfBounds { page, page_count })
    }
}
