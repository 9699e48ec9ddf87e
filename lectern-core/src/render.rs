//! Render-surface boundary.
//!
//! The replay engine never draws; it tells a surface what changed.
//! Two implementations ship here: [`NullSurface`] for headless replay and
//! [`RecordingSurface`], which logs every call for inspection.

use std::sync::{Arc, Mutex};

use crate::page::Page;
use crate::shape::Shape;

pub trait RenderSurface: Send {
    /// Full repaint of the committed page content.
    fn render(&mut self, page: &Page);
    /// Incremental repaint of an in-progress shape.
    fn render_volatile(&mut self, page: &Page, shape: &Shape);
    fn set_seek(&mut self, seek: bool);
    fn set_page(&mut self, page: &Page);
    fn begin_bulk_render(&mut self);
    fn end_bulk_render(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render(&mut self, _page: &Page) {}
    fn render_volatile(&mut self, _page: &Page, _shape: &Shape) {}
    fn set_seek(&mut self, _seek: bool) {}
    fn set_page(&mut self, _page: &Page) {}
    fn begin_bulk_render(&mut self) {}
    fn end_bulk_render(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Render { page: i32, shapes: usize },
    RenderVolatile { page: i32, handle: i32 },
    Seek(bool),
    SetPage(i32),
    BeginBulk,
    EndBulk,
}

/// Surface that appends every call to a shared log.
///
/// Clones share the same log, so a test can keep one handle while the
/// executor owns the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn push(&self, event: RenderEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn render(&mut self, page: &Page) {
        self.push(RenderEvent::Render {
            page: page.number(),
            shapes: page.shapes().len(),
        });
    }

    fn render_volatile(&mut self, page: &Page, shape: &Shape) {
        self.push(RenderEvent::RenderVolatile {
            page: page.number(),
            handle: shape.handle,
        });
    }

    fn set_seek(&mut self, seek: bool) {
        self.push(RenderEvent::Seek(seek));
    }

    fn set_page(&mut self, page: &Page) {
        self.push(RenderEvent::SetPage(page.number()));
    }

    fn begin_bulk_render(&mut self) {
        self.push(RenderEvent::BeginBulk);
    }

    fn end_bulk_render(&mut self) {
        self.push(RenderEvent::EndBulk);
    }
}
