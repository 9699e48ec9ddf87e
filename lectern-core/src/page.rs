//! A single document page: its shapes, undo history and visible area.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::shape::Shape;

/// One undoable change to a page's shape list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageEdit {
    Added(Vec<Shape>),
    Removed(Vec<Shape>),
    Replaced { before: Shape, after: Shape },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    number: i32,
    shapes: Vec<Shape>,
    undo: Vec<PageEdit>,
    redo: Vec<PageEdit>,
    view: Rect,
}

impl Page {
    pub fn new(number: i32) -> Self {
        Self {
            number,
            shapes: Vec::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            view: Rect::unit(),
        }
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: i32) {
        self.number = number;
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, handle: i32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.handle == handle)
    }

    /// Mutable access that bypasses the undo history (live text typing).
    pub fn shape_mut(&mut self, handle: i32) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.handle == handle)
    }

    /// Topmost shape under `point`.
    pub fn shape_at(&self, point: Point) -> Option<&Shape> {
        self.shapes.iter().rev().find(|s| s.hit(point))
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.add_shapes(vec![shape]);
    }

    /// Adds several shapes as a single undoable edit.
    pub fn add_shapes(&mut self, shapes: Vec<Shape>) {
        if shapes.is_empty() {
            return;
        }
        self.shapes.extend(shapes.iter().cloned());
        self.record(PageEdit::Added(shapes));
    }

    pub fn remove_shape(&mut self, handle: i32) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.handle == handle)?;
        let removed = self.shapes.remove(index);
        self.record(PageEdit::Removed(vec![removed.clone()]));
        Some(removed)
    }

    /// Replaces the shape with the same handle, recording the old version.
    pub fn replace_shape(&mut self, shape: Shape) -> Option<Shape> {
        let slot = self.shapes.iter_mut().find(|s| s.handle == shape.handle)?;
        let before = std::mem::replace(slot, shape.clone());
        self.record(PageEdit::Replaced {
            before: before.clone(),
            after: shape,
        });
        Some(before)
    }

    /// Removes every shape as one undoable edit.
    pub fn clear_shapes(&mut self) {
        if self.shapes.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.shapes);
        self.record(PageEdit::Removed(removed));
    }

    /// Drops shapes, history and zoom without recording anything.
    pub fn reset(&mut self) {
        self.shapes.clear();
        self.undo.clear();
        self.redo.clear();
        self.view = Rect::unit();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(edit) = self.undo.pop() else {
            return false;
        };
        self.revert(&edit);
        self.redo.push(edit);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(edit) = self.redo.pop() else {
            return false;
        };
        self.apply(&edit);
        self.undo.push(edit);
        true
    }

    pub fn view_rect(&self) -> Rect {
        self.view
    }

    pub fn set_view_rect(&mut self, view: Rect) {
        self.view = view;
    }

    pub fn reset_view(&mut self) {
        self.view = Rect::unit();
    }

    pub fn selected_handles(&self) -> Vec<i32> {
        self.shapes
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.handle)
            .collect()
    }

    pub fn set_selection(&mut self, handles: &[i32]) {
        for shape in self.shapes.iter_mut() {
            shape.selected = handles.contains(&shape.handle);
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(&[]);
    }

    /// Smallest handle above every handle currently on the page.
    pub fn next_free_handle(&self) -> i32 {
        self.shapes
            .iter()
            .map(|s| s.handle)
            .max()
            .map_or(0, |h| h.saturating_add(1))
    }

    fn record(&mut self, edit: PageEdit) {
        self.undo.push(edit);
        self.redo.clear();
    }

    fn apply(&mut self, edit: &PageEdit) {
        match edit {
            PageEdit::Added(shapes) => self.shapes.extend(shapes.iter().cloned()),
            PageEdit::Removed(shapes) => self.drop_handles(shapes),
            PageEdit::Replaced { after, .. } => self.swap_in(after),
        }
    }

    fn revert(&mut self, edit: &PageEdit) {
        match edit {
            PageEdit::Added(shapes) => self.drop_handles(shapes),
            PageEdit::Removed(shapes) => self.shapes.extend(shapes.iter().cloned()),
            PageEdit::Replaced { before, .. } => self.swap_in(before),
        }
    }

    fn drop_handles(&mut self, shapes: &[Shape]) {
        self.shapes
            .retain(|s| !shapes.iter().any(|gone| gone.handle == s.handle));
    }

    fn swap_in(&mut self, shape: &Shape) {
        if let Some(slot) = self.shapes.iter_mut().find(|s| s.handle == shape.handle) {
            *slot = shape.clone();
        }
    }
}
