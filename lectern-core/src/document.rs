//! In-memory reference document model.
//!
//! Replay only needs page lookup, page count, the document id and shape
//! insertion/removal; this model provides exactly that plus page
//! creation/deletion for live sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::page::Page;
use crate::shape::Shape;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Page number {page} out of bounds")]
    PageOutOfBounds { page: i32, page_count: i32 },
    #[error("Shape {handle} not found on page {page}")]
    ShapeNotFound { page: i32, handle: i32 },
}

/// Origin of a document's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DocumentType {
    Pdf = 0,
    #[default]
    Whiteboard = 1,
    Screen = 2,
}

impl DocumentType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pdf),
            1 => Some(Self::Whiteboard),
            2 => Some(Self::Screen),
            _ => None,
        }
    }
}

/// Descriptor announced by the presenter before the document object exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentState {
    pub document_id: u64,
    pub doc_type: DocumentType,
    pub title: String,
    pub file: String,
    pub checksum: String,
}

impl DocumentState {
    pub fn new(document_id: u64, doc_type: DocumentType, title: impl Into<String>) -> Self {
        Self {
            document_id,
            doc_type,
            title: title.into(),
            file: String::new(),
            checksum: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    state: DocumentState,
    pages: Vec<Page>,
    current_page: Option<i32>,
}

impl Document {
    pub fn new(state: DocumentState, page_count: i32) -> Self {
        let pages = (0..page_count.max(0)).map(Page::new).collect();
        Self {
            state,
            pages,
            current_page: None,
        }
    }

    /// Blank whiteboard with `page_count` pages.
    pub fn whiteboard(document_id: u64, page_count: i32) -> Self {
        Self::new(
            DocumentState::new(document_id, DocumentType::Whiteboard, "Whiteboard"),
            page_count,
        )
    }

    pub fn id(&self) -> u64 {
        self.state.document_id
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn doc_type(&self) -> DocumentType {
        self.state.doc_type
    }

    pub fn title(&self) -> &str {
        &self.state.title
    }

    pub fn page_count(&self) -> i32 {
        self.pages.len() as i32
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, page_number: i32) -> Result<&Page, ModelError> {
        let index = self.index_of(page_number)?;
        Ok(&self.pages[index])
    }

    pub fn page_mut(&mut self, page_number: i32) -> Result<&mut Page, ModelError> {
        let index = self.index_of(page_number)?;
        Ok(&mut self.pages[index])
    }

    pub fn current_page_number(&self) -> Option<i32> {
        self.current_page
    }

    pub fn select_page(&mut self, page_number: i32) -> Result<(), ModelError> {
        self.index_of(page_number)?;
        self.current_page = Some(page_number);
        Ok(())
    }

    /// Inserts a blank page at `page_number`; `page_count()` appends.
    pub fn insert_page(&mut self, page_number: i32) -> Result<(), ModelError> {
        if page_number < 0 || page_number > self.page_count() {
            return Err(ModelError::PageOutOfBounds {
                page: page_number,
                page_count: self.page_count(),
            });
        }
        self.pages.insert(page_number as usize, Page::new(page_number));
        self.renumber();
        if let Some(current) = self.current_page {
            if current >= page_number {
                self.current_page = Some(current + 1);
            }
        }
        Ok(())
    }

    pub fn remove_page(&mut self, page_number: i32) -> Result<Page, ModelError> {
        let index = self.index_of(page_number)?;
        let removed = self.pages.remove(index);
        self.renumber();
        self.current_page = match self.current_page {
            _ if self.pages.is_empty() => None,
            Some(current) if current > page_number => Some(current - 1),
            Some(current) if current == page_number => Some(page_number.min(self.page_count() - 1)),
            other => other,
        };
        Ok(removed)
    }

    pub fn add_shape(&mut self, page_number: i32, shape: Shape) -> Result<(), ModelError> {
        self.page_mut(page_number)?.add_shape(shape);
        Ok(())
    }

    pub fn remove_shape(&mut self, page_number: i32, handle: i32) -> Result<Shape, ModelError> {
        self.page_mut(page_number)?
            .remove_shape(handle)
            .ok_or(ModelError::ShapeNotFound {
                page: page_number,
                handle,
            })
    }

    fn index_of(&self, page_number: i32) -> Result<usize, ModelError> {
        if page_number < 0 || page_number >= self.page_count() {
            return Err(ModelError::PageOutOfBounds {
                page: page_number,
                page_count: self.page_count(),
            });
        }
        Ok(page_number as usize)
    }

    fn renumber(&mut self) {
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.set_number(i as i32);
        }
    }
}
