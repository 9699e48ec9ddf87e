//! # lectern-core: shared model for annotated-document replay
//!
//! Geometry, styles and key-event snapshots used on the wire, plus the
//! reference page/document model and the render-surface boundary that
//! the replay engine drives.
//!
//! ```text
//! Document ── Page ── Shape (handle → stroke | text)
//!                │
//!                └── undo/redo history, view rectangle
//! ```

pub mod document;
pub mod geometry;
pub mod input;
pub mod page;
pub mod render;
pub mod shape;
pub mod style;

pub use document::{Document, DocumentState, DocumentType, ModelError};
pub use geometry::{PenPoint, Point, Rect};
pub use input::{KeyEvent, KeyPhase, Modifiers};
pub use page::{Page, PageEdit};
pub use render::{NullSurface, RecordingSurface, RenderEvent, RenderSurface};
pub use shape::{Shape, ShapeKind, StrokeStyle, TextBox, TextFormat};
pub use style::{Brush, Color, FontPosture, FontWeight, LatexFont, LineCap, TextFont};
