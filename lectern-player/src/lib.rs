//! # lectern-player: replay engine for decoded annotation actions
//!
//! ```text
//!  StreamProcessor ── PendingDocumentBuffer ── DocumentResolver
//!        │
//!        ▼
//!  PlaybackScheduler ── tick() ──► ExecuteAction
//!                                      │
//!                    ┌─────────────────┴─────────────────┐
//!                    ▼                                   ▼
//!              LiveExecutor                        LocalExecutor
//!        (registry of documents)               (one fixed document)
//!                    │                                   │
//!                    └──────── Tool ──► Page, RenderSurface
//! ```
//!
//! ## Modules
//!
//! - [`executor`]: the executor trait, its tool state machine, live and local executors
//! - [`tool`]: drawing, text, selection and one-shot page tools
//! - [`apply`]: maps each action kind onto executor calls
//! - [`scheduler`]: frame-paced FIFO playback and its async driver
//! - [`pending`]: buffering for documents still being resolved
//! - [`stream`]: envelope routing for live sessions
//! - [`config`]: playback and stream settings

pub mod apply;
pub mod config;
pub mod executor;
pub mod pending;
pub mod scheduler;
pub mod stream;
pub mod tool;

pub use apply::{ExecuteAction, TickReport};
pub use config::{PlaybackConfig, StreamConfig};
pub use executor::{
    ActionExecutor, ExecResult, ExecutorError, LiveExecutor, LocalExecutor, ToolState,
};
pub use pending::{
    Admission, AsyncResolver, CompletedResolution, DocumentResolver, PendingDocumentBuffer,
    PendingError, Resolution, ResolutionHandle, ResolveError, WhiteboardResolver,
};
pub use scheduler::{run_playback, PlaybackCommand, PlaybackScheduler, PlaybackState};
pub use stream::{EnvelopeResult, ProcessOutcome, ResolutionOutcome, StreamError, StreamProcessor};
pub use tool::{Tool, ToolError, ToolScope};
