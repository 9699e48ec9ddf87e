//! # lectern-proto: binary wire protocol for recorded and live annotations
//!
//! ```text
//!  recording file                      live transport
//! ┌──────────────┐                    ┌──────────────┐
//! │ RecordedPage │ …                  │StreamEnvelope│ …
//! └──────┬───────┘                    └──────┬───────┘
//!        │ static / playback regions         │ PagePlayback, PageActions
//!        ▼                                   ▼
//!   action record := bodyLength:i32 tag:i8 timestamp:i32 payload
//!        │
//!        ▼
//!   ByteReader / ByteWriter (bounds-checked, big-endian)
//! ```
//!
//! ## Modules
//!
//! - [`cursor`]: positioned reader and growable writer over byte buffers
//! - [`action`]: the action catalogue, its payload codec and tag dispatch
//! - [`page`]: recorded page (static + playback regions)
//! - [`envelope`]: live stream envelopes
//!
//! Unknown type tags are skipped by their declared length so older readers
//! keep working against newer producers.

pub mod action;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod page;

pub use action::{
    parse, read_action_record, write_action_record, Action, ActionKind, ActionType, BrushAction,
};
pub use cursor::{ByteOrder, ByteReader, ByteWriter, CursorError};
pub use envelope::{
    check_body_len, decode_envelope_body, decode_envelopes, encode_envelopes, read_envelope,
    PageRef, SpeechPublished, StreamEnvelope, StreamType, DEFAULT_MAX_RECORD_BYTES,
    ENVELOPE_LEN_PREFIX,
};
pub use error::{ProtoError, ProtoResult};
pub use page::{decode_recording, encode_recording, RecordedPage};
