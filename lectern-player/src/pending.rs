//! Buffering of envelopes for documents that are still being resolved.
//!
//! A `DocumentCreated` envelope only names a document; the object itself
//! comes from a [`DocumentResolver`] (a file download, a PDF parse, ...).
//! Until the resolver reports back, every envelope for that document id
//! is parked here in arrival order.
//!
//! ```text
//!  begin(id) ──► ResolutionHandle ──► resolver ──complete()──┐
//!                                                            ▼
//!  admit(env) ─► Queued(id) ─► VecDeque ──── complete(Resolution)
//!          └──► Dispatch(env)                     │
//!                                   Ok: replay queue / Err: discard
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;

use lectern_core::{Document, DocumentState};
use lectern_proto::StreamEnvelope;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Resolution of document {document_id} failed: {reason}")]
    Failed { document_id: u64, reason: String },
    #[error("Resolution of document {0} was abandoned")]
    Abandoned(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PendingError {
    #[error("Document {0} is already being resolved")]
    DuplicatePending(u64),
    #[error("Pending queue for document {document_id} is full ({capacity} envelopes)")]
    QueueFull { document_id: u64, capacity: usize },
}

/// Result reported by a resolver.
#[derive(Debug)]
pub struct Resolution {
    pub document_id: u64,
    pub result: Result<Document, ResolveError>,
}

/// Completion callback handed to a resolver.
///
/// Dropping the handle without calling [`complete`](Self::complete)
/// reports [`ResolveError::Abandoned`], so a pending entry can never leak.
pub struct ResolutionHandle {
    document_id: u64,
    sender: Option<mpsc::UnboundedSender<Resolution>>,
}

impl ResolutionHandle {
    pub fn document_id(&self) -> u64 {
        self.document_id
    }

    pub fn complete(mut self, result: Result<Document, ResolveError>) {
        self.send(result);
    }

    pub fn succeed(self, document: Document) {
        self.complete(Ok(document));
    }

    pub fn fail(self, reason: impl Into<String>) {
        let document_id = self.document_id;
        self.complete(Err(ResolveError::Failed {
            document_id,
            reason: reason.into(),
        }));
    }

    fn send(&mut self, result: Result<Document, ResolveError>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let resolution = Resolution {
            document_id: self.document_id,
            result,
        };
        if sender.send(resolution).is_err() {
            debug!("Resolution of document {} arrived after shutdown", self.document_id);
        }
    }
}

impl Drop for ResolutionHandle {
    fn drop(&mut self) {
        if self.sender.is_some() {
            let document_id = self.document_id;
            self.send(Err(ResolveError::Abandoned(document_id)));
        }
    }
}

impl fmt::Debug for ResolutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionHandle")
            .field("document_id", &self.document_id)
            .field("completed", &self.sender.is_none())
            .finish()
    }
}

/// Turns a document descriptor into a document, possibly asynchronously.
pub trait DocumentResolver: Send {
    /// Starts resolving `state`. The result is reported through `handle`,
    /// at any later point and from any thread.
    fn resolve(&mut self, state: DocumentState, handle: ResolutionHandle);
}

/// Resolves every descriptor to a blank document at once.
#[derive(Debug, Clone)]
pub struct WhiteboardResolver {
    /// Pages given to each resolved document. Default: 1.
    pub page_count: i32,
}

impl Default for WhiteboardResolver {
    fn default() -> Self {
        Self { page_count: 1 }
    }
}

impl DocumentResolver for WhiteboardResolver {
    fn resolve(&mut self, state: DocumentState, handle: ResolutionHandle) {
        handle.succeed(Document::new(state, self.page_count));
    }
}

/// Runs a loader future per descriptor on the tokio runtime.
///
/// Must be used from within a runtime. A loader that panics drops its
/// handle and the document is reported as abandoned.
pub struct AsyncResolver<F> {
    loader: F,
}

impl<F, Fut> AsyncResolver<F>
where
    F: FnMut(DocumentState) -> Fut + Send,
    Fut: Future<Output = Result<Document, ResolveError>> + Send + 'static,
{
    pub fn new(loader: F) -> Self {
        Self { loader }
    }
}

impl<F, Fut> DocumentResolver for AsyncResolver<F>
where
    F: FnMut(DocumentState) -> Fut + Send,
    Fut: Future<Output = Result<Document, ResolveError>> + Send + 'static,
{
    fn resolve(&mut self, state: DocumentState, handle: ResolutionHandle) {
        let load = (self.loader)(state);
        tokio::spawn(async move {
            handle.complete(load.await);
        });
    }
}

/// Where an admitted envelope goes next.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Dispatch(StreamEnvelope),
    Queued(u64),
}

/// A finished resolution together with the envelopes parked for it.
#[derive(Debug)]
pub struct CompletedResolution {
    pub document_id: u64,
    pub result: Result<Document, ResolveError>,
    pub queued: Vec<StreamEnvelope>,
}

pub struct PendingDocumentBuffer {
    entries: HashMap<u64, VecDeque<StreamEnvelope>>,
    capacity: usize,
    sender: mpsc::UnboundedSender<Resolution>,
    receiver: mpsc::UnboundedReceiver<Resolution>,
}

impl PendingDocumentBuffer {
    /// `capacity` bounds the envelopes queued per pending document.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            entries: HashMap::new(),
            capacity,
            sender,
            receiver,
        }
    }

    /// Opens a pending entry for `document_id`.
    pub fn begin(&mut self, document_id: u64) -> Result<ResolutionHandle, PendingError> {
        if self.entries.contains_key(&document_id) {
            return Err(PendingError::DuplicatePending(document_id));
        }
        self.entries.insert(document_id, VecDeque::new());
        debug!("Document {document_id} pending resolution");
        Ok(ResolutionHandle {
            document_id,
            sender: Some(self.sender.clone()),
        })
    }

    /// Parks `envelope` if its document is pending, otherwise hands it back.
    pub fn admit(&mut self, envelope: StreamEnvelope) -> Result<Admission, PendingError> {
        let Some(document_id) = envelope.document_id() else {
            return Ok(Admission::Dispatch(envelope));
        };
        let Some(queue) = self.entries.get_mut(&document_id) else {
            return Ok(Admission::Dispatch(envelope));
        };
        if queue.len() >= self.capacity {
            return Err(PendingError::QueueFull {
                document_id,
                capacity: self.capacity,
            });
        }
        queue.push_back(envelope);
        Ok(Admission::Queued(document_id))
    }

    pub fn is_pending(&self, document_id: u64) -> bool {
        self.entries.contains_key(&document_id)
    }

    pub fn queued_len(&self, document_id: u64) -> usize {
        self.entries.get(&document_id).map_or(0, VecDeque::len)
    }

    /// Number of documents awaiting resolution.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closes the entry for `resolution`. Returns `None` when no entry
    /// exists for its document.
    pub fn complete(&mut self, resolution: Resolution) -> Option<CompletedResolution> {
        let Resolution {
            document_id,
            result,
        } = resolution;
        let Some(queue) = self.entries.remove(&document_id) else {
            warn!("Resolution for document {document_id} has no pending entry");
            return None;
        };
        Some(CompletedResolution {
            document_id,
            result,
            queued: queue.into(),
        })
    }

    /// Next reported resolution, if one is ready.
    pub fn try_next_resolution(&mut self) -> Option<Resolution> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next resolution. Returns `None` at once when nothing
    /// is pending and nothing has been reported.
    pub async fn next_resolution(&mut self) -> Option<Resolution> {
        if let Some(resolution) = self.try_next_resolution() {
            return Some(resolution);
        }
        if self.entries.is_empty() {
            return None;
        }
        self.receiver.recv().await
    }
}

impl fmt::Debug for PendingDocumentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDocumentBuffer")
            .field("pending", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
