//! Live stream processing: envelopes in, executor calls out.
//!
//! ```text
//!  bytes / AsyncRead ──► envelope framing ──► PendingDocumentBuffer
//!                                                │ Dispatch
//!                                                ▼
//!                    PlaybackScheduler<LiveExecutor> ◄── PagePlayback
//!                    LiveExecutor::hydrate_page      ◄── PageActions
//! ```

use std::io;

use lectern_core::DocumentState;
use lectern_proto::{
    check_body_len, decode_envelope_body, ByteReader, ProtoError, SpeechPublished,
    StreamEnvelope, StreamType, ENVELOPE_LEN_PREFIX,
};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::apply::TickReport;
use crate::config::{PlaybackConfig, StreamConfig};
use crate::executor::{ExecutorError, LiveExecutor};
use crate::pending::{
    Admission, CompletedResolution, DocumentResolver, PendingDocumentBuffer, PendingError,
    Resolution, ResolveError,
};
use crate::scheduler::PlaybackScheduler;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Proto(#[from] ProtoError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Pending(#[from] PendingError),
    #[error("stream read failed: {0}")]
    Io(#[from] io::Error),
}

/// What happened to one envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Dispatched(StreamType),
    /// Parked until its document resolves.
    Queued { document_id: u64 },
    ResolutionStarted(u64),
    /// Speech announcements are left to the caller.
    Speech(SpeechPublished),
    Hydrated(TickReport),
    /// Unknown envelope or action tag.
    Skipped,
}

pub type EnvelopeResult = Result<ProcessOutcome, StreamError>;

#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Document registered; `results` holds one entry per replayed envelope.
    Resolved {
        document_id: u64,
        results: Vec<EnvelopeResult>,
    },
    /// Document dropped along with `discarded` queued envelopes.
    Failed {
        document_id: u64,
        error: ResolveError,
        discarded: usize,
    },
    /// No pending entry matched the resolution.
    Stale(u64),
}

pub struct StreamProcessor {
    scheduler: PlaybackScheduler<LiveExecutor>,
    pending: PendingDocumentBuffer,
    resolver: Box<dyn DocumentResolver>,
    config: StreamConfig,
}

impl StreamProcessor {
    pub fn new(
        executor: LiveExecutor,
        resolver: Box<dyn DocumentResolver>,
        config: StreamConfig,
        playback: PlaybackConfig,
    ) -> Self {
        let mut scheduler = PlaybackScheduler::new(executor, playback);
        scheduler.start();
        Self {
            scheduler,
            pending: PendingDocumentBuffer::new(config.pending_queue_capacity),
            resolver,
            config,
        }
    }

    /// Processes every envelope in `bytes`.
    ///
    /// A malformed envelope body yields an `Err` entry and processing moves
    /// on to the next envelope. Broken framing (bad length prefix or
    /// truncation) ends the batch with an `Err`.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<EnvelopeResult>, StreamError> {
        let mut reader = ByteReader::new(bytes);
        let mut results = Vec::new();
        while reader.has_remaining() {
            let len = reader.read_i32().map_err(ProtoError::from)?;
            let body_len = check_body_len(len, self.config.max_record_bytes)?;
            let body = reader.read_bytes(body_len).map_err(ProtoError::from)?;
            results.push(self.handle_body(body));
        }
        Ok(results)
    }

    /// Reads framed envelopes from `reader` until a clean end of stream.
    ///
    /// End of input is clean only on an envelope boundary. A stream that
    /// stops inside a length prefix or a body fails with `StreamError::Io`.
    pub async fn handle_reader<R>(
        &mut self,
        reader: &mut R,
    ) -> Result<Vec<EnvelopeResult>, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut results = Vec::new();
        let mut prefix = [0u8; ENVELOPE_LEN_PREFIX];
        loop {
            prefix[0] = match reader.read_u8().await {
                Ok(byte) => byte,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };
            reader.read_exact(&mut prefix[1..]).await?;
            let body_len =
                check_body_len(i32::from_be_bytes(prefix), self.config.max_record_bytes)?;
            let mut body = vec![0u8; body_len];
            reader.read_exact(&mut body).await?;
            results.push(self.handle_body(&body));
        }
        Ok(results)
    }

    /// Routes one decoded envelope through the pending buffer.
    pub fn handle_envelope(&mut self, envelope: StreamEnvelope) -> EnvelopeResult {
        if let StreamEnvelope::DocumentCreated(state) = envelope {
            return self.start_resolution(state);
        }
        match self.pending.admit(envelope)? {
            Admission::Queued(document_id) => Ok(ProcessOutcome::Queued { document_id }),
            Admission::Dispatch(envelope) => self.dispatch(envelope),
        }
    }

    /// Applies every resolution reported so far.
    pub fn process_resolutions(&mut self) -> Vec<ResolutionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(resolution) = self.pending.try_next_resolution() {
            outcomes.push(self.apply_resolution(resolution));
        }
        outcomes
    }

    /// Waits for the next resolution and applies it. Returns `None` when
    /// nothing is pending.
    pub async fn next_resolution(&mut self) -> Option<ResolutionOutcome> {
        let resolution = self.pending.next_resolution().await?;
        Some(self.apply_resolution(resolution))
    }

    /// Drains the actions queued for the current frame.
    pub fn tick(&mut self) -> TickReport {
        self.scheduler.tick()
    }

    pub fn executor(&self) -> &LiveExecutor {
        self.scheduler.executor()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler<LiveExecutor> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PlaybackScheduler<LiveExecutor> {
        &mut self.scheduler
    }

    pub fn pending(&self) -> &PendingDocumentBuffer {
        &self.pending
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn into_executor(self) -> LiveExecutor {
        self.scheduler.into_executor()
    }

    fn handle_body(&mut self, body: &[u8]) -> EnvelopeResult {
        match decode_envelope_body(body)? {
            Some(envelope) => self.handle_envelope(envelope),
            None => Ok(ProcessOutcome::Skipped),
        }
    }

    fn start_resolution(&mut self, state: DocumentState) -> EnvelopeResult {
        let document_id = state.document_id;
        let handle = self.pending.begin(document_id).inspect_err(|_| {
            warn!("Ignoring DocumentCreated for document {document_id}: resolution in flight");
        })?;
        info!("Resolving document {document_id} \"{}\"", state.title);
        self.resolver.resolve(state, handle);
        Ok(ProcessOutcome::ResolutionStarted(document_id))
    }

    fn dispatch(&mut self, envelope: StreamEnvelope) -> EnvelopeResult {
        let ty = envelope.stream_type();
        match envelope {
            StreamEnvelope::DocumentCreated(state) => return self.start_resolution(state),
            StreamEnvelope::DocumentClosed(state) => {
                self.scheduler.flush();
                self.scheduler.executor_mut().close_document(state.document_id)?;
            }
            StreamEnvelope::DocumentSelected(state) => {
                self.scheduler.flush();
                self.scheduler.executor_mut().select_document(state.document_id)?;
            }
            StreamEnvelope::PageCreated(page) => {
                self.scheduler
                    .executor_mut()
                    .create_page(page.document_id, page.page_number)?;
            }
            StreamEnvelope::PageDeleted(page) => {
                self.scheduler.flush();
                self.scheduler
                    .executor_mut()
                    .delete_page(page.document_id, page.page_number)?;
            }
            StreamEnvelope::PageSelected(page) => {
                self.scheduler.flush();
                self.scheduler
                    .executor_mut()
                    .select_page(page.document_id, page.page_number)?;
            }
            StreamEnvelope::SpeechPublished(speech) => {
                return Ok(ProcessOutcome::Speech(speech));
            }
            StreamEnvelope::PagePlayback {
                document_id,
                page_number,
                action,
            } => {
                let executor = self.scheduler.executor();
                let on_page = executor.selected_document_id() == Some(document_id)
                    && executor.selected_page_number() == Some(page_number);
                if !on_page {
                    self.scheduler.flush();
                    self.scheduler
                        .executor_mut()
                        .select_page(document_id, page_number)?;
                }
                self.scheduler.add_action(action);
            }
            StreamEnvelope::PageActions { document_id, page } => {
                self.scheduler.flush();
                let report = self
                    .scheduler
                    .executor_mut()
                    .hydrate_page(document_id, &page)?;
                return Ok(ProcessOutcome::Hydrated(report));
            }
        }
        Ok(ProcessOutcome::Dispatched(ty))
    }

    fn apply_resolution(&mut self, resolution: Resolution) -> ResolutionOutcome {
        let document_id = resolution.document_id;
        let Some(CompletedResolution {
            document_id,
            result,
            queued,
        }) = self.pending.complete(resolution)
        else {
            return ResolutionOutcome::Stale(document_id);
        };

        match result {
            Ok(document) => {
                self.scheduler.executor_mut().register_document(document);
                debug!("Replaying {} envelopes for document {document_id}", queued.len());
                let results = queued
                    .into_iter()
                    .map(|envelope| self.dispatch(envelope))
                    .collect();
                ResolutionOutcome::Resolved {
                    document_id,
                    results,
                }
            }
            Err(error) => {
                warn!("{error}; discarding {} queued envelopes", queued.len());
                ResolutionOutcome::Failed {
                    document_id,
                    error,
                    discarded: queued.len(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::WhiteboardResolver;
    use lectern_core::{Brush, DocumentType, NullSurface, PenPoint};
    use lectern_proto::{encode_envelopes, Action, ActionKind, BrushAction, PageRef};

    fn processor() -> StreamProcessor {
        StreamProcessor::new(
            LiveExecutor::new(Box::new(NullSurface)),
            Box::new(WhiteboardResolver { page_count: 2 }),
            StreamConfig::for_testing(),
            PlaybackConfig::for_testing(),
        )
    }

    fn created(document_id: u64) -> StreamEnvelope {
        StreamEnvelope::DocumentCreated(DocumentState::new(
            document_id,
            DocumentType::Whiteboard,
            "board",
        ))
    }

    fn playback(document_id: u64, page_number: i32, kind: ActionKind) -> StreamEnvelope {
        StreamEnvelope::PagePlayback {
            document_id,
            page_number,
            action: Action::new(0, kind),
        }
    }

    #[test]
    fn test_created_then_resolved() {
        let mut processor = processor();
        let bytes = encode_envelopes(&[
            created(1),
            StreamEnvelope::PageSelected(PageRef::new(1, 1)),
        ])
        .unwrap();
        let results = processor.handle_bytes(&bytes).unwrap();
        assert_eq!(results[0].as_ref().unwrap(), &ProcessOutcome::ResolutionStarted(1));
        assert_eq!(
            results[1].as_ref().unwrap(),
            &ProcessOutcome::Queued { document_id: 1 }
        );

        let outcomes = processor.process_resolutions();
        assert!(matches!(
            &outcomes[..],
            [ResolutionOutcome::Resolved { document_id: 1, results }] if results.len() == 1
        ));
        assert_eq!(processor.executor().selected_page_number(), Some(1));
    }

    #[test]
    fn test_playback_enqueues_until_tick() {
        let mut processor = processor();
        processor.handle_envelope(created(1)).unwrap();
        processor.process_resolutions();

        for kind in [
            ActionKind::Pen(BrushAction::new(3, Brush::default())),
            ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 1.0)),
            ActionKind::ToolEnd(PenPoint::new(0.4, 0.4, 1.0)),
        ] {
            let outcome = processor.handle_envelope(playback(1, 0, kind)).unwrap();
            assert_eq!(outcome, ProcessOutcome::Dispatched(StreamType::PagePlayback));
        }
        assert_eq!(processor.scheduler().len(), 3);
        assert_eq!(processor.tick().executed, 3);

        let page = processor.executor().document(1).unwrap().page(0).unwrap();
        assert!(page.shape(3).is_some());
    }

    #[test]
    fn test_page_change_flushes_queue() {
        let mut processor = processor();
        processor.handle_envelope(created(1)).unwrap();
        processor.process_resolutions();

        processor
            .handle_envelope(playback(1, 0, ActionKind::Pen(BrushAction::new(1, Brush::default()))))
            .unwrap();
        processor
            .handle_envelope(playback(1, 0, ActionKind::ToolBegin(PenPoint::default())))
            .unwrap();
        processor
            .handle_envelope(playback(1, 0, ActionKind::ToolEnd(PenPoint::new(0.2, 0.2, 1.0))))
            .unwrap();
        processor.handle_envelope(playback(1, 1, ActionKind::Undo)).unwrap();

        assert_eq!(processor.scheduler().len(), 1);
        let document = processor.executor().document(1).unwrap();
        assert_eq!(document.page(0).unwrap().shapes().len(), 1);
        assert_eq!(processor.executor().selected_page_number(), Some(1));
    }

    #[test]
    fn test_speech_returned_to_caller() {
        let mut processor = processor();
        let speech = SpeechPublished {
            publisher_id: "p1".into(),
            display_name: "Ada".into(),
        };
        let outcome = processor
            .handle_envelope(StreamEnvelope::SpeechPublished(speech.clone()))
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Speech(speech));
    }

    #[test]
    fn test_unknown_document_is_executor_error() {
        let mut processor = processor();
        let err = processor
            .handle_envelope(StreamEnvelope::DocumentSelected(DocumentState::new(
                42,
                DocumentType::Pdf,
                "",
            )))
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Executor(ExecutorError::UnknownDocument(42))
        ));
    }

    #[test]
    fn test_unknown_envelope_tag_skipped() {
        let mut processor = processor();
        // bodyLength 3, tag 200, two payload bytes
        let bytes = [0, 0, 0, 3, 200, 1, 2];
        let results = processor.handle_bytes(&bytes).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), &ProcessOutcome::Skipped);
    }

    #[test]
    fn test_broken_framing_is_fatal() {
        let mut processor = processor();
        assert!(matches!(
            processor.handle_bytes(&[0, 0, 0, 0]),
            Err(StreamError::Proto(ProtoError::RecordTooShort { .. }))
        ));
        assert!(processor.handle_bytes(&[0, 0, 0, 9, 1]).is_err());
    }

    #[tokio::test]
    async fn test_handle_reader() {
        let mut processor = processor();
        let bytes = encode_envelopes(&[
            created(5),
            StreamEnvelope::PageCreated(PageRef::new(5, 2)),
        ])
        .unwrap();
        let mut reader = &bytes[..];
        let results = processor.handle_reader(&mut reader).await.unwrap();
        assert_eq!(results.len(), 2);

        let outcome = processor.next_resolution().await.unwrap();
        assert!(matches!(outcome, ResolutionOutcome::Resolved { document_id: 5, .. }));
        assert_eq!(processor.executor().document(5).unwrap().page_count(), 3);
    }

    #[tokio::test]
    async fn test_handle_reader_rejects_partial_prefix() {
        let mut bytes =
            encode_envelopes(&[StreamEnvelope::PageCreated(PageRef::new(5, 2))]).unwrap();
        bytes.extend_from_slice(&[0, 0]);

        let mut reader = &bytes[..];
        let err = processor().handle_reader(&mut reader).await.unwrap_err();
        assert!(
            matches!(err, StreamError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof)
        );
        assert!(processor().handle_bytes(&bytes).is_err());
    }

    #[tokio::test]
    async fn test_handle_reader_rejects_truncated_body() {
        let mut bytes =
            encode_envelopes(&[StreamEnvelope::PageCreated(PageRef::new(5, 2))]).unwrap();
        bytes.pop();

        let mut reader = &bytes[..];
        assert!(matches!(
            processor().handle_reader(&mut reader).await,
            Err(StreamError::Io(_))
        ));
    }
}
