//! `inspect` and `replay` subcommands.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lectern_core::{Document, NullSurface};
use lectern_player::{
    ActionExecutor, LocalExecutor, PlaybackConfig, PlaybackScheduler, TickReport,
};
use lectern_proto::{decode_recording, read_envelope, ByteReader, ProtoError, RecordedPage};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::ReplayConfig;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ProtoError,
    },
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot replay into {requested} pages (allowed: 1..={max})")]
    PageCount { requested: i32, max: i32 },
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Largest whiteboard `replay` will allocate.
pub const MAX_REPLAY_PAGES: i32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub page_number: i32,
    pub timestamp: i32,
    pub static_actions: usize,
    pub playback_actions: usize,
    /// Action counts keyed by type name.
    pub actions: BTreeMap<String, usize>,
}

impl PageSummary {
    fn of(page: &RecordedPage) -> Self {
        let mut actions = BTreeMap::new();
        for action in page.static_actions.iter().chain(&page.playback_actions) {
            *actions
                .entry(format!("{:?}", action.action_type()))
                .or_insert(0) += 1;
        }
        Self {
            page_number: page.page_number,
            timestamp: page.timestamp,
            static_actions: page.static_actions.len(),
            playback_actions: page.playback_actions.len(),
            actions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeSummary {
    pub stream_type: String,
    pub document_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InspectReport {
    Recording {
        pages: Vec<PageSummary>,
        total_actions: usize,
    },
    Stream {
        envelopes: Vec<EnvelopeSummary>,
        /// Envelopes with an unknown tag.
        skipped: usize,
    },
}

impl InspectReport {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Recording {
                pages,
                total_actions,
            } => {
                let _ = writeln!(out, "recording: {} pages, {total_actions} actions", pages.len());
                for page in pages {
                    let _ = writeln!(
                        out,
                        "page {} @ {}ms: {} static, {} playback",
                        page.page_number,
                        page.timestamp,
                        page.static_actions,
                        page.playback_actions
                    );
                    for (name, count) in &page.actions {
                        let _ = writeln!(out, "  {name}: {count}");
                    }
                }
            }
            Self::Stream { envelopes, skipped } => {
                let _ = writeln!(out, "stream: {} envelopes, {skipped} skipped", envelopes.len());
                for envelope in envelopes {
                    match envelope.document_id {
                        Some(id) => {
                            let _ = writeln!(out, "  {} (document {id})", envelope.stream_type);
                        }
                        None => {
                            let _ = writeln!(out, "  {}", envelope.stream_type);
                        }
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageShapes {
    pub page_number: i32,
    pub shapes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub pages: Vec<PageShapes>,
    pub executed: usize,
    pub failed: usize,
    /// Recorded pages outside the replay document.
    pub skipped_pages: usize,
}

impl ReplayReport {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            let _ = writeln!(out, "page {}: {} shapes", page.page_number, page.shapes);
        }
        let _ = writeln!(
            out,
            "applied {} actions, {} failed",
            self.executed, self.failed
        );
        if self.skipped_pages > 0 {
            let _ = writeln!(out, "skipped {} pages out of range", self.skipped_pages);
        }
        out
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_error(path: &Path) -> impl FnOnce(ProtoError) -> CliError + '_ {
    move |source| CliError::Decode {
        path: path.to_path_buf(),
        source,
    }
}

/// Summarizes a recording file, or a captured envelope stream.
pub fn inspect(
    path: &Path,
    stream: bool,
    config: &ReplayConfig,
) -> Result<InspectReport, CliError> {
    let bytes = read_file(path)?;
    debug!("Inspecting {} ({} bytes)", path.display(), bytes.len());

    if !stream {
        let pages = decode_recording(&bytes).map_err(decode_error(path))?;
        let summaries: Vec<_> = pages.iter().map(PageSummary::of).collect();
        let total_actions = pages.iter().map(RecordedPage::action_count).sum();
        return Ok(InspectReport::Recording {
            pages: summaries,
            total_actions,
        });
    }

    let mut reader = ByteReader::new(&bytes);
    let mut envelopes = Vec::new();
    let mut skipped = 0;
    while reader.has_remaining() {
        match read_envelope(&mut reader, config.stream.max_record_bytes)
            .map_err(decode_error(path))?
        {
            Some(envelope) => envelopes.push(EnvelopeSummary {
                stream_type: format!("{:?}", envelope.stream_type()),
                document_id: envelope.document_id(),
            }),
            None => skipped += 1,
        }
    }
    Ok(InspectReport::Stream { envelopes, skipped })
}

/// Replays a recording into a blank whiteboard through the local executor.
///
/// `page_count` defaults to one past the highest recorded page number and
/// must lie within `1..=MAX_REPLAY_PAGES`.
pub fn replay(
    path: &Path,
    page_count: Option<i32>,
    playback: PlaybackConfig,
) -> Result<ReplayReport, CliError> {
    let bytes = read_file(path)?;
    let pages = decode_recording(&bytes).map_err(decode_error(path))?;
    let page_count = page_count.unwrap_or_else(|| {
        pages
            .iter()
            .map(|page| page.page_number.saturating_add(1))
            .max()
            .unwrap_or(1)
            .max(1)
    });
    if !(1..=MAX_REPLAY_PAGES).contains(&page_count) {
        return Err(CliError::PageCount {
            requested: page_count,
            max: MAX_REPLAY_PAGES,
        });
    }
    info!("Replaying {} recorded pages into {page_count} pages", pages.len());

    let executor = LocalExecutor::new(Document::whiteboard(1, page_count), Box::new(NullSurface));
    let mut scheduler = PlaybackScheduler::new(executor, playback);
    scheduler.start();

    let mut totals = TickReport::default();
    let mut skipped_pages = 0;
    for page in &pages {
        if let Err(e) = scheduler.executor_mut().set_page_number(page.page_number) {
            warn!("Skipping recorded page: {e}");
            skipped_pages += 1;
            continue;
        }
        for action in page.static_actions.iter().chain(&page.playback_actions) {
            scheduler.add_action(action.clone());
        }
        totals.merge(scheduler.flush());
    }

    let document = scheduler.into_executor().into_document();
    let pages = document
        .pages()
        .iter()
        .map(|page| PageShapes {
            page_number: page.number(),
            shapes: page.shapes().len(),
        })
        .collect();
    Ok(ReplayReport {
        pages,
        executed: totals.executed,
        failed: totals.failed,
        skipped_pages,
    })
}
