//! Recorded-page codec.
//!
//! ```text
//! ┌────────┬───────────┬────────────┬────────────────┬──────────────┬──────────────────┐
//! │ page   │ timestamp │ static len │ static records │ playback len │ playback records │
//! │ i32    │ i32       │ i32        │ ...            │ i32          │ ...              │
//! └────────┴───────────┴────────────┴────────────────┴──────────────┴──────────────────┘
//! ```
//!
//! A stored recording is a plain concatenation of pages.

use serde::{Deserialize, Serialize};

use crate::action::{read_action_record, write_action_record, Action, ACTION_RECORD_PREFIX_LEN};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{read_len, wire_len, ProtoResult};

/// Framing bytes of one action record in front of its payload.
const RECORD_OVERHEAD: usize = 4 + ACTION_RECORD_PREFIX_LEN;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordedPage {
    pub page_number: i32,
    pub timestamp: i32,
    /// Actions establishing the page state on entry.
    pub static_actions: Vec<Action>,
    /// Actions replayed with their relative timing.
    pub playback_actions: Vec<Action>,
}

impl RecordedPage {
    pub fn new(page_number: i32, timestamp: i32) -> Self {
        Self {
            page_number,
            timestamp,
            ..Self::default()
        }
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> ProtoResult<Self> {
        let page_number = reader.read_i32()?;
        let timestamp = reader.read_i32()?;
        let static_actions = decode_region(reader, "static region length")?;
        let playback_actions = decode_region(reader, "playback region length")?;
        Ok(Self {
            page_number,
            timestamp,
            static_actions,
            playback_actions,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> ProtoResult<Self> {
        Self::decode(&mut ByteReader::new(bytes))
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> ProtoResult<()> {
        writer.put_i32(self.page_number);
        writer.put_i32(self.timestamp);
        encode_region(writer, &self.static_actions, "static region length")?;
        encode_region(writer, &self.playback_actions, "playback region length")
    }

    pub fn to_bytes(&self) -> ProtoResult<Vec<u8>> {
        let mut writer = ByteWriter::with_capacity(self.encoded_len());
        self.encode(&mut writer)?;
        Ok(writer.into_inner())
    }

    pub fn encoded_len(&self) -> usize {
        16 + region_len(&self.static_actions) + region_len(&self.playback_actions)
    }

    pub fn action_count(&self) -> usize {
        self.static_actions.len() + self.playback_actions.len()
    }
}

fn region_len(actions: &[Action]) -> usize {
    actions
        .iter()
        .map(|a| RECORD_OVERHEAD + a.encoded_len())
        .sum()
}

fn decode_region(reader: &mut ByteReader<'_>, field: &'static str) -> ProtoResult<Vec<Action>> {
    let len = read_len(reader, field)?;
    let mut region = reader.sub_reader(len)?;
    let mut actions = Vec::new();
    while region.has_remaining() {
        if let Some(action) = read_action_record(&mut region)? {
            actions.push(action);
        }
    }
    Ok(actions)
}

fn encode_region(
    writer: &mut ByteWriter,
    actions: &[Action],
    field: &'static str,
) -> ProtoResult<()> {
    writer.put_i32(wire_len(region_len(actions), field)?);
    for action in actions {
        write_action_record(writer, action)?;
    }
    Ok(())
}

/// Decodes every page of a stored recording.
pub fn decode_recording(bytes: &[u8]) -> ProtoResult<Vec<RecordedPage>> {
    let mut reader = ByteReader::new(bytes);
    let mut pages = Vec::new();
    while reader.has_remaining() {
        pages.push(RecordedPage::decode(&mut reader)?);
    }
    Ok(pages)
}

pub fn encode_recording(pages: &[RecordedPage]) -> ProtoResult<Vec<u8>> {
    let capacity = pages.iter().map(RecordedPage::encoded_len).sum();
    let mut writer = ByteWriter::with_capacity(capacity);
    for page in pages {
        page.encode(&mut writer)?;
    }
    Ok(writer.into_inner())
}
