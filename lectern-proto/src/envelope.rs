//! Stream envelopes carried by a live session transport.
//!
//! ```text
//! envelope := bodyLength:i32  typeTag:i8  payload(bodyLength - 1)
//!
//! DocumentCreated/Closed/Selected  docId:u64 type:i8 titleLen fileLen checksumLen title file checksum
//! PageCreated/Deleted/Selected     docId:u64 page:i32
//! SpeechPublished                  pubLen:i32 pub nameLen:i32 name
//! PagePlayback                     docId:u64 page:i32 <action record>
//! PageActions                      docId:u64 entryLen:i32 <recorded page>
//! ```

use lectern_core::{DocumentState, DocumentType};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::action::{
    put_prefixed_str, read_action_record, read_prefixed_str, write_action_record, Action,
};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{read_len, wire_len, ProtoError, ProtoResult};
use crate::page::RecordedPage;

/// Upper bound on a single envelope body unless configured otherwise.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

/// Bytes of the length field in front of every envelope.
pub const ENVELOPE_LEN_PREFIX: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StreamType {
    DocumentCreated = 0,
    DocumentClosed = 1,
    DocumentSelected = 2,
    PageCreated = 3,
    PageDeleted = 4,
    PageSelected = 5,
    SpeechPublished = 6,
    PagePlayback = 7,
    PageActions = 8,
}

impl StreamType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::DocumentCreated),
            1 => Some(Self::DocumentClosed),
            2 => Some(Self::DocumentSelected),
            3 => Some(Self::PageCreated),
            4 => Some(Self::PageDeleted),
            5 => Some(Self::PageSelected),
            6 => Some(Self::SpeechPublished),
            7 => Some(Self::PagePlayback),
            8 => Some(Self::PageActions),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub document_id: u64,
    pub page_number: i32,
}

impl PageRef {
    pub fn new(document_id: u64, page_number: i32) -> Self {
        Self {
            document_id,
            page_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeechPublished {
    pub publisher_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEnvelope {
    DocumentCreated(DocumentState),
    DocumentClosed(DocumentState),
    DocumentSelected(DocumentState),
    PageCreated(PageRef),
    PageDeleted(PageRef),
    PageSelected(PageRef),
    SpeechPublished(SpeechPublished),
    PagePlayback {
        document_id: u64,
        page_number: i32,
        action: Action,
    },
    PageActions {
        document_id: u64,
        page: RecordedPage,
    },
}

impl StreamEnvelope {
    pub fn stream_type(&self) -> StreamType {
        match self {
            Self::DocumentCreated(_) => StreamType::DocumentCreated,
            Self::DocumentClosed(_) => StreamType::DocumentClosed,
            Self::DocumentSelected(_) => StreamType::DocumentSelected,
            Self::PageCreated(_) => StreamType::PageCreated,
            Self::PageDeleted(_) => StreamType::PageDeleted,
            Self::PageSelected(_) => StreamType::PageSelected,
            Self::SpeechPublished(_) => StreamType::SpeechPublished,
            Self::PagePlayback { .. } => StreamType::PagePlayback,
            Self::PageActions { .. } => StreamType::PageActions,
        }
    }

    /// Document the envelope refers to; speech envelopes carry none.
    pub fn document_id(&self) -> Option<u64> {
        match self {
            Self::DocumentCreated(state)
            | Self::DocumentClosed(state)
            | Self::DocumentSelected(state) => Some(state.document_id),
            Self::PageCreated(page) | Self::PageDeleted(page) | Self::PageSelected(page) => {
                Some(page.document_id)
            }
            Self::SpeechPublished(_) => None,
            Self::PagePlayback { document_id, .. } | Self::PageActions { document_id, .. } => {
                Some(*document_id)
            }
        }
    }

    /// Writes the framed envelope, patching the body length afterwards.
    pub fn encode(&self, writer: &mut ByteWriter) -> ProtoResult<()> {
        let start = writer.len();
        writer.put_i32(0);
        writer.put_u8(self.stream_type().tag());
        match self {
            Self::DocumentCreated(state)
            | Self::DocumentClosed(state)
            | Self::DocumentSelected(state) => put_document_state(writer, state)?,
            Self::PageCreated(page) | Self::PageDeleted(page) | Self::PageSelected(page) => {
                writer.put_u64(page.document_id);
                writer.put_i32(page.page_number);
            }
            Self::SpeechPublished(speech) => {
                put_prefixed_str(writer, &speech.publisher_id, "publisher length")?;
                put_prefixed_str(writer, &speech.display_name, "display name length")?;
            }
            Self::PagePlayback {
                document_id,
                page_number,
                action,
            } => {
                writer.put_u64(*document_id);
                writer.put_i32(*page_number);
                write_action_record(writer, action)?;
            }
            Self::PageActions { document_id, page } => {
                writer.put_u64(*document_id);
                writer.put_i32(wire_len(page.encoded_len(), "page entry length")?);
                page.encode(writer)?;
            }
        }
        let body_len = writer.len() - start - ENVELOPE_LEN_PREFIX;
        writer.patch_i32(start, wire_len(body_len, "envelope body")?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> ProtoResult<Vec<u8>> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.into_inner())
    }
}

/// Validates a declared envelope body length against the size limit.
pub fn check_body_len(len: i32, max_record_bytes: usize) -> ProtoResult<usize> {
    let body_len = usize::try_from(len)
        .ok()
        .filter(|len| *len >= 1)
        .ok_or(ProtoError::RecordTooShort { len, min: 1 })?;
    if body_len > max_record_bytes {
        return Err(ProtoError::RecordTooLarge {
            len: body_len,
            max: max_record_bytes,
        });
    }
    Ok(body_len)
}

/// Decodes an envelope body (type tag plus payload).
///
/// Returns `Ok(None)` for an unknown envelope tag, or for a playback
/// envelope whose action tag is unknown.
pub fn decode_envelope_body(body: &[u8]) -> ProtoResult<Option<StreamEnvelope>> {
    let mut reader = ByteReader::new(body);
    let tag = reader.read_u8()?;
    let Some(ty) = StreamType::from_tag(tag) else {
        debug!("Skipping unknown envelope tag {tag} ({} bytes)", body.len());
        return Ok(None);
    };

    let envelope = match ty {
        StreamType::DocumentCreated => {
            Some(StreamEnvelope::DocumentCreated(read_document_state(&mut reader)?))
        }
        StreamType::DocumentClosed => {
            Some(StreamEnvelope::DocumentClosed(read_document_state(&mut reader)?))
        }
        StreamType::DocumentSelected => {
            Some(StreamEnvelope::DocumentSelected(read_document_state(&mut reader)?))
        }
        StreamType::PageCreated => Some(StreamEnvelope::PageCreated(read_page_ref(&mut reader)?)),
        StreamType::PageDeleted => Some(StreamEnvelope::PageDeleted(read_page_ref(&mut reader)?)),
        StreamType::PageSelected => {
            Some(StreamEnvelope::PageSelected(read_page_ref(&mut reader)?))
        }
        StreamType::SpeechPublished => {
            let publisher_id = read_prefixed_str(&mut reader, "publisher length")?;
            let display_name = read_prefixed_str(&mut reader, "display name length")?;
            Some(StreamEnvelope::SpeechPublished(SpeechPublished {
                publisher_id,
                display_name,
            }))
        }
        StreamType::PagePlayback => {
            let document_id = reader.read_u64()?;
            let page_number = reader.read_i32()?;
            read_action_record(&mut reader)?.map(|action| StreamEnvelope::PagePlayback {
                document_id,
                page_number,
                action,
            })
        }
        StreamType::PageActions => {
            let document_id = reader.read_u64()?;
            let entry_len = read_len(&mut reader, "page entry length")?;
            let mut entry = reader.sub_reader(entry_len)?;
            let page = RecordedPage::decode(&mut entry)?;
            if entry.has_remaining() {
                return Err(mismatch(tag, entry_len, entry.position()));
            }
            Some(StreamEnvelope::PageActions { document_id, page })
        }
    };

    if reader.has_remaining() {
        return Err(mismatch(tag, body.len(), reader.position()));
    }
    Ok(envelope)
}

/// Reads one framed envelope, rejecting bodies above `max_record_bytes`.
pub fn read_envelope(
    reader: &mut ByteReader<'_>,
    max_record_bytes: usize,
) -> ProtoResult<Option<StreamEnvelope>> {
    let body_len = check_body_len(reader.read_i32()?, max_record_bytes)?;
    let body = reader.read_bytes(body_len)?;
    decode_envelope_body(body)
}

/// Decodes every envelope in `bytes`, dropping unknown ones.
pub fn decode_envelopes(bytes: &[u8]) -> ProtoResult<Vec<StreamEnvelope>> {
    let mut reader = ByteReader::new(bytes);
    let mut envelopes = Vec::new();
    while reader.has_remaining() {
        if let Some(envelope) = read_envelope(&mut reader, DEFAULT_MAX_RECORD_BYTES)? {
            envelopes.push(envelope);
        }
    }
    Ok(envelopes)
}

pub fn encode_envelopes(envelopes: &[StreamEnvelope]) -> ProtoResult<Vec<u8>> {
    let mut writer = ByteWriter::new();
    for envelope in envelopes {
        envelope.encode(&mut writer)?;
    }
    Ok(writer.into_inner())
}

fn mismatch(tag: u8, declared: usize, consumed: usize) -> ProtoError {
    ProtoError::LengthMismatch {
        kind: "envelope",
        tag,
        declared,
        consumed,
    }
}

fn put_document_state(writer: &mut ByteWriter, state: &DocumentState) -> ProtoResult<()> {
    writer.put_u64(state.document_id);
    writer.put_u8(state.doc_type as u8);
    writer.put_i32(wire_len(state.title.len(), "title length")?);
    writer.put_i32(wire_len(state.file.len(), "file length")?);
    writer.put_i32(wire_len(state.checksum.len(), "checksum length")?);
    writer.put_bytes(state.title.as_bytes());
    writer.put_bytes(state.file.as_bytes());
    writer.put_bytes(state.checksum.as_bytes());
    Ok(())
}

fn read_document_state(reader: &mut ByteReader<'_>) -> ProtoResult<DocumentState> {
    let document_id = reader.read_u64()?;
    let raw_type = reader.read_u8()?;
    let doc_type = DocumentType::from_u8(raw_type).ok_or(ProtoError::InvalidValue {
        field: "document type",
        value: i64::from(raw_type),
    })?;
    let title_len = read_len(reader, "title length")?;
    let file_len = read_len(reader, "file length")?;
    let checksum_len = read_len(reader, "checksum length")?;
    Ok(DocumentState {
        document_id,
        doc_type,
        title: reader.read_utf8(title_len)?,
        file: reader.read_utf8(file_len)?,
        checksum: reader.read_utf8(checksum_len)?,
    })
}

fn read_page_ref(reader: &mut ByteReader<'_>) -> ProtoResult<PageRef> {
    Ok(PageRef {
        document_id: reader.read_u64()?,
        page_number: reader.read_i32()?,
    })
}
