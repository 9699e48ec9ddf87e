//! Tag → decoder dispatch and the action record framing.
//!
//! ```text
//! record := bodyLength:i32  typeTag:i8  timestamp:i32  payload(bodyLength - 5)
//! ```

use log::debug;

use super::codec::{decode_payload, encode_payload};
use super::{Action, ActionType};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{wire_len, ProtoError, ProtoResult};

/// Bytes of the record body taken by the tag and the timestamp.
pub const ACTION_RECORD_PREFIX_LEN: usize = 5;

/// Decodes one action whose tag and timestamp the caller already read.
///
/// Returns `Ok(None)` for a tag outside the catalogue without consuming
/// anything; the caller skips `body_len` bytes itself. A known action must
/// consume exactly `body_len` bytes.
pub fn parse(
    reader: &mut ByteReader<'_>,
    tag: u8,
    timestamp: i32,
    body_len: usize,
) -> ProtoResult<Option<Action>> {
    let Some(ty) = ActionType::from_tag(tag) else {
        return Ok(None);
    };
    let mut body = reader.sub_reader(body_len)?;
    let (key_event, kind) = decode_payload(ty, &mut body)?;
    if body.has_remaining() {
        return Err(ProtoError::LengthMismatch {
            kind: "action",
            tag,
            declared: body_len,
            consumed: body.position(),
        });
    }
    Ok(Some(Action {
        timestamp,
        key_event,
        kind,
    }))
}

/// Reads one framed action record; unknown tags are skipped.
pub fn read_action_record(reader: &mut ByteReader<'_>) -> ProtoResult<Option<Action>> {
    let body_len = reader.read_i32()?;
    let payload_len = usize::try_from(body_len)
        .ok()
        .and_then(|len| len.checked_sub(ACTION_RECORD_PREFIX_LEN))
        .ok_or(ProtoError::RecordTooShort {
            len: body_len,
            min: ACTION_RECORD_PREFIX_LEN as i32,
        })?;
    let tag = reader.read_u8()?;
    let timestamp = reader.read_i32()?;

    match parse(reader, tag, timestamp, payload_len)? {
        Some(action) => Ok(Some(action)),
        None => {
            debug!("Skipping unknown action tag {tag} ({payload_len} bytes)");
            reader.skip(payload_len)?;
            Ok(None)
        }
    }
}

/// Writes `action` as a framed record.
pub fn write_action_record(writer: &mut ByteWriter, action: &Action) -> ProtoResult<()> {
    let body_len = wire_len(
        ACTION_RECORD_PREFIX_LEN + action.encoded_len(),
        "action record",
    )?;
    writer.put_i32(body_len);
    writer.put_u8(action.action_type().tag());
    writer.put_i32(action.timestamp);
    encode_payload(action, writer)
}
