use thiserror::Error;

use crate::cursor::CursorError;

/// Structural failure while encoding or decoding a record.
///
/// Unknown type tags are not errors; they surface as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error("negative {field}: {value}")]
    NegativeLength { field: &'static str, value: i32 },
    #[error("{field} of {len} bytes exceeds the i32 length range")]
    LengthOverflow { field: &'static str, len: usize },
    #[error("invalid {field} value {value}")]
    InvalidValue { field: &'static str, value: i64 },
    #[error("record body length {len} is shorter than its {min}-byte prefix")]
    RecordTooShort { len: i32, min: i32 },
    #[error("record body length {len} exceeds limit of {max} bytes")]
    RecordTooLarge { len: usize, max: usize },
    #[error("{kind} tag {tag} declared {declared} body bytes but decoded {consumed}")]
    LengthMismatch {
        kind: &'static str,
        tag: u8,
        declared: usize,
        consumed: usize,
    },
}

pub type ProtoResult<T> = Result<T, ProtoError>;

/// Reads an `i32` length field and rejects negative values.
pub(crate) fn read_len(
    reader: &mut crate::cursor::ByteReader<'_>,
    field: &'static str,
) -> ProtoResult<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value).map_err(|_| ProtoError::NegativeLength { field, value })
}

/// Converts a byte length to the wire's `i32` length type.
pub(crate) fn wire_len(len: usize, field: &'static str) -> ProtoResult<i32> {
    i32::try_from(len).map_err(|_| ProtoError::LengthOverflow { field, len })
}
