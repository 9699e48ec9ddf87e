//! Bounds-checked, position-advancing views over byte buffers.
//!
//! Every multi-byte value is big-endian unless a `_with` variant is called
//! with [`ByteOrder::LittleEndian`]. Reads never truncate: a read or skip
//! that would pass the end of the buffer fails and leaves the offset
//! untouched.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("read of {requested} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        len: usize,
    },
    #[error("invalid UTF-8 in {len}-byte string at offset {offset}")]
    InvalidUtf8 { offset: usize, len: usize },
    #[error("string of {len} bytes does not fit a {max_len}-byte field")]
    StringTooLong { len: usize, max_len: usize },
}

macro_rules! read_number {
    ($($name:ident, $name_with:ident => $ty:ty;)*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty, CursorError> {
                self.$name_with(ByteOrder::BigEndian)
            }

            pub fn $name_with(&mut self, order: ByteOrder) -> Result<$ty, CursorError> {
                let bytes = self.read_array::<{ std::mem::size_of::<$ty>() }>()?;
                Ok(match order {
                    ByteOrder::BigEndian => <$ty>::from_be_bytes(bytes),
                    ByteOrder::LittleEndian => <$ty>::from_le_bytes(bytes),
                })
            }
        )*
    };
}

macro_rules! put_number {
    ($($name:ident, $name_with:ident => $ty:ty;)*) => {
        $(
            pub fn $name(&mut self, value: $ty) {
                self.$name_with(value, ByteOrder::BigEndian)
            }

            pub fn $name_with(&mut self, value: $ty, order: ByteOrder) {
                match order {
                    ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
                    ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
                }
            }
        )*
    };
}

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn has_remaining(&self) -> bool {
        self.offset < self.buf.len()
    }

    /// Moves to an absolute offset; the end of the buffer is a valid target.
    pub fn seek(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.buf.len() {
            return Err(CursorError::OutOfBounds {
                offset,
                requested: 0,
                len: self.buf.len(),
            });
        }
        self.offset = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<(), CursorError> {
        self.take(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        self.take(len)
    }

    /// Child cursor over the next `len` bytes; the parent moves past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, CursorError> {
        self.take(len).map(ByteReader::new)
    }

    read_number! {
        read_i16, read_i16_with => i16;
        read_u16, read_u16_with => u16;
        read_i32, read_i32_with => i32;
        read_u32, read_u32_with => u32;
        read_i64, read_i64_with => i64;
        read_u64, read_u64_with => u64;
        read_f32, read_f32_with => f32;
        read_f64, read_f64_with => f64;
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    /// Fixed-width string field: consumes exactly `max_len` bytes and ends
    /// the string at the first zero byte.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, CursorError> {
        let start = self.offset;
        let field = self.take(max_len)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        decode_utf8(&field[..end], start)
    }

    /// Exactly `len` bytes of UTF-8, zero bytes included.
    pub fn read_utf8(&mut self, len: usize) -> Result<String, CursorError> {
        let start = self.offset;
        let bytes = self.take(len)?;
        decode_utf8(bytes, start)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(CursorError::OutOfBounds {
                offset: self.offset,
                requested: len,
                len: self.buf.len(),
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }
}

fn decode_utf8(bytes: &[u8], offset: usize) -> Result<String, CursorError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| CursorError::InvalidUtf8 {
            offset,
            len: bytes.len(),
        })
}

/// Append-only write cursor; the exact mirror of [`ByteReader`].
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    put_number! {
        put_i16, put_i16_with => i16;
        put_u16, put_u16_with => u16;
        put_i32, put_i32_with => i32;
        put_u32, put_u32_with => u32;
        put_i64, put_i64_with => i64;
        put_u64, put_u64_with => u64;
        put_f32, put_f32_with => f32;
        put_f64, put_f64_with => f64;
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Zero-padded fixed-width string field.
    pub fn put_string(&mut self, value: &str, max_len: usize) -> Result<(), CursorError> {
        let bytes = value.as_bytes();
        if bytes.len() > max_len {
            return Err(CursorError::StringTooLong {
                len: bytes.len(),
                max_len,
            });
        }
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + (max_len - bytes.len()), 0);
        Ok(())
    }

    /// Overwrites a previously written big-endian `i32` (length back-fill).
    pub fn patch_i32(&mut self, at: usize, value: i32) -> Result<(), CursorError> {
        let len = self.buf.len();
        let slot = at
            .checked_add(4)
            .filter(|end| *end <= len)
            .map(|end| &mut self.buf[at..end])
            .ok_or(CursorError::OutOfBounds {
                offset: at,
                requested: 4,
                len,
            })?;
        slot.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian_by_default() {
        let bytes = [0x00, 0x00, 0x01, 0x02, 0xFF];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), 0x0102);
        assert_eq!(reader.read_i8().unwrap(), -1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_little_endian_per_call() {
        let bytes = [0x02, 0x01, 0x02, 0x01];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u16_with(ByteOrder::LittleEndian).unwrap(), 0x0102);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_read_to_exact_end_succeeds() {
        let bytes = [0u8; 8];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_f64().unwrap(), 0.0);
        assert!(!reader.has_remaining());
    }

    #[test]
    fn test_read_past_end_fails_without_advancing() {
        let bytes = [1u8, 2, 3];
        let mut reader = ByteReader::new(&bytes);
        reader.skip(2).unwrap();
        let err = reader.read_u16().unwrap_err();
        assert_eq!(
            err,
            CursorError::OutOfBounds {
                offset: 2,
                requested: 2,
                len: 3
            }
        );
        assert_eq!(reader.position(), 2);
        assert!(reader.skip(2).is_err());
        assert_eq!(reader.read_u8().unwrap(), 3);
    }

    #[test]
    fn test_every_width_fails_one_byte_short() {
        for width in [1usize, 2, 4, 8] {
            let bytes = vec![0u8; width - 1];
            let mut reader = ByteReader::new(&bytes);
            let result = match width {
                1 => reader.read_u8().map(|_| ()),
                2 => reader.read_i16().map(|_| ()),
                4 => reader.read_f32().map(|_| ()),
                _ => reader.read_i64().map(|_| ()),
            };
            assert!(
                matches!(result, Err(CursorError::OutOfBounds { .. })),
                "width {width} should fail"
            );
        }
    }

    #[test]
    fn test_fixed_string_stops_at_zero() {
        let mut writer = ByteWriter::new();
        writer.put_string("abc", 6).unwrap();
        writer.put_u8(9);
        let bytes = writer.into_inner();
        assert_eq!(bytes, vec![b'a', b'b', b'c', 0, 0, 0, 9]);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_string(6).unwrap(), "abc");
        assert_eq!(reader.read_u8().unwrap(), 9);
    }

    #[test]
    fn test_fixed_string_without_terminator() {
        let bytes = b"hello";
        let mut reader = ByteReader::new(bytes);
        assert_eq!(reader.read_string(5).unwrap(), "hello");
    }

    #[test]
    fn test_put_string_rejects_overflow() {
        let mut writer = ByteWriter::new();
        assert!(matches!(
            writer.put_string("toolong", 3),
            Err(CursorError::StringTooLong { len: 7, max_len: 3 })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [0xC3, 0x28];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            reader.read_utf8(2).unwrap_err(),
            CursorError::InvalidUtf8 { offset: 0, len: 2 }
        );
    }

    #[test]
    fn test_sub_reader_is_bounded() {
        let bytes = [1u8, 2, 3, 4];
        let mut reader = ByteReader::new(&bytes);
        let mut child = reader.sub_reader(2).unwrap();
        assert_eq!(reader.position(), 2);
        assert_eq!(child.read_u16().unwrap(), 0x0102);
        assert!(child.read_u8().is_err());
        assert!(reader.sub_reader(3).is_err());
    }

    #[test]
    fn test_seek_bounds() {
        let bytes = [0u8; 4];
        let mut reader = ByteReader::new(&bytes);
        assert!(reader.seek(4).is_ok());
        assert!(reader.seek(5).is_err());
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_writer_mirrors_reader() {
        let mut writer = ByteWriter::new();
        writer.put_i64(-5);
        writer.put_u64_with(7, ByteOrder::LittleEndian);
        writer.put_f32(1.5);
        let bytes = writer.into_inner();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_i64().unwrap(), -5);
        assert_eq!(reader.read_u64_with(ByteOrder::LittleEndian).unwrap(), 7);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn test_patch_i32() {
        let mut writer = ByteWriter::new();
        writer.put_i32(0);
        writer.put_u8(1);
        writer.patch_i32(0, 42).unwrap();
        assert!(writer.patch_i32(2, 1).is_err());
        assert_eq!(writer.as_slice(), &[0, 0, 0, 42, 1]);
    }
}
