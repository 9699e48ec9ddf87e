//! Per-variant payload encode/decode.
//!
//! Decoding is the exact byte-reverse of encoding, so every helper pair
//! below reads the same fields in the same order it writes them.

use lectern_core::{
    Brush, Color, FontPosture, FontWeight, KeyEvent, KeyPhase, LatexFont, LineCap, Modifiers,
    PenPoint, Point, Rect, TextFont,
};

use super::{Action, ActionKind, ActionType, BrushAction};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{read_len, wire_len, ProtoError, ProtoResult};

pub const HEADER_LEN: usize = 4;
/// `keyCode i32, modifiers i32, phase i32`.
pub const KEY_EVENT_LEN: usize = 12;

const KEY_EVENT_FLAG: i32 = 1;
const BRUSH_LEN: usize = 4 + 4 + 1 + 8;
const PEN_POINT_LEN: usize = 12;
const RECT_LEN: usize = 32;

/// Writes header, optional key event and body of `action`.
pub fn encode_payload(action: &Action, writer: &mut ByteWriter) -> ProtoResult<()> {
    match &action.key_event {
        Some(key) => {
            writer.put_i32(KEY_EVENT_FLAG);
            writer.put_i32(key.key_code as i32);
            writer.put_i32(key.modifiers.bits() as i32);
            writer.put_i32(key.phase as i32);
        }
        None => writer.put_i32(0),
    }
    encode_body(&action.kind, writer)
}

/// Reads header, optional key event and body for a known action type.
pub fn decode_payload(
    ty: ActionType,
    reader: &mut ByteReader<'_>,
) -> ProtoResult<(Option<KeyEvent>, ActionKind)> {
    let header = reader.read_i32()?;
    let key_event = if header & KEY_EVENT_FLAG != 0 {
        Some(read_key_event(reader)?)
    } else {
        None
    };
    let kind = decode_body(ty, reader)?;
    Ok((key_event, kind))
}

pub(super) fn payload_len(action: &Action) -> usize {
    let key = if action.key_event.is_some() {
        KEY_EVENT_LEN
    } else {
        0
    };
    HEADER_LEN + key + body_len(&action.kind)
}

fn body_len(kind: &ActionKind) -> usize {
    match kind {
        ActionKind::Pen(_)
        | ActionKind::Highlighter(_)
        | ActionKind::Pointer(_)
        | ActionKind::Arrow(_)
        | ActionKind::Line(_)
        | ActionKind::Rectangle(_)
        | ActionKind::Ellipse(_)
        | ActionKind::Zoom(_) => BRUSH_LEN,
        ActionKind::Text { .. } | ActionKind::TextRemove { .. } | ActionKind::Latex { .. } => 4,
        ActionKind::TextChange { text, .. } => 4 + 4 + text.len(),
        ActionKind::TextFontChange { font, .. } => 4 + 4 + font.family.len() + 8 + 4,
        ActionKind::TextMove { .. } => 4 + 16,
        ActionKind::TextHighlight { rects, .. } => 4 + 4 + rects.len() * RECT_LEN,
        ActionKind::LatexFontChange { .. } => 4 + 16,
        ActionKind::ExtendView(_) => RECT_LEN,
        ActionKind::ToolBegin(_) | ActionKind::ToolExecute(_) | ActionKind::ToolEnd(_) => {
            PEN_POINT_LEN
        }
        ActionKind::Clone
        | ActionKind::Select
        | ActionKind::SelectGroup
        | ActionKind::Undo
        | ActionKind::Redo
        | ActionKind::ClearShapes
        | ActionKind::Panning
        | ActionKind::ZoomOut
        | ActionKind::Rubber
        | ActionKind::Key => 0,
    }
}

fn encode_body(kind: &ActionKind, w: &mut ByteWriter) -> ProtoResult<()> {
    match kind {
        ActionKind::Pen(b)
        | ActionKind::Highlighter(b)
        | ActionKind::Pointer(b)
        | ActionKind::Arrow(b)
        | ActionKind::Line(b)
        | ActionKind::Rectangle(b)
        | ActionKind::Ellipse(b)
        | ActionKind::Zoom(b) => put_brush(w, b),
        ActionKind::Text { handle }
        | ActionKind::TextRemove { handle }
        | ActionKind::Latex { handle } => w.put_i32(*handle),
        ActionKind::TextChange { handle, text } => {
            w.put_i32(*handle);
            put_prefixed_str(w, text, "text length")?;
        }
        ActionKind::TextFontChange { handle, font } => {
            w.put_i32(*handle);
            put_prefixed_str(w, &font.family, "font family length")?;
            w.put_f64(font.size);
            w.put_u8(font.posture as u8);
            w.put_u8(font.weight as u8);
            w.put_u8(u8::from(font.strikethrough));
            w.put_u8(u8::from(font.underline));
        }
        ActionKind::TextMove { handle, position } => {
            w.put_i32(*handle);
            w.put_f64(position.x);
            w.put_f64(position.y);
        }
        ActionKind::TextHighlight { handle, rects } => {
            w.put_i32(*handle);
            w.put_i32(wire_len(rects.len(), "highlight count")?);
            for rect in rects {
                put_rect(w, rect);
            }
        }
        ActionKind::LatexFontChange { handle, font } => {
            w.put_i32(*handle);
            w.put_i32(font.font_type);
            w.put_f32(font.size);
            w.put_u32(font.color.to_packed());
            w.put_i32(font.style);
        }
        ActionKind::ExtendView(rect) => put_rect(w, rect),
        ActionKind::ToolBegin(p) | ActionKind::ToolExecute(p) | ActionKind::ToolEnd(p) => {
            w.put_f32(p.x);
            w.put_f32(p.y);
            w.put_f32(p.pressure);
        }
        ActionKind::Clone
        | ActionKind::Select
        | ActionKind::SelectGroup
        | ActionKind::Undo
        | ActionKind::Redo
        | ActionKind::ClearShapes
        | ActionKind::Panning
        | ActionKind::ZoomOut
        | ActionKind::Rubber
        | ActionKind::Key => {}
    }
    Ok(())
}

fn decode_body(ty: ActionType, r: &mut ByteReader<'_>) -> ProtoResult<ActionKind> {
    let kind = match ty {
        ActionType::Pen => ActionKind::Pen(read_brush(r)?),
        ActionType::Highlighter => ActionKind::Highlighter(read_brush(r)?),
        ActionType::Pointer => ActionKind::Pointer(read_brush(r)?),
        ActionType::Arrow => ActionKind::Arrow(read_brush(r)?),
        ActionType::Line => ActionKind::Line(read_brush(r)?),
        ActionType::Rectangle => ActionKind::Rectangle(read_brush(r)?),
        ActionType::Ellipse => ActionKind::Ellipse(read_brush(r)?),
        ActionType::Zoom => ActionKind::Zoom(read_brush(r)?),
        ActionType::Text => ActionKind::Text {
            handle: r.read_i32()?,
        },
        ActionType::TextRemove => ActionKind::TextRemove {
            handle: r.read_i32()?,
        },
        ActionType::Latex => ActionKind::Latex {
            handle: r.read_i32()?,
        },
        ActionType::TextChange => {
            let handle = r.read_i32()?;
            let text = read_prefixed_str(r, "text length")?;
            ActionKind::TextChange { handle, text }
        }
        ActionType::TextFontChange => {
            let handle = r.read_i32()?;
            let family = read_prefixed_str(r, "font family length")?;
            let size = r.read_f64()?;
            let posture = read_enum(r, "font posture", FontPosture::from_u8)?;
            let weight = read_enum(r, "font weight", FontWeight::from_u8)?;
            let strikethrough = r.read_u8()? != 0;
            let underline = r.read_u8()? != 0;
            ActionKind::TextFontChange {
                handle,
                font: TextFont {
                    family,
                    size,
                    posture,
                    weight,
                    strikethrough,
                    underline,
                },
            }
        }
        ActionType::TextMove => {
            let handle = r.read_i32()?;
            let position = Point::new(r.read_f64()?, r.read_f64()?);
            ActionKind::TextMove { handle, position }
        }
        ActionType::TextHighlight => {
            let handle = r.read_i32()?;
            let count = read_len(r, "highlight count")?;
            // The count is untrusted; make sure the rectangles are really there.
            let needed = count.checked_mul(RECT_LEN).unwrap_or(usize::MAX);
            if needed > r.remaining() {
                r.skip(needed)?;
            }
            let mut rects = Vec::with_capacity(count);
            for _ in 0..count {
                rects.push(read_rect(r)?);
            }
            ActionKind::TextHighlight { handle, rects }
        }
        ActionType::LatexFontChange => {
            let handle = r.read_i32()?;
            let font = LatexFont {
                font_type: r.read_i32()?,
                size: r.read_f32()?,
                color: Color::from_packed(r.read_u32()?),
                style: r.read_i32()?,
            };
            ActionKind::LatexFontChange { handle, font }
        }
        ActionType::ExtendView => ActionKind::ExtendView(read_rect(r)?),
        ActionType::ToolBegin => ActionKind::ToolBegin(read_pen_point(r)?),
        ActionType::ToolExecute => ActionKind::ToolExecute(read_pen_point(r)?),
        ActionType::ToolEnd => ActionKind::ToolEnd(read_pen_point(r)?),
        ActionType::Clone => ActionKind::Clone,
        ActionType::Select => ActionKind::Select,
        ActionType::SelectGroup => ActionKind::SelectGroup,
        ActionType::Undo => ActionKind::Undo,
        ActionType::Redo => ActionKind::Redo,
        ActionType::ClearShapes => ActionKind::ClearShapes,
        ActionType::Panning => ActionKind::Panning,
        ActionType::ZoomOut => ActionKind::ZoomOut,
        ActionType::Rubber => ActionKind::Rubber,
        ActionType::Key => ActionKind::Key,
    };
    Ok(kind)
}

fn read_key_event(r: &mut ByteReader<'_>) -> ProtoResult<KeyEvent> {
    let key_code = r.read_i32()? as u32;
    let modifiers = Modifiers::from_bits_retain(r.read_i32()? as u32);
    let raw = r.read_i32()?;
    let phase = u8::try_from(raw)
        .ok()
        .and_then(KeyPhase::from_u8)
        .ok_or(ProtoError::InvalidValue {
            field: "key phase",
            value: i64::from(raw),
        })?;
    Ok(KeyEvent::new(key_code, modifiers, phase))
}

fn put_brush(w: &mut ByteWriter, action: &BrushAction) {
    w.put_i32(action.handle);
    w.put_u32(action.brush.color.to_packed());
    w.put_u8(action.brush.line_cap as u8);
    w.put_f64(action.brush.width);
}

fn read_brush(r: &mut ByteReader<'_>) -> ProtoResult<BrushAction> {
    let handle = r.read_i32()?;
    let color = Color::from_packed(r.read_u32()?);
    let line_cap = read_enum(r, "line cap", LineCap::from_u8)?;
    let width = r.read_f64()?;
    Ok(BrushAction::new(handle, Brush::new(color, line_cap, width)))
}

fn read_pen_point(r: &mut ByteReader<'_>) -> ProtoResult<PenPoint> {
    Ok(PenPoint::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
}

fn put_rect(w: &mut ByteWriter, rect: &Rect) {
    w.put_f64(rect.x);
    w.put_f64(rect.y);
    w.put_f64(rect.width);
    w.put_f64(rect.height);
}

fn read_rect(r: &mut ByteReader<'_>) -> ProtoResult<Rect> {
    Ok(Rect::new(
        r.read_f64()?,
        r.read_f64()?,
        r.read_f64()?,
        r.read_f64()?,
    ))
}

pub(crate) fn put_prefixed_str(
    w: &mut ByteWriter,
    value: &str,
    field: &'static str,
) -> ProtoResult<()> {
    w.put_i32(wire_len(value.len(), field)?);
    w.put_bytes(value.as_bytes());
    Ok(())
}

pub(crate) fn read_prefixed_str(r: &mut ByteReader<'_>, field: &'static str) -> ProtoResult<String> {
    let len = read_len(r, field)?;
    Ok(r.read_utf8(len)?)
}

fn read_enum<T>(
    r: &mut ByteReader<'_>,
    field: &'static str,
    from_u8: fn(u8) -> Option<T>,
) -> ProtoResult<T> {
    let value = r.read_u8()?;
    from_u8(value).ok_or(ProtoError::InvalidValue {
        field,
        value: i64::from(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(action: &Action) -> Vec<u8> {
        let mut w = ByteWriter::new();
        encode_payload(action, &mut w).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_pen_payload_is_21_bytes() {
        let brush = Brush::new(Color::rgba(255, 0, 0, 255), LineCap::Round, 5.0);
        let action = Action::new(0, ActionKind::Pen(BrushAction::new(123, brush)));
        let bytes = encode(&action);
        assert_eq!(bytes.len(), 21);
        assert_eq!(action.encoded_len(), 21);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &123i32.to_be_bytes());
        assert_eq!(&bytes[8..12], &[0xFF, 0, 0, 0xFF]);
        assert_eq!(bytes[12], LineCap::Round as u8);
        assert_eq!(&bytes[13..21], &5.0f64.to_be_bytes());

        let mut r = ByteReader::new(&bytes);
        let (key, kind) = decode_payload(ActionType::Pen, &mut r).unwrap();
        assert!(key.is_none());
        assert_eq!(kind, action.kind);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_key_event_follows_header() {
        let key = KeyEvent::new(17, Modifiers::CTRL | Modifiers::ALT, KeyPhase::Press);
        let action = Action::new(0, ActionKind::Key).with_key_event(key);
        let bytes = encode(&action);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &17i32.to_be_bytes());
        assert_eq!(&bytes[8..12], &0b110i32.to_be_bytes());
        assert_eq!(&bytes[12..16], &2i32.to_be_bytes());

        let mut r = ByteReader::new(&bytes);
        let (decoded, kind) = decode_payload(ActionType::Key, &mut r).unwrap();
        assert_eq!(decoded, Some(key));
        assert_eq!(kind, ActionKind::Key);
    }

    #[test]
    fn test_invalid_key_phase_rejected() {
        let mut w = ByteWriter::new();
        w.put_i32(1);
        w.put_i32(16);
        w.put_i32(0);
        w.put_i32(256);
        let err = decode_payload(ActionType::Key, &mut ByteReader::new(w.as_slice())).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::InvalidValue {
                field: "key phase",
                value: 256
            }
        ));
    }

    #[test]
    fn test_invalid_line_cap_rejected() {
        let mut w = ByteWriter::new();
        w.put_i32(0);
        w.put_i32(1);
        w.put_u32(0);
        w.put_u8(7);
        w.put_f64(1.0);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            decode_payload(ActionType::Line, &mut r).unwrap_err(),
            ProtoError::InvalidValue {
                field: "line cap",
                value: 7
            }
        );
    }

    #[test]
    fn test_negative_text_length_rejected() {
        let mut w = ByteWriter::new();
        w.put_i32(0);
        w.put_i32(3);
        w.put_i32(-1);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            decode_payload(ActionType::TextChange, &mut r),
            Err(ProtoError::NegativeLength { value: -1, .. })
        ));
    }

    #[test]
    fn test_huge_highlight_count_fails_cleanly() {
        let mut w = ByteWriter::new();
        w.put_i32(0);
        w.put_i32(3);
        w.put_i32(i32::MAX);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            decode_payload(ActionType::TextHighlight, &mut r),
            Err(ProtoError::Cursor(_))
        ));
    }

    #[test]
    fn test_font_change_layout() {
        let font = TextFont {
            family: "Mono".into(),
            size: 12.0,
            posture: FontPosture::Italic,
            weight: FontWeight::Bold,
            strikethrough: true,
            underline: false,
        };
        let action = Action::new(0, ActionKind::TextFontChange { handle: 2, font });
        let bytes = encode(&action);
        assert_eq!(bytes.len(), action.encoded_len());
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 1, 1, 0]);
    }
}
