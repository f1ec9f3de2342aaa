//! Checked decoding for the blob messages.
//!
//! Messages are encoded and decoded by prost. Before a buffer is handed to prost it is
//! walked once against the message's field layout, so that malformed input is reported
//! as a precise [`WireError`] instead of an opaque [`prost::DecodeError`].

use bytes::Buf;
use prost::encoding::{decode_varint, skip_field, DecodeContext, WireType};

/// A varint may contain up to 10 bytes
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("Buffer ended in the middle of a varint")]
    TruncatedVarint,

    #[error("Varint does not fit in 64 bits")]
    VarintOverflow,

    #[error("Unknown wire type {0}")]
    UnknownWireType(u8),

    #[error("Length delimited field of {len} bytes exceeds the {remaining} remaining bytes")]
    MalformedLengthDelimited { len: u64, remaining: usize },

    #[error("Unknown field {field} ({wire_type:?}) runs past the end of the buffer")]
    UnknownFieldUnskippable { field: u32, wire_type: WireType },

    #[error("Field {field} expects wire type {expected:?}, found {actual:?}")]
    UnexpectedWireType {
        field: u32,
        expected: WireType,
        actual: WireType,
    },

    #[error("Invalid field number {0}")]
    InvalidFieldNumber(u64),

    #[error("Value {value} of field {field} does not fit in 32 bits")]
    IntegerOverflow { field: u32, value: u64 },

    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(u32),

    #[error("Failed to decode protobuf message: {0}")]
    Decode(String),
}

impl From<prost::DecodeError> for WireError {
    fn from(err: prost::DecodeError) -> Self {
        WireError::Decode(err.to_string())
    }
}

/// Maps a field number to the kind of value it holds, `None` for unknown fields.
pub type FieldLayout = fn(u32) -> Option<FieldKind>;

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Bytes,
    String,
    Uint32,
    /// Accepted both packed and unpacked
    RepeatedUint32,
    Message(FieldLayout),
}

/// A prost message whose field layout is known to the checked decoder.
pub trait WireLayout {
    fn field_kind(field: u32) -> Option<FieldKind>;
}

/// Decodes `bytes` as `M`, skipping unknown fields.
pub fn decode_message<M>(bytes: &[u8]) -> Result<M, WireError>
where
    M: prost::Message + Default + WireLayout,
{
    check_fields(bytes, M::field_kind)?;
    Ok(M::decode(bytes)?)
}

/// Reads a varint, classifying malformed input before handing off to prost.
pub fn read_varint(buf: &mut &[u8]) -> Result<u64, WireError> {
    // If the continuation bit is not set, we're done
    match buf.iter().take(MAX_VARINT_LEN).position(|&b| b < 0x80) {
        // The tenth byte may only contribute the 64th bit
        Some(i) if i == MAX_VARINT_LEN - 1 && buf[i] > 0x01 => {
            return Err(WireError::VarintOverflow)
        }
        Some(_) => {}
        None if buf.len() < MAX_VARINT_LEN => return Err(WireError::TruncatedVarint),
        None => return Err(WireError::VarintOverflow),
    }
    Ok(decode_varint(buf)?)
}

pub fn read_key(buf: &mut &[u8]) -> Result<(u32, WireType), WireError> {
    let key = read_varint(buf)?;
    let wire_type = match key & 0x07 {
        0 => WireType::Varint,
        1 => WireType::SixtyFourBit,
        2 => WireType::LengthDelimited,
        5 => WireType::ThirtyTwoBit,
        // Groups (3 and 4) are deprecated
        other => return Err(WireError::UnknownWireType(other as u8)),
    };
    let field = key >> 3;
    if field < u64::from(prost::encoding::MIN_TAG) || field > u64::from(prost::encoding::MAX_TAG) {
        return Err(WireError::InvalidFieldNumber(field));
    }
    Ok((field as u32, wire_type))
}

/// Splits a length prefixed slice off the front of `buf`.
pub fn read_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], WireError> {
    let len = read_varint(buf)?;
    if len > buf.len() as u64 {
        return Err(WireError::MalformedLengthDelimited {
            len,
            remaining: buf.len(),
        });
    }
    let (value, rest) = buf.split_at(len as usize);
    *buf = rest;
    Ok(value)
}

fn check_fields(mut buf: &[u8], layout: FieldLayout) -> Result<(), WireError> {
    while buf.has_remaining() {
        let (field, wire_type) = read_key(&mut buf)?;
        match layout(field) {
            Some(kind) => check_field(field, kind, wire_type, &mut buf)?,
            None => skip_unknown(field, wire_type, &mut buf)?,
        }
    }
    Ok(())
}

fn expect_wire_type(field: u32, expected: WireType, actual: WireType) -> Result<(), WireError> {
    if expected != actual {
        return Err(WireError::UnexpectedWireType {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_uint32(field: u32, buf: &mut &[u8]) -> Result<(), WireError> {
    let value = read_varint(buf)?;
    if u32::try_from(value).is_err() {
        return Err(WireError::IntegerOverflow { field, value });
    }
    Ok(())
}

fn check_field(
    field: u32,
    kind: FieldKind,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<(), WireError> {
    match kind {
        FieldKind::Bytes => {
            expect_wire_type(field, WireType::LengthDelimited, wire_type)?;
            read_length_delimited(buf)?;
        }
        FieldKind::String => {
            expect_wire_type(field, WireType::LengthDelimited, wire_type)?;
            let value = read_length_delimited(buf)?;
            if std::str::from_utf8(value).is_err() {
                return Err(WireError::InvalidUtf8(field));
            }
        }
        FieldKind::Uint32 => {
            expect_wire_type(field, WireType::Varint, wire_type)?;
            check_uint32(field, buf)?;
        }
        FieldKind::RepeatedUint32 => match wire_type {
            WireType::Varint => check_uint32(field, buf)?,
            _ => {
                expect_wire_type(field, WireType::LengthDelimited, wire_type)?;
                let mut packed = read_length_delimited(buf)?;
                while packed.has_remaining() {
                    check_uint32(field, &mut packed)?;
                }
            }
        },
        FieldKind::Message(layout) => {
            expect_wire_type(field, WireType::LengthDelimited, wire_type)?;
            check_fields(read_length_delimited(buf)?, layout)?;
        }
    }
    Ok(())
}

fn skip_unknown(field: u32, wire_type: WireType, buf: &mut &[u8]) -> Result<(), WireError> {
    let mut lookahead = *buf;
    match wire_type {
        WireType::Varint => {
            read_varint(&mut lookahead)?;
        }
        WireType::LengthDelimited => {
            read_length_delimited(&mut lookahead)?;
        }
        WireType::SixtyFourBit | WireType::ThirtyTwoBit => {
            let width = if wire_type == WireType::SixtyFourBit { 8 } else { 4 };
            if lookahead.remaining() < width {
                return Err(WireError::UnknownFieldUnskippable { field, wire_type });
            }
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(WireError::UnknownWireType(wire_type as u8))
        }
    }
    Ok(skip_field(wire_type, field, buf, DecodeContext::default())?)
}
