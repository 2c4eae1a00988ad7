//! Byte-comparable key encoding for the scalar index.
//!
//! Encoded keys compare with a plain byte comparison in the same order
//! `Value::compare` gives for values of the indexed field's type. Each value
//! starts with a type prefix, so NULL sorts before everything and
//! composite keys can be compared component by component.
//!
//! ```text
//! 0x01       NULL
//! 0x02-0x03  BOOLEAN (false < true)
//! 0x15       FLOAT  + 4 bytes, sign-adjusted IEEE 754
//! 0x16       INT    + 4 bytes, sign bit flipped, big-endian
//! 0x20       CHAR   + escaped bytes + 0x00 0x00
//! 0x30       DATE   + 4 bytes like INT
//! 0xFF       upper sentinel for prefix ranges
//! ```

use crate::core::{AttrType, DatabaseError, Value};

pub mod type_prefix {
    pub const NULL: u8 = 0x01;
    pub const FALSE: u8 = 0x02;
    pub const TRUE: u8 = 0x03;
    pub const FLOAT: u8 = 0x15;
    pub const INT: u8 = 0x16;
    pub const CHARS: u8 = 0x20;
    pub const DATE: u8 = 0x30;
    pub const MAX_KEY: u8 = 0xFF;
}

/// Types a scalar index can order
#[must_use]
pub const fn is_indexable(attr_type: AttrType) -> bool {
    matches!(
        attr_type,
        AttrType::Ints | AttrType::Floats | AttrType::Booleans | AttrType::Chars | AttrType::Dates
    )
}

fn encode_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&((v as u32) ^ 0x8000_0000).to_be_bytes());
}

fn encode_f32(buf: &mut Vec<u8>, v: f32) {
    // -0.0 and 0.0 compare equal, so they must encode the same
    let v = if v == 0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    let ordered = if bits & 0x8000_0000 != 0 { !bits } else { bits ^ 0x8000_0000 };
    buf.extend_from_slice(&ordered.to_be_bytes());
}

/// `0x00` is escaped as `0x00 0xFF` so the `0x00 0x00` terminator stays unique
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        buf.push(b);
        if b == 0x00 {
            buf.push(0xFF);
        }
    }
    buf.extend_from_slice(&[0x00, 0x00]);
}

pub fn encode_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), DatabaseError> {
    match value.attr_type() {
        AttrType::Nulls => buf.push(type_prefix::NULL),
        AttrType::Booleans => buf.push(if value.get_boolean() { type_prefix::TRUE } else { type_prefix::FALSE }),
        AttrType::Ints => {
            buf.push(type_prefix::INT);
            encode_i32(buf, value.get_int());
        }
        AttrType::Floats => {
            buf.push(type_prefix::FLOAT);
            encode_f32(buf, value.get_float());
        }
        AttrType::Dates => {
            buf.push(type_prefix::DATE);
            encode_i32(buf, value.get_int());
        }
        AttrType::Chars => {
            buf.push(type_prefix::CHARS);
            encode_bytes(buf, value.bytes().unwrap_or_default());
        }
        other => {
            return Err(DatabaseError::Unimplemented(format!("index key on {other}")));
        }
    }
    Ok(())
}

/// Encodes a composite key; a shorter slice encodes a prefix
pub fn encode_key(values: &[Value]) -> Result<Vec<u8>, DatabaseError> {
    let mut buf = Vec::with_capacity(values.len() * 6);
    for value in values {
        encode_value(&mut buf, value)?;
    }
    Ok(buf)
}

/// Smallest key greater than every key starting with `prefix`
#[must_use]
pub fn prefix_upper_bound(mut prefix: Vec<u8>) -> Vec<u8> {
    prefix.push(type_prefix::MAX_KEY);
    prefix
}
