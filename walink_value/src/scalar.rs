// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immediate-value factories and converters.
//!
//! Immediate values never touch the heap: the scalar lives in the low 32 bits of the word.
//! Signed narrow integers are sign-extended through `i32` so the payload of `from_i8(-1)` is
//! `0xFFFF_FFFF` and converts back to `-1`.
//!
//! Converters check both the tag and that `IS_ADDRESS` is clear; the `USER_DEFINED` bit is
//! ignored.

use crate::error::WalinkError;
use crate::tag::Tag;
use crate::value::{Meta, Value};

#[inline]
const fn immediate(tag: Tag, payload: u32) -> Value {
    Value::make(Meta::build(tag, false, false, false), payload)
}

fn expect_immediate(v: Value, tag: Tag) -> Result<u32, WalinkError> {
    if v.tag() != tag || v.is_address() {
        return Err(WalinkError::TypeMismatch {
            expected: tag,
            found: v.tag(),
        });
    }
    Ok(v.payload())
}

/// Returns the canonical null word.
#[must_use]
#[inline]
pub const fn null() -> Value {
    Value::NULL
}

/// Encodes a boolean.
#[must_use]
#[inline]
pub const fn from_bool(b: bool) -> Value {
    immediate(Tag::BOOLEAN, if b { 1 } else { 0 })
}

/// Decodes a boolean. Any non-zero payload is `true`.
pub fn to_bool(v: Value) -> Result<bool, WalinkError> {
    expect_immediate(v, Tag::BOOLEAN).map(|p| p != 0)
}

/// Encodes a signed 8-bit integer.
#[must_use]
#[inline]
pub const fn from_i8(v: i8) -> Value {
    immediate(Tag::SINT8, (v as i32).cast_unsigned())
}

/// Decodes a signed 8-bit integer.
pub fn to_i8(v: Value) -> Result<i8, WalinkError> {
    let [b0, ..] = expect_immediate(v, Tag::SINT8)?.to_le_bytes();
    Ok(i8::from_le_bytes([b0]))
}

/// Encodes an unsigned 8-bit integer.
#[must_use]
#[inline]
pub const fn from_u8(v: u8) -> Value {
    immediate(Tag::UINT8, v as u32)
}

/// Decodes an unsigned 8-bit integer.
pub fn to_u8(v: Value) -> Result<u8, WalinkError> {
    let [b0, ..] = expect_immediate(v, Tag::UINT8)?.to_le_bytes();
    Ok(b0)
}

/// Encodes a signed 16-bit integer.
#[must_use]
#[inline]
pub const fn from_i16(v: i16) -> Value {
    immediate(Tag::SINT16, (v as i32).cast_unsigned())
}

/// Decodes a signed 16-bit integer.
pub fn to_i16(v: Value) -> Result<i16, WalinkError> {
    let [b0, b1, ..] = expect_immediate(v, Tag::SINT16)?.to_le_bytes();
    Ok(i16::from_le_bytes([b0, b1]))
}

/// Encodes an unsigned 16-bit integer.
#[must_use]
#[inline]
pub const fn from_u16(v: u16) -> Value {
    immediate(Tag::UINT16, v as u32)
}

/// Decodes an unsigned 16-bit integer.
pub fn to_u16(v: Value) -> Result<u16, WalinkError> {
    let [b0, b1, ..] = expect_immediate(v, Tag::UINT16)?.to_le_bytes();
    Ok(u16::from_le_bytes([b0, b1]))
}

/// Encodes a signed 32-bit integer.
#[must_use]
#[inline]
pub const fn from_i32(v: i32) -> Value {
    immediate(Tag::SINT32, v.cast_unsigned())
}

/// Decodes a signed 32-bit integer.
pub fn to_i32(v: Value) -> Result<i32, WalinkError> {
    expect_immediate(v, Tag::SINT32).map(u32::cast_signed)
}

/// Encodes an unsigned 32-bit integer.
#[must_use]
#[inline]
pub const fn from_u32(v: u32) -> Value {
    immediate(Tag::UINT32, v)
}

/// Decodes an unsigned 32-bit integer.
pub fn to_u32(v: Value) -> Result<u32, WalinkError> {
    expect_immediate(v, Tag::UINT32)
}

/// Encodes a 32-bit float, preserving its exact bit pattern (NaN payloads, `-0.0`).
#[must_use]
#[inline]
pub const fn from_f32(v: f32) -> Value {
    immediate(Tag::FLOAT32, v.to_bits())
}

/// Decodes a 32-bit float.
pub fn to_f32(v: Value) -> Result<f32, WalinkError> {
    expect_immediate(v, Tag::FLOAT32).map(f32::from_bits)
}
