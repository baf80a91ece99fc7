// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Factories for address-carrying values.
//!
//! Each factory allocates a container sized to the payload, fills it, pins it in the
//! [registry](crate::registry) and returns a word with `IS_ADDRESS` set. `free_flag` decides who
//! owns the container afterwards: with the flag set the receiver must release it.

use walink_value::container::{
    FLOAT_CONTAINER_SIZE, byte_container_size, write_byte_container, write_float_container,
};
use walink_value::{Meta, Tag, Value, WalinkError};

use crate::registry::registry;

/// Builds the word for an existing allocation at `addr`.
#[must_use]
#[inline]
pub const fn from_address(addr: u32, tag: Tag, free_flag: bool) -> Value {
    Value::make(Meta::build(tag, true, free_flag, false), addr)
}

fn make_byte_container(tag: Tag, payload: &[u8], free_flag: bool) -> Result<Value, WalinkError> {
    let size = byte_container_size(payload.len())?;
    let addr = registry().allocate_with(size, |block| write_byte_container(block, payload))?;
    Ok(from_address(addr, tag, free_flag))
}

/// Creates a `STRING` value.
pub fn make_string(s: &str, free_flag: bool) -> Result<Value, WalinkError> {
    make_byte_container(Tag::STRING, s.as_bytes(), free_flag)
}

/// Creates a `BYTES` value.
pub fn make_bytes(bytes: &[u8], free_flag: bool) -> Result<Value, WalinkError> {
    make_byte_container(Tag::BYTES, bytes, free_flag)
}

/// Creates a `MSGPACK` value from an already serialized blob.
pub fn make_msgpack(blob: &[u8], free_flag: bool) -> Result<Value, WalinkError> {
    make_byte_container(Tag::MSGPACK, blob, free_flag)
}

/// Creates an `ERROR` value. The receiver always owns the message.
pub fn make_error(msg: &str) -> Result<Value, WalinkError> {
    make_byte_container(Tag::ERROR, msg.as_bytes(), true)
}

/// Creates a `FLOAT64` value.
pub fn make_float64(v: f64, free_flag: bool) -> Result<Value, WalinkError> {
    let size = u32::try_from(FLOAT_CONTAINER_SIZE).map_err(|_| WalinkError::MalformedContainer)?;
    let addr = registry().allocate_with(size, |block| write_float_container(block, v))?;
    Ok(from_address(addr, Tag::FLOAT64, free_flag))
}
