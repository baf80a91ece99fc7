// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Converters for address-carrying values.
//!
//! Every converter copies the payload out of the container before it releases anything, so the
//! returned native value never aliases guest container memory. The container is released only
//! when the value carries `FREE_FLAG` *and* the caller passes `allow_free = true`; otherwise the
//! read is a borrow and the registry entry stays.
//!
//! A word with `IS_ADDRESS` and payload `0` converts to the native zero (`""`, empty bytes,
//! `0.0`) without consulting the registry.

use walink_value::container::{byte_container_payload, read_float_container};
use walink_value::{Tag, Value, WalinkError};

use crate::registry::registry;

fn expect_address(v: Value, tag: Tag) -> Result<(), WalinkError> {
    if v.tag() != tag || !v.is_address() {
        return Err(WalinkError::TypeMismatch {
            expected: tag,
            found: v.tag(),
        });
    }
    Ok(())
}

/// Reads the container behind `v` with `read`, then consumes it if owed.
///
/// Returns `Ok(None)` for the null address.
fn read_container<T>(
    v: Value,
    allow_free: bool,
    read: impl FnOnce(&[u8]) -> Result<T, WalinkError>,
) -> Result<Option<T>, WalinkError> {
    let addr = v.payload();
    if addr == 0 {
        return Ok(None);
    }
    let out = registry()
        .with_block(addr, read)
        .ok_or(WalinkError::UnknownAddress(addr))?;
    if allow_free && v.has_free_flag() {
        registry().release(addr);
    }
    out.map(Some)
}

fn read_byte_payload(v: Value, tag: Tag, allow_free: bool) -> Result<Vec<u8>, WalinkError> {
    expect_address(v, tag)?;
    let bytes = read_container(v, allow_free, |block| {
        byte_container_payload(block).map(<[u8]>::to_vec)
    })?;
    Ok(bytes.unwrap_or_default())
}

/// Converts a `STRING` value.
pub fn to_string(v: Value, allow_free: bool) -> Result<String, WalinkError> {
    let bytes = read_byte_payload(v, Tag::STRING, allow_free)?;
    String::from_utf8(bytes).map_err(|_| WalinkError::InvalidUtf8)
}

/// Converts a `BYTES` value.
pub fn to_bytes(v: Value, allow_free: bool) -> Result<Vec<u8>, WalinkError> {
    read_byte_payload(v, Tag::BYTES, allow_free)
}

/// Converts a `MSGPACK` value to its raw serialized blob.
pub fn to_msgpack(v: Value, allow_free: bool) -> Result<Vec<u8>, WalinkError> {
    read_byte_payload(v, Tag::MSGPACK, allow_free)
}

/// Converts an `ERROR` value to its message.
pub fn to_error_message(v: Value, allow_free: bool) -> Result<String, WalinkError> {
    let bytes = read_byte_payload(v, Tag::ERROR, allow_free)?;
    String::from_utf8(bytes).map_err(|_| WalinkError::InvalidUtf8)
}

/// Converts a `FLOAT64` value.
pub fn to_float64(v: Value, allow_free: bool) -> Result<f64, WalinkError> {
    expect_address(v, Tag::FLOAT64)?;
    Ok(read_container(v, allow_free, read_float_container)?.unwrap_or_default())
}

/// Returns the guest address carried by `v`.
///
/// Fails with [`WalinkError::MissingAddress`] if `v` does not carry `IS_ADDRESS`. This never
/// touches the registry.
pub fn get_pointer(v: Value) -> Result<u32, WalinkError> {
    if !v.is_address() {
        return Err(WalinkError::MissingAddress { found: v.tag() });
    }
    Ok(v.payload())
}
