// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serde adapter over `MSGPACK` values.
//!
//! The ABI treats msgpack payloads as opaque blobs; this module only runs `rmp-serde` on either
//! side of [`make_msgpack`](crate::make_msgpack) and [`to_msgpack`](crate::to_msgpack). Structs
//! are encoded as maps keyed by field name.

use serde::Serialize;
use serde::de::DeserializeOwned;
use walink_value::{Value, WalinkError};

use crate::convert::to_msgpack;
use crate::factory::make_msgpack;

/// Serializes `value` into a new `MSGPACK` value.
pub fn encode<T: Serialize + ?Sized>(value: &T, free_flag: bool) -> Result<Value, WalinkError> {
    let blob = rmp_serde::to_vec_named(value).map_err(|e| WalinkError::Msgpack(e.to_string()))?;
    make_msgpack(&blob, free_flag)
}

/// Deserializes a `MSGPACK` value.
///
/// The blob is copied out (and released, if owed) before decoding starts.
pub fn decode<T: DeserializeOwned>(v: Value, allow_free: bool) -> Result<T, WalinkError> {
    let blob = to_msgpack(v, allow_free)?;
    rmp_serde::from_slice(&blob).map_err(|e| WalinkError::Msgpack(e.to_string()))
}
