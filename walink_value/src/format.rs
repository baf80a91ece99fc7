// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Little-endian helpers for guest memory blocks.
//!
//! Every multi-byte quantity walink places in guest memory is little-endian: container headers,
//! float containers, and the value-word arrays passed to host callbacks.

use alloc::vec::Vec;

use crate::value::Value;

/// Size of one value word in memory.
pub const WORD_SIZE: usize = 8;

/// Reads a little-endian `u32` at `offset`.
#[must_use]
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let b: [u8; 4] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(b))
}

/// Reads a little-endian `u64` at `offset`.
#[must_use]
pub fn read_u64_le(bytes: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    let b: [u8; 8] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u64::from_le_bytes(b))
}

/// Writes a little-endian `u32` at `offset`. Returns `None` if it does not fit.
pub fn write_u32_le(out: &mut [u8], offset: usize, value: u32) -> Option<()> {
    let end = offset.checked_add(4)?;
    out.get_mut(offset..end)?.copy_from_slice(&value.to_le_bytes());
    Some(())
}

/// Writes a little-endian `u64` at `offset`. Returns `None` if it does not fit.
pub fn write_u64_le(out: &mut [u8], offset: usize, value: u64) -> Option<()> {
    let end = offset.checked_add(8)?;
    out.get_mut(offset..end)?.copy_from_slice(&value.to_le_bytes());
    Some(())
}

/// Serializes value words into a contiguous little-endian array.
#[must_use]
pub fn encode_words(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * WORD_SIZE);
    for v in values {
        out.extend_from_slice(&v.to_raw().to_le_bytes());
    }
    out
}

/// Reads `count` value words from the start of `bytes`.
#[must_use]
pub fn decode_words(bytes: &[u8], count: usize) -> Option<Vec<Value>> {
    let len = count.checked_mul(WORD_SIZE)?;
    let bytes = bytes.get(..len)?;
    Some(
        bytes
            .chunks_exact(WORD_SIZE)
            .map(|chunk| {
                let mut b = [0_u8; WORD_SIZE];
                b.copy_from_slice(chunk);
                Value::from_raw(u64::from_le_bytes(b))
            })
            .collect(),
    )
}
