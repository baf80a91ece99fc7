// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory layouts of heap-backed payloads.
//!
//! A *byte container* backs `STRING`, `BYTES`, `MSGPACK` and `ERROR` values:
//!
//! ```text
//! offset 0: u32 cap    allocated payload capacity
//! offset 4: u32 size   valid payload bytes
//! offset 8: u8[cap]    payload
//! ```
//!
//! A *float container* backs `FLOAT64` values and is a single little-endian binary64.
//!
//! The helpers here operate on a container's allocation as a byte slice; the address of that
//! slice is what a value word carries.

use crate::error::WalinkError;
use crate::format::{read_u32_le, read_u64_le, write_u32_le, write_u64_le};

/// Size of the byte container header.
pub const HEADER_SIZE: usize = 8;

/// Size of a float container.
pub const FLOAT_CONTAINER_SIZE: usize = 8;

/// Byte container header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ByteContainerHeader {
    /// Allocated payload capacity.
    pub cap: u32,
    /// Valid payload bytes.
    pub size: u32,
}

impl ByteContainerHeader {
    /// Header for a container holding exactly `payload_len` bytes.
    pub fn exact(payload_len: usize) -> Result<Self, WalinkError> {
        let cap = u32::try_from(payload_len).map_err(|_| WalinkError::OutOfMemory {
            size: payload_len as u64,
        })?;
        Ok(Self { cap, size: cap })
    }

    /// Reads the header at the start of `block`.
    pub fn read(block: &[u8]) -> Result<Self, WalinkError> {
        let cap = read_u32_le(block, 0).ok_or(WalinkError::MalformedContainer)?;
        let size = read_u32_le(block, 4).ok_or(WalinkError::MalformedContainer)?;
        Ok(Self { cap, size })
    }

    /// Writes the header at the start of `block`.
    pub fn write(self, block: &mut [u8]) -> Result<(), WalinkError> {
        write_u32_le(block, 0, self.cap).ok_or(WalinkError::MalformedContainer)?;
        write_u32_le(block, 4, self.size).ok_or(WalinkError::MalformedContainer)
    }

    /// Returns the header as it appears in memory.
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0_u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.cap.to_le_bytes());
        out[4..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    /// Total allocation size (header plus capacity).
    pub fn allocation_size(self) -> Result<u32, WalinkError> {
        self.cap
            .checked_add(8)
            .ok_or(WalinkError::OutOfMemory {
                size: u64::from(self.cap) + 8,
            })
    }
}

/// Returns the allocation size for a byte container holding `payload_len` bytes.
pub fn byte_container_size(payload_len: usize) -> Result<u32, WalinkError> {
    ByteContainerHeader::exact(payload_len)?.allocation_size()
}

/// Fills `block` with a byte container holding `payload`.
///
/// `block` must be at least [`byte_container_size`] bytes long.
pub fn write_byte_container(block: &mut [u8], payload: &[u8]) -> Result<(), WalinkError> {
    ByteContainerHeader::exact(payload.len())?.write(block)?;
    let end = HEADER_SIZE
        .checked_add(payload.len())
        .ok_or(WalinkError::MalformedContainer)?;
    block
        .get_mut(HEADER_SIZE..end)
        .ok_or(WalinkError::MalformedContainer)?
        .copy_from_slice(payload);
    Ok(())
}

/// Returns the valid payload bytes of the byte container in `block`.
///
/// Fails with [`WalinkError::MalformedContainer`] if `size > cap` or the payload would run past
/// the end of the allocation.
pub fn byte_container_payload(block: &[u8]) -> Result<&[u8], WalinkError> {
    let header = ByteContainerHeader::read(block)?;
    if header.size > header.cap {
        return Err(WalinkError::MalformedContainer);
    }
    let size = usize::try_from(header.size).map_err(|_| WalinkError::MalformedContainer)?;
    let end = HEADER_SIZE
        .checked_add(size)
        .ok_or(WalinkError::MalformedContainer)?;
    block
        .get(HEADER_SIZE..end)
        .ok_or(WalinkError::MalformedContainer)
}

/// Fills `block` with a float container.
pub fn write_float_container(block: &mut [u8], v: f64) -> Result<(), WalinkError> {
    write_u64_le(block, 0, v.to_bits()).ok_or(WalinkError::MalformedContainer)
}

/// Reads the float container in `block`.
pub fn read_float_container(block: &[u8]) -> Result<f64, WalinkError> {
    read_u64_le(block, 0)
        .map(f64::from_bits)
        .ok_or(WalinkError::MalformedContainer)
}
