// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A flat linear-memory guest.

use hashbrown::HashMap;
use walink_value::{Meta, Value, scalar};

use crate::error::HostError;
use crate::instance::GuestInstance;

/// Lowest address handed out; address `0` stays the null address.
const BASE: u32 = 8;
const ALIGN: u32 = 8;

/// Default upper bound on memory size.
pub const DEFAULT_LIMIT: u32 = 16 * 1024 * 1024;

/// A byte vector standing in for a guest's linear memory.
///
/// It implements `walink_alloc`/`walink_free` with the same contract a guest module exports: a
/// bump allocator hands out 8-aligned, non-zero addresses and an allocation table tracks what is
/// live. The bump pointer rewinds once every allocation has been freed.
#[derive(Clone, Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    top: u32,
    limit: u32,
    live: HashMap<u32, u32>,
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl LinearMemory {
    /// Creates an empty memory bounded by [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty memory that never grows past `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            bytes: Vec::new(),
            top: BASE,
            limit,
            live: HashMap::new(),
        }
    }

    /// Returns `true` if `addr` is a live allocation.
    #[must_use]
    pub fn contains(&self, addr: u32) -> bool {
        self.live.contains_key(&addr)
    }

    /// Returns the number of live allocations.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    /// Returns the whole memory.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, addr: u32, offset: u32, len: usize) -> Option<core::ops::Range<usize>> {
        let start = usize::try_from(addr.checked_add(offset)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl GuestInstance for LinearMemory {
    fn alloc(&mut self, size: u32) -> Result<Value, HostError> {
        let failed = || HostError::AllocFailed { size };
        let span = size
            .max(1)
            .checked_next_multiple_of(ALIGN)
            .ok_or_else(failed)?;
        let addr = self.top;
        let end = addr
            .checked_add(span)
            .filter(|&end| end <= self.limit)
            .ok_or_else(failed)?;
        let start = usize::try_from(addr).map_err(|_| failed())?;
        let end_usize = usize::try_from(end).map_err(|_| failed())?;
        if self.bytes.len() < end_usize {
            self.bytes
                .try_reserve(end_usize - self.bytes.len())
                .map_err(|_| failed())?;
            self.bytes.resize(end_usize, 0);
        }
        self.bytes[start..end_usize].fill(0);
        self.top = end;
        self.live.insert(addr, size);
        log::trace!("linear alloc {addr:#010x} ({size} bytes)");
        Ok(Value::make(Meta::NONE, addr))
    }

    fn free(&mut self, v: Value) -> Result<Value, HostError> {
        if !v.is_address() {
            return Ok(scalar::from_bool(false));
        }
        if self.live.remove(&v.payload()).is_none() {
            log::warn!("linear free of {:#010x}, which is not live", v.payload());
        }
        if self.live.is_empty() {
            self.top = BASE;
        }
        Ok(scalar::from_bool(true))
    }

    fn read(&self, addr: u32, offset: u32, out: &mut [u8]) -> Result<(), HostError> {
        let range = self
            .range(addr, offset, out.len())
            .ok_or(HostError::OutOfBounds {
                addr,
                offset,
                len: out.len(),
            })?;
        out.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, addr: u32, offset: u32, data: &[u8]) -> Result<(), HostError> {
        let range = self
            .range(addr, offset, data.len())
            .ok_or(HostError::OutOfBounds {
                addr,
                offset,
                len: data.len(),
            })?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}
