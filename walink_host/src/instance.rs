// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the host runtime and a running guest.

use walink_value::Value;

use crate::error::HostError;

/// A running guest module as the host sees it.
///
/// Engines with flat linear memory implement `read`/`write` as `memory[addr + offset ..]`.
/// Addressing is split into a base and an offset so guests whose containers are separate blocks
/// (such as the in-process loopback) fit the same seam: every access stays within the
/// allocation that starts at `addr`.
pub trait GuestInstance {
    /// Calls the guest's `walink_alloc(size)`.
    fn alloc(&mut self, size: u32) -> Result<Value, HostError>;

    /// Calls the guest's `walink_free(v)`.
    fn free(&mut self, v: Value) -> Result<Value, HostError>;

    /// Copies `out.len()` bytes starting at `addr + offset` out of guest memory.
    fn read(&self, addr: u32, offset: u32, out: &mut [u8]) -> Result<(), HostError>;

    /// Copies `data` into guest memory starting at `addr + offset`.
    fn write(&mut self, addr: u32, offset: u32, data: &[u8]) -> Result<(), HostError>;
}

impl<G: GuestInstance + ?Sized> GuestInstance for &mut G {
    fn alloc(&mut self, size: u32) -> Result<Value, HostError> {
        (**self).alloc(size)
    }

    fn free(&mut self, v: Value) -> Result<Value, HostError> {
        (**self).free(v)
    }

    fn read(&self, addr: u32, offset: u32, out: &mut [u8]) -> Result<(), HostError> {
        (**self).read(addr, offset, out)
    }

    fn write(&mut self, addr: u32, offset: u32, data: &[u8]) -> Result<(), HostError> {
        (**self).write(addr, offset, data)
    }
}
