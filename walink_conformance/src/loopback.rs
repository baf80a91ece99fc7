// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-process guest.
//!
//! [`Loopback`] presents the `walink_guest` retention registry to `walink_host` as if it were a
//! module's linear memory: `walink_alloc`/`walink_free` go to the guest primitives and memory
//! accesses go through the registry. [`connect`] routes the guest's `walink_callback` import on
//! the current thread to a [`Host`].

use core::ops::Range;
use std::cell::RefCell;
use std::rc::Rc;

use walink_guest::registry::registry;
use walink_host::{GuestInstance, Host, HostError, Value};

/// The in-process guest.
#[derive(Copy, Clone, Debug, Default)]
pub struct Loopback;

fn block_range(offset: u32, len: usize, block_len: usize) -> Option<Range<usize>> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(len)?;
    (end <= block_len).then_some(start..end)
}

impl GuestInstance for Loopback {
    fn alloc(&mut self, size: u32) -> Result<Value, HostError> {
        Ok(walink_guest::alloc(size)?)
    }

    fn free(&mut self, v: Value) -> Result<Value, HostError> {
        Ok(walink_guest::free(v))
    }

    fn read(&self, addr: u32, offset: u32, out: &mut [u8]) -> Result<(), HostError> {
        let oob = HostError::OutOfBounds {
            addr,
            offset,
            len: out.len(),
        };
        registry()
            .with_block(addr, |block| {
                let range = block_range(offset, out.len(), block.len())?;
                out.copy_from_slice(&block[range]);
                Some(())
            })
            .flatten()
            .ok_or(oob)
    }

    fn write(&mut self, addr: u32, offset: u32, data: &[u8]) -> Result<(), HostError> {
        let oob = HostError::OutOfBounds {
            addr,
            offset,
            len: data.len(),
        };
        registry()
            .with_block_mut(addr, |block| {
                let range = block_range(offset, data.len(), block.len())?;
                block[range].copy_from_slice(data);
                Some(())
            })
            .flatten()
            .ok_or(oob)
    }
}

/// Shared handle to a loopback host.
pub type SharedHost = Rc<RefCell<Host<Loopback>>>;

/// Creates a loopback host and installs it as this thread's `walink_callback`.
///
/// Host callback failures reach the guest as `ERROR` values. Host callbacks must not call back
/// into guest functions that themselves call the host.
pub fn connect() -> SharedHost {
    let host = Rc::new(RefCell::new(Host::new(Loopback)));
    let dispatcher = Rc::clone(&host);
    walink_guest::install_host_callback(move |handle, args_ptr, args_len| {
        dispatcher
            .borrow_mut()
            .dispatch_or_error(handle, args_ptr, args_len)
    });
    host
}

/// Removes this thread's `walink_callback` dispatcher.
pub fn disconnect() {
    walink_guest::uninstall_host_callback();
}
