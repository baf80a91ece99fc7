// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Allocation primitives the host drives.
//!
//! The host calls `walink_alloc` to get space for arguments it wants to pass in, writes them
//! through linear memory, and calls `walink_free` on anything it was handed with `FREE_FLAG`.

use walink_value::{Meta, Tag, Value, WalinkError, scalar};

use crate::registry::registry;

/// Reserves `size` bytes and pins them.
///
/// The result carries the address in its payload and an empty meta word. A request for zero
/// bytes still gets a distinct, non-null address.
pub fn alloc(size: u32) -> Result<Value, WalinkError> {
    let addr = registry().allocate(size)?;
    Ok(Value::make(Meta::NONE, addr))
}

/// Releases the allocation at `v.payload()`.
///
/// Returns boolean `false` without touching the registry unless `v` carries `IS_ADDRESS`; the
/// tag and the other flags are ignored. Releasing an address that is not pinned is logged and
/// otherwise a no-op, so any address-carrying word yields `true`.
///
/// A word from [`alloc`] has an empty meta word: callers retag it (usually with the container's
/// tag) before handing it back here.
pub fn free(v: Value) -> Value {
    if !v.is_address() {
        return scalar::from_bool(false);
    }
    registry().release(v.payload());
    scalar::from_bool(true)
}

/// Marks a raw allocation from [`alloc`] as address-carrying with `tag`.
#[must_use]
pub const fn retag(raw: Value, tag: Tag, free_flag: bool) -> Value {
    crate::factory::from_address(raw.payload(), tag, free_flag)
}

#[cfg(target_arch = "wasm32")]
#[allow(unsafe_code, reason = "exported symbols need `no_mangle`")]
mod exports {
    use walink_value::Value;

    #[unsafe(no_mangle)]
    extern "C" fn walink_alloc(size: u32) -> Value {
        super::alloc(size).unwrap_or_else(|err| crate::trap(&err))
    }

    #[unsafe(no_mangle)]
    extern "C" fn walink_free(v: Value) -> Value {
        super::free(v)
    }
}
