// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sample guest exports.
//!
//! Every function takes and returns value words only, so the same definitions serve as wasm
//! exports and as plain Rust functions for the in-process loopback.

#![cfg_attr(
    target_arch = "wasm32",
    allow(unsafe_code, reason = "exported symbols need `no_mangle`")
)]

use walink_guest::{
    Tag, Value, entry, from_i32, make_error, make_string, to_function, to_i32, to_string,
};

/// Adds two `SINT32` values, wrapping on overflow.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn add(a: Value, b: Value) -> Value {
    entry(|| Ok(from_i32(to_i32(a)?.wrapping_add(to_i32(b)?))))
}

/// Consumes a `STRING` and returns an owned copy of it.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn echo_string(v: Value) -> Value {
    entry(|| {
        let s = to_string(v, true)?;
        make_string(&s, true)
    })
}

/// Calls the host callback `cb` with the single argument `v` and returns its result.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn call_me_back(cb: Value, v: Value) -> Value {
    entry(|| to_function(cb)?.call(&[v]))
}

/// Returns a `BOOLEAN` unchanged; anything else is answered with an `ERROR`.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn roundtrip_bool(v: Value) -> Value {
    if v.tag() != Tag::BOOLEAN || v.is_address() {
        return entry(|| make_error("roundtrip_bool: invalid tag"));
    }
    v
}

/// Returns an owned `"hello from wasm"`.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn make_hello_string() -> Value {
    entry(|| make_string("hello from wasm", true))
}

/// Turns a `STRING` message into an `ERROR` value.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn fail_with(msg: Value) -> Value {
    entry(|| {
        let msg = to_string(msg, true)?;
        make_error(&msg)
    })
}
