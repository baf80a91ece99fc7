// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Guest side of the walink ABI.
//!
//! A guest exposes functions of shape `(Value, ...) -> Value`. Immediate scalars travel inside the
//! word; everything else lives in a container on the guest heap whose address the word carries.
//! This crate owns those containers:
//!
//! - [`registry`] pins every container until it is explicitly released, so an address that has
//!   escaped to the host stays valid.
//! - [`factory`] builds address-carrying values; [`convert`] reads them back, releasing the
//!   container when the value carries `FREE_FLAG` and the caller allows it.
//! - [`abi`] provides `walink_alloc` / `walink_free`, exported on `wasm32`.
//! - [`callback`] calls host `FUNCTION` handles through the imported `walink_callback`.
//! - `msgpack` (feature `msgpack`) runs serde over `MSGPACK` blobs.
//!
//! ABI misuse is fatal for the current call: wrap user function bodies in [`entry`], which logs
//! the error and traps.
//!
//! ## Container addresses
//!
//! Converters look a container up by the exact address it was allocated at. An address that
//! points into the middle of a larger block is not a container and reads fail with
//! [`WalinkError::UnknownAddress`]. Hosts therefore give every container its own
//! `walink_alloc`, sized with the 8-byte header included, and never pack several containers into
//! one allocation.
//!
//! ## Example
//! ```
//! use walink_guest::{entry, make_string, to_string, Value};
//!
//! fn echo_string(v: Value) -> Value {
//!     entry(|| {
//!         let s = to_string(v, true)?;
//!         make_string(&s, true)
//!     })
//! }
//!
//! let arg = make_string("hi", true).unwrap();
//! let out = echo_string(arg);
//! assert_eq!(to_string(out, true).unwrap(), "hi");
//! ```

pub mod abi;
pub mod callback;
pub mod convert;
pub mod factory;
#[cfg(feature = "msgpack")]
pub mod msgpack;
pub mod registry;

pub use walink_value::scalar::*;
pub use walink_value::{Meta, Storage, Tag, Value, WalinkError};

pub use abi::{alloc, free, retag};
#[cfg(not(target_arch = "wasm32"))]
pub use callback::{HostCallback, install_host_callback, uninstall_host_callback};
pub use callback::{Function, to_function};
pub use convert::{get_pointer, to_bytes, to_error_message, to_float64, to_msgpack, to_string};
pub use factory::{from_address, make_bytes, make_error, make_float64, make_msgpack, make_string};

/// Runs a user function body, trapping on ABI errors.
///
/// Domain failures are not ABI errors: return [`make_error`] from `body` for those.
pub fn entry<F>(body: F) -> Value
where
    F: FnOnce() -> Result<Value, WalinkError>,
{
    body().unwrap_or_else(|err| trap(&err))
}

/// Aborts the current guest call.
///
/// On `wasm32` the panic becomes a trap that the host observes as an abnormal return.
#[track_caller]
pub fn trap(err: &WalinkError) -> ! {
    log::error!("walink: {err}");
    panic!("walink: {err}");
}
