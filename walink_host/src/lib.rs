// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host runtime for the walink ABI.
//!
//! The host never owns guest memory; it reaches it through a [`GuestInstance`], which exposes the
//! guest's `walink_alloc`/`walink_free` exports and raw reads and writes of linear memory. On top
//! of that seam:
//!
//! - [`Walink`] encodes host values into guest containers (handing ownership to the guest) and
//!   decodes guest results (consuming anything the guest marked with `FREE_FLAG`).
//! - [`CallbackTable`] turns host closures into `FUNCTION` handles and services the guest's
//!   `walink_callback` import.
//! - [`Host`] bundles both for an engine binding.
//!
//! No wasm engine is bundled. [`LinearMemory`] is a flat-memory guest used for testing the codec
//! without a module.
//!
//! ## Example
//! ```
//! use walink_host::{GuestInstance, Host, LinearMemory};
//!
//! let mut host = Host::new(LinearMemory::new());
//! let double = host.register(|wl, args| {
//!     let n = wl.from_wl_i32(args[0])?;
//!     Ok(wl.to_wl_i32(n * 2))
//! });
//!
//! // What a guest does when it calls `double(21)`.
//! let arg = host.walink().to_wl_i32(21);
//! let ptr = host.walink().allocate(8)?;
//! host.walink().guest_mut().write(ptr, 0, &arg.to_raw().to_le_bytes())?;
//! let out = host.dispatch(double, ptr, 1)?;
//! assert_eq!(host.walink().from_wl_i32(out)?, 42);
//! # Ok::<(), walink_host::HostError>(())
//! ```

mod callback;
mod error;
mod host;
mod instance;
mod memory;
mod walink;

pub use callback::{CallbackId, CallbackTable, DispatchObserver, HostFn};
pub use error::HostError;
pub use host::{Host, HostOptions};
pub use instance::GuestInstance;
pub use memory::{DEFAULT_LIMIT, LinearMemory};
pub use walink::{HostValue, Walink};

pub use walink_value::{Meta, Tag, Value, WalinkError};
