// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value word and container layouts for the walink guest/host ABI.
//!
//! A [`Value`] is a single `u64` that crosses the sandbox boundary. The high half carries a
//! [`Meta`] word (flag nibble plus a 28-bit [`Tag`]); the low half carries either an immediate
//! scalar or a 32-bit guest heap address.
//!
//! This crate is `no_std + alloc` and has no heap effects of its own: it only knows how to build
//! and take apart value words and how the guest-side containers are laid out in memory. The guest
//! retention registry lives in `walink_guest`; the host runtime lives in `walink_host`.
//!
//! ## Example
//! ```
//! use walink_value::{Tag, scalar};
//!
//! let v = scalar::from_i8(-1);
//! assert_eq!(v.tag(), Tag::SINT8);
//! assert_eq!(v.payload(), 0xFFFF_FFFF);
//! assert_eq!(scalar::to_i8(v), Ok(-1));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod container;
mod error;
pub mod format;
pub mod scalar;
mod tag;
mod value;

pub use error::WalinkError;
pub use tag::{Storage, Tag};
pub use value::{Meta, Value};
