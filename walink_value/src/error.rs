// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::fmt;

use crate::tag::Tag;

/// A walink ABI error.
///
/// These indicate programmer error at the ABI boundary. They are never encoded as `ERROR`-tagged
/// values; guests surface them as a trap of the current call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalinkError {
    /// A converter saw a tag or address-ness that disagrees with its expectation.
    TypeMismatch {
        /// The tag the converter accepts.
        expected: Tag,
        /// The tag carried by the value.
        found: Tag,
    },
    /// A callable view was requested for a non-`FUNCTION` value, or no dispatcher is available.
    NotCallable {
        /// The tag carried by the value.
        found: Tag,
    },
    /// An address was requested from a value without `IS_ADDRESS`.
    MissingAddress {
        /// The tag carried by the value.
        found: Tag,
    },
    /// The address is not pinned in the retention registry.
    UnknownAddress(u32),
    /// A container header does not fit its allocation.
    MalformedContainer,
    /// A `STRING` or `ERROR` payload is not valid UTF-8.
    InvalidUtf8,
    /// An allocation failed or its size does not fit the 32-bit address space.
    OutOfMemory {
        /// Requested allocation size in bytes.
        size: u64,
    },
    /// A msgpack payload could not be encoded or decoded.
    Msgpack(String),
}

impl fmt::Display for WalinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::NotCallable { found } => write!(f, "value is not callable: found {found}"),
            Self::MissingAddress { found } => {
                write!(f, "value does not carry an address: found {found}")
            }
            Self::UnknownAddress(addr) => write!(f, "address {addr:#010x} is not retained"),
            Self::MalformedContainer => write!(f, "malformed container"),
            Self::InvalidUtf8 => write!(f, "payload is not valid utf-8"),
            Self::OutOfMemory { size } => write!(f, "out of memory allocating {size} bytes"),
            Self::Msgpack(msg) => write!(f, "msgpack: {msg}"),
        }
    }
}

impl core::error::Error for WalinkError {}
