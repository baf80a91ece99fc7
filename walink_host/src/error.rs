// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use walink_value::{Tag, WalinkError};

/// Errors raised by the host runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    /// A value or container violated the walink ABI.
    Abi(WalinkError),
    /// The guest returned an `ERROR` value with this message.
    Guest(String),
    /// A guest memory access fell outside linear memory.
    OutOfBounds {
        /// Base address of the access.
        addr: u32,
        /// Offset from `addr`.
        offset: u32,
        /// Number of bytes accessed.
        len: usize,
    },
    /// `walink_alloc` returned no usable address.
    AllocFailed {
        /// Requested size in bytes.
        size: u32,
    },
    /// A callback handle does not name a registered callback.
    UnknownCallback(u32),
    /// A non-`FUNCTION` value was dispatched as a callback.
    NotCallable {
        /// The tag carried by the value.
        found: Tag,
    },
    /// A msgpack payload could not be encoded or decoded.
    Msgpack(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abi(err) => write!(f, "walink abi: {err}"),
            Self::Guest(msg) => write!(f, "guest error: {msg}"),
            Self::OutOfBounds { addr, offset, len } => write!(
                f,
                "guest memory access out of bounds: addr={addr:#010x} offset={offset} len={len}"
            ),
            Self::AllocFailed { size } => write!(f, "guest allocation failed (size: {size})"),
            Self::UnknownCallback(id) => write!(f, "unknown callback id {id}"),
            Self::NotCallable { found } => write!(f, "value is not callable: found {found}"),
            Self::Msgpack(msg) => write!(f, "msgpack: {msg}"),
        }
    }
}

impl core::error::Error for HostError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Abi(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WalinkError> for HostError {
    fn from(err: WalinkError) -> Self {
        match err {
            WalinkError::Msgpack(msg) => Self::Msgpack(msg),
            WalinkError::NotCallable { found } => Self::NotCallable { found },
            err => Self::Abi(err),
        }
    }
}
