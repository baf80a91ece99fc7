// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use crate::value::Meta;

/// How a tag's payload is stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    /// The payload is the scalar itself.
    Immediate,
    /// The payload is the address of a guest container.
    Address,
    /// The payload is a host-side handle the guest never dereferences.
    Opaque,
    /// Not a core tag (application-defined).
    Unknown,
}

/// A 28-bit type discriminator.
///
/// The set of tags is open: applications may use any value not listed here, usually together with
/// [`Meta::USER_DEFINED`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u32);

impl Tag {
    /// Null; canonical word is zero.
    pub const NULL: Self = Self(0x0);
    /// Boolean, payload `0` or `1`.
    pub const BOOLEAN: Self = Self(0x10);
    /// Signed 8-bit integer, sign-extended.
    pub const SINT8: Self = Self(0x11);
    /// Unsigned 8-bit integer, zero-extended.
    pub const UINT8: Self = Self(0x21);
    /// Signed 16-bit integer, sign-extended.
    pub const SINT16: Self = Self(0x12);
    /// Unsigned 16-bit integer, zero-extended.
    pub const UINT16: Self = Self(0x22);
    /// Signed 32-bit integer.
    pub const SINT32: Self = Self(0x14);
    /// Unsigned 32-bit integer.
    pub const UINT32: Self = Self(0x24);
    /// IEEE-754 binary32 bit pattern.
    pub const FLOAT32: Self = Self(0x30);

    /// Address of an 8-byte float container.
    pub const FLOAT64: Self = Self(0x31);
    /// Address of a byte container.
    pub const BYTES: Self = Self(0x01);
    /// Address of a byte container holding UTF-8.
    pub const STRING: Self = Self(0x02);
    /// Address of a byte container holding a msgpack blob.
    pub const MSGPACK: Self = Self(0x0100);
    /// Address of a byte container holding a UTF-8 error message.
    pub const ERROR: Self = Self(0x0FFF_FFF0);

    /// Host callback handle.
    pub const FUNCTION: Self = Self(0x0100_0000);

    /// Creates a tag from raw bits. Bits outside [`Meta::TAG_MASK`] are dropped.
    #[must_use]
    #[inline]
    pub const fn new(bits: u32) -> Self {
        Self(bits & Meta::TAG_MASK)
    }

    /// Returns the raw 28-bit tag.
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Classifies how values of this tag carry their payload.
    #[must_use]
    pub const fn storage(self) -> Storage {
        match self.0 {
            0x0 | 0x10 | 0x11 | 0x21 | 0x12 | 0x22 | 0x14 | 0x24 | 0x30 => Storage::Immediate,
            0x31 | 0x01 | 0x02 | 0x0100 | 0x0FFF_FFF0 => Storage::Address,
            0x0100_0000 => Storage::Opaque,
            _ => Storage::Unknown,
        }
    }

    /// Returns the upper-case name of a core tag.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x0 => "NULL",
            0x10 => "BOOLEAN",
            0x11 => "SINT8",
            0x21 => "UINT8",
            0x12 => "SINT16",
            0x22 => "UINT16",
            0x14 => "SINT32",
            0x24 => "UINT32",
            0x30 => "FLOAT32",
            0x31 => "FLOAT64",
            0x01 => "BYTES",
            0x02 => "STRING",
            0x0100 => "MSGPACK",
            0x0FFF_FFF0 => "ERROR",
            0x0100_0000 => "FUNCTION",
            _ => return None,
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "tag({:#x})", self.0),
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn address_tags_are_classified() {
        for t in [Tag::FLOAT64, Tag::BYTES, Tag::STRING, Tag::MSGPACK, Tag::ERROR] {
            assert_eq!(t.storage(), Storage::Address, "{t}");
        }
        assert_eq!(Tag::FUNCTION.storage(), Storage::Opaque);
        assert_eq!(Tag::FLOAT32.storage(), Storage::Immediate);
        assert_eq!(Tag::new(0x0777).storage(), Storage::Unknown);
    }

    #[test]
    fn display_falls_back_to_hex() {
        assert_eq!(Tag::MSGPACK.to_string(), "MSGPACK");
        assert_eq!(Tag::new(0x777).to_string(), "tag(0x777)");
    }
}
