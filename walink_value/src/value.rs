// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The 64-bit value word.

use core::fmt;

use crate::tag::Tag;

/// Metadata half of a [`Value`]: a flag nibble plus a 28-bit [`Tag`].
///
/// | Bit(s) | Meaning                 |
/// |--------|-------------------------|
/// | 31     | [`Meta::USER_DEFINED`]  |
/// | 30     | [`Meta::IS_ADDRESS`]    |
/// | 29     | [`Meta::FREE_FLAG`]     |
/// | 28     | reserved                |
/// | 27..0  | tag                     |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Meta(u32);

impl Meta {
    /// No flags, tag `NULL`.
    pub const NONE: Self = Self(0);
    /// Application-level extension bit. Preserved, never interpreted.
    pub const USER_DEFINED: Self = Self(0x8000_0000);
    /// The payload is a 32-bit guest heap address.
    pub const IS_ADDRESS: Self = Self(0x4000_0000);
    /// Ownership transfer: the receiver must release the referenced allocation.
    pub const FREE_FLAG: Self = Self(0x2000_0000);
    /// Bits holding the tag.
    pub const TAG_MASK: u32 = 0x0FFF_FFFF;

    /// Builds a meta word from a tag and the three flags.
    ///
    /// Tag bits outside [`Meta::TAG_MASK`] are dropped.
    #[must_use]
    #[inline]
    pub const fn build(tag: Tag, is_address: bool, free_flag: bool, user_defined: bool) -> Self {
        let mut bits = tag.bits() & Self::TAG_MASK;
        if user_defined {
            bits |= Self::USER_DEFINED.0;
        }
        if is_address {
            bits |= Self::IS_ADDRESS.0;
        }
        if free_flag {
            bits |= Self::FREE_FLAG.0;
        }
        Self(bits)
    }

    /// Wraps raw meta bits.
    #[must_use]
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw meta bits.
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the tag stored in the low 28 bits.
    #[must_use]
    #[inline]
    pub const fn tag(self) -> Tag {
        Tag::new(self.0 & Self::TAG_MASK)
    }

    /// Returns `true` if this meta word has every flag bit in `other`.
    #[must_use]
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns a copy with the flag bits of `other` set.
    #[must_use]
    #[inline]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns a copy with the flag bits of `other` cleared.
    #[must_use]
    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// A tagged 64-bit value word.
///
/// The high 32 bits are the [`Meta`] word, the low 32 bits the payload. Value words are plain
/// scalars: copying one never copies or pins the allocation it may refer to.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Value(u64);

impl Value {
    /// The canonical null word (`NULL` tag, no flags, payload zero).
    pub const NULL: Self = Self(0);

    /// Combines a meta word and a payload.
    #[must_use]
    #[inline]
    pub const fn make(meta: Meta, payload: u32) -> Self {
        Self(((meta.0 as u64) << 32) | payload as u64)
    }

    /// Wraps a raw word received across the ABI.
    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    #[must_use]
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the high 32 bits.
    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation, reason = "the upper half of a u64 fits in u32")]
    pub const fn meta(self) -> Meta {
        Meta((self.0 >> 32) as u32)
    }

    /// Returns the low 32 bits: an immediate scalar or a guest address.
    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation, reason = "masked to the low 32 bits")]
    pub const fn payload(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Returns the 28-bit tag.
    #[must_use]
    #[inline]
    pub const fn tag(self) -> Tag {
        self.meta().tag()
    }

    /// Returns `true` if the payload is a guest heap address (bit 30 of the meta word).
    #[must_use]
    #[inline]
    pub const fn is_address(self) -> bool {
        self.meta().contains(Meta::IS_ADDRESS)
    }

    /// Returns `true` if the receiver owns the referenced allocation.
    #[must_use]
    #[inline]
    pub const fn has_free_flag(self) -> bool {
        self.meta().contains(Meta::FREE_FLAG)
    }

    /// Returns `true` if the application extension bit is set.
    #[must_use]
    #[inline]
    pub const fn is_user_defined(self) -> bool {
        self.meta().contains(Meta::USER_DEFINED)
    }

    /// Returns `true` for a word with tag `FUNCTION`.
    #[must_use]
    #[inline]
    pub const fn is_function(self) -> bool {
        self.tag().bits() == Tag::FUNCTION.bits()
    }

    /// Returns the same word with the ownership-transfer bit cleared.
    ///
    /// Useful for handing out a borrowed view of a value the caller keeps owning.
    #[must_use]
    #[inline]
    pub const fn borrowed(self) -> Self {
        Self::make(self.meta().without(Meta::FREE_FLAG), self.payload())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("tag", &self.tag())
            .field("is_address", &self.is_address())
            .field("free", &self.has_free_flag())
            .field("user_defined", &self.is_user_defined())
            .field("payload", &format_args!("{:#010x}", self.payload()))
            .finish()
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Value> for u64 {
    #[inline]
    fn from(v: Value) -> Self {
        v.0
    }
}
