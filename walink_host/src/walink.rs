// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side encoding and decoding of value words.
//!
//! Encoders for address tags allocate through the guest's `walink_alloc`, fill the container
//! through guest memory and return a word with `FREE_FLAG` set: the guest consumes it. Decoders
//! copy the payload out of guest memory and then call `walink_free` when the word carries
//! `FREE_FLAG`, so the host consumes whatever the guest hands over.

use walink_value::container::{ByteContainerHeader, FLOAT_CONTAINER_SIZE, HEADER_SIZE};
use walink_value::{Meta, Tag, Value, WalinkError, scalar};

use crate::error::HostError;
use crate::instance::GuestInstance;

#[allow(clippy::cast_possible_truncation, reason = "container layouts are a few bytes")]
const PAYLOAD_OFFSET: u32 = HEADER_SIZE as u32;
#[allow(clippy::cast_possible_truncation, reason = "container layouts are a few bytes")]
const FLOAT_SIZE: u32 = FLOAT_CONTAINER_SIZE as u32;

/// A host value decoded from a guest word.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    /// `NULL`.
    Null,
    /// `BOOLEAN`.
    Bool(bool),
    /// `SINT8`.
    I8(i8),
    /// `UINT8`.
    U8(u8),
    /// `SINT16`.
    I16(i16),
    /// `UINT16`.
    U16(u16),
    /// `SINT32`.
    I32(i32),
    /// `UINT32`.
    U32(u32),
    /// `FLOAT32`.
    F32(f32),
    /// `FLOAT64`.
    F64(f64),
    /// `BYTES`.
    Bytes(Vec<u8>),
    /// `STRING`.
    String(String),
    /// `MSGPACK`, as the raw serialized blob.
    Msgpack(Vec<u8>),
    /// `FUNCTION` handle id.
    Function(u32),
    /// A word with an application-defined tag, passed through untouched.
    Other(Value),
}

/// Typed access to a guest through its walink exports.
#[derive(Debug)]
pub struct Walink<G> {
    guest: G,
}

impl<G: GuestInstance> Walink<G> {
    /// Wraps a guest instance.
    pub fn new(guest: G) -> Self {
        Self { guest }
    }

    /// Returns the guest.
    pub fn guest(&self) -> &G {
        &self.guest
    }

    /// Returns the guest mutably.
    pub fn guest_mut(&mut self) -> &mut G {
        &mut self.guest
    }

    /// Unwraps the guest.
    pub fn into_inner(self) -> G {
        self.guest
    }

    // ---- allocation ----

    /// Allocates `size` bytes in the guest and returns the address.
    pub fn allocate(&mut self, size: u32) -> Result<u32, HostError> {
        let raw = self.guest.alloc(size)?;
        match raw.payload() {
            0 => Err(HostError::AllocFailed { size }),
            addr => Ok(addr),
        }
    }

    /// Calls `walink_free` on `v`, returning whether the guest released anything.
    pub fn release(&mut self, v: Value) -> Result<bool, HostError> {
        let out = self.guest.free(v)?;
        Ok(scalar::to_bool(out)?)
    }

    fn owned(addr: u32, tag: Tag) -> Value {
        Value::make(Meta::build(tag, true, true, false), addr)
    }

    fn encode_byte_container(&mut self, tag: Tag, payload: &[u8]) -> Result<Value, HostError> {
        let header = ByteContainerHeader::exact(payload.len())?;
        let addr = self.allocate(header.allocation_size()?)?;
        let v = Self::owned(addr, tag);
        let written = self
            .guest
            .write(addr, 0, &header.to_bytes())
            .and_then(|()| self.guest.write(addr, PAYLOAD_OFFSET, payload));
        if let Err(err) = written {
            self.release(v)?;
            return Err(err);
        }
        Ok(v)
    }

    // ---- encoders ----

    /// Encodes a boolean.
    pub fn to_wl_bool(&self, v: bool) -> Value {
        scalar::from_bool(v)
    }

    /// Encodes an `i8`.
    pub fn to_wl_i8(&self, v: i8) -> Value {
        scalar::from_i8(v)
    }

    /// Encodes a `u8`.
    pub fn to_wl_u8(&self, v: u8) -> Value {
        scalar::from_u8(v)
    }

    /// Encodes an `i16`.
    pub fn to_wl_i16(&self, v: i16) -> Value {
        scalar::from_i16(v)
    }

    /// Encodes a `u16`.
    pub fn to_wl_u16(&self, v: u16) -> Value {
        scalar::from_u16(v)
    }

    /// Encodes an `i32`.
    pub fn to_wl_i32(&self, v: i32) -> Value {
        scalar::from_i32(v)
    }

    /// Encodes a `u32`.
    pub fn to_wl_u32(&self, v: u32) -> Value {
        scalar::from_u32(v)
    }

    /// Encodes an `f32`.
    pub fn to_wl_f32(&self, v: f32) -> Value {
        scalar::from_f32(v)
    }

    /// Encodes an `f64` into a guest float container.
    pub fn to_wl_float64(&mut self, v: f64) -> Result<Value, HostError> {
        let addr = self.allocate(FLOAT_SIZE)?;
        let out = Self::owned(addr, Tag::FLOAT64);
        if let Err(err) = self.guest.write(addr, 0, &v.to_bits().to_le_bytes()) {
            self.release(out)?;
            return Err(err);
        }
        Ok(out)
    }

    /// Encodes bytes into a guest `BYTES` container.
    pub fn to_wl_bytes(&mut self, bytes: &[u8]) -> Result<Value, HostError> {
        self.encode_byte_container(Tag::BYTES, bytes)
    }

    /// Encodes a string into a guest `STRING` container.
    pub fn to_wl_string(&mut self, s: &str) -> Result<Value, HostError> {
        self.encode_byte_container(Tag::STRING, s.as_bytes())
    }

    /// Copies an already serialized msgpack blob into a guest `MSGPACK` container.
    pub fn to_wl_msgpack_bytes(&mut self, blob: &[u8]) -> Result<Value, HostError> {
        self.encode_byte_container(Tag::MSGPACK, blob)
    }

    /// Encodes an error message into a guest `ERROR` container.
    pub fn to_wl_error(&mut self, msg: &str) -> Result<Value, HostError> {
        self.encode_byte_container(Tag::ERROR, msg.as_bytes())
    }

    /// Serializes `value` with named fields into a guest `MSGPACK` container.
    #[cfg(feature = "msgpack")]
    pub fn to_wl_msgpack<T: serde::Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<Value, HostError> {
        let blob = rmp_serde::to_vec_named(value).map_err(|e| HostError::Msgpack(e.to_string()))?;
        self.to_wl_msgpack_bytes(&blob)
    }

    // ---- decoders ----

    /// Decodes a boolean.
    pub fn from_wl_bool(&self, v: Value) -> Result<bool, HostError> {
        Ok(scalar::to_bool(v)?)
    }

    /// Decodes an `i8`.
    pub fn from_wl_i8(&self, v: Value) -> Result<i8, HostError> {
        Ok(scalar::to_i8(v)?)
    }

    /// Decodes a `u8`.
    pub fn from_wl_u8(&self, v: Value) -> Result<u8, HostError> {
        Ok(scalar::to_u8(v)?)
    }

    /// Decodes an `i16`.
    pub fn from_wl_i16(&self, v: Value) -> Result<i16, HostError> {
        Ok(scalar::to_i16(v)?)
    }

    /// Decodes a `u16`.
    pub fn from_wl_u16(&self, v: Value) -> Result<u16, HostError> {
        Ok(scalar::to_u16(v)?)
    }

    /// Decodes an `i32`.
    pub fn from_wl_i32(&self, v: Value) -> Result<i32, HostError> {
        Ok(scalar::to_i32(v)?)
    }

    /// Decodes a `u32`.
    pub fn from_wl_u32(&self, v: Value) -> Result<u32, HostError> {
        Ok(scalar::to_u32(v)?)
    }

    /// Decodes an `f32`.
    pub fn from_wl_f32(&self, v: Value) -> Result<f32, HostError> {
        Ok(scalar::to_f32(v)?)
    }

    fn expect_address(v: Value, tag: Tag) -> Result<(), HostError> {
        if v.tag() != tag || !v.is_address() {
            return Err(WalinkError::TypeMismatch {
                expected: tag,
                found: v.tag(),
            }
            .into());
        }
        Ok(())
    }

    /// Runs `read` against the container behind `v`, then frees it if the host owns it.
    ///
    /// The outcome of `read` is returned even when the free fails; that failure is only logged.
    fn consume<T: Default>(
        &mut self,
        v: Value,
        read: impl FnOnce(&G, u32) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let addr = v.payload();
        if addr == 0 {
            return Ok(T::default());
        }
        let out = read(&self.guest, addr);
        if v.has_free_flag() {
            if let Err(err) = self.release(v) {
                log::warn!("walink_free({addr:#010x}) failed after decode: {err}");
            }
        }
        out
    }

    fn decode_byte_container(&mut self, v: Value, tag: Tag) -> Result<Vec<u8>, HostError> {
        Self::expect_address(v, tag)?;
        self.consume(v, |guest, addr| {
            let mut raw = [0_u8; HEADER_SIZE];
            guest.read(addr, 0, &mut raw)?;
            let header = ByteContainerHeader::read(&raw)?;
            if header.size > header.cap {
                return Err(WalinkError::MalformedContainer.into());
            }
            let size = usize::try_from(header.size).map_err(|_| WalinkError::MalformedContainer)?;
            let mut payload = vec![0_u8; size];
            guest.read(addr, PAYLOAD_OFFSET, &mut payload)?;
            Ok(payload)
        })
    }

    /// Decodes a `FLOAT64` value.
    pub fn from_wl_float64(&mut self, v: Value) -> Result<f64, HostError> {
        Self::expect_address(v, Tag::FLOAT64)?;
        self.consume(v, |guest, addr| {
            let mut raw = [0_u8; FLOAT_CONTAINER_SIZE];
            guest.read(addr, 0, &mut raw)?;
            Ok(f64::from_bits(u64::from_le_bytes(raw)))
        })
    }

    /// Decodes a `BYTES` value.
    pub fn from_wl_bytes(&mut self, v: Value) -> Result<Vec<u8>, HostError> {
        self.decode_byte_container(v, Tag::BYTES)
    }

    /// Decodes a `STRING` value.
    pub fn from_wl_string(&mut self, v: Value) -> Result<String, HostError> {
        let bytes = self.decode_byte_container(v, Tag::STRING)?;
        String::from_utf8(bytes).map_err(|_| WalinkError::InvalidUtf8.into())
    }

    /// Decodes a `MSGPACK` value to its raw blob.
    pub fn from_wl_msgpack_bytes(&mut self, v: Value) -> Result<Vec<u8>, HostError> {
        self.decode_byte_container(v, Tag::MSGPACK)
    }

    /// Decodes an `ERROR` value to its message.
    pub fn from_wl_error_message(&mut self, v: Value) -> Result<String, HostError> {
        let bytes = self.decode_byte_container(v, Tag::ERROR)?;
        String::from_utf8(bytes).map_err(|_| WalinkError::InvalidUtf8.into())
    }

    /// Deserializes a `MSGPACK` value.
    #[cfg(feature = "msgpack")]
    pub fn from_wl_msgpack<T: serde::de::DeserializeOwned>(
        &mut self,
        v: Value,
    ) -> Result<T, HostError> {
        let blob = self.from_wl_msgpack_bytes(v)?;
        rmp_serde::from_slice(&blob).map_err(|e| HostError::Msgpack(e.to_string()))
    }

    /// Decodes any core value, dispatching on its tag.
    ///
    /// An `ERROR` value is consumed and surfaces as [`HostError::Guest`]. Words with tags outside
    /// the core set come back as [`HostValue::Other`] without touching guest memory.
    pub fn decode(&mut self, v: Value) -> Result<HostValue, HostError> {
        Ok(match v.tag() {
            Tag::NULL => HostValue::Null,
            Tag::BOOLEAN => HostValue::Bool(self.from_wl_bool(v)?),
            Tag::SINT8 => HostValue::I8(self.from_wl_i8(v)?),
            Tag::UINT8 => HostValue::U8(self.from_wl_u8(v)?),
            Tag::SINT16 => HostValue::I16(self.from_wl_i16(v)?),
            Tag::UINT16 => HostValue::U16(self.from_wl_u16(v)?),
            Tag::SINT32 => HostValue::I32(self.from_wl_i32(v)?),
            Tag::UINT32 => HostValue::U32(self.from_wl_u32(v)?),
            Tag::FLOAT32 => HostValue::F32(self.from_wl_f32(v)?),
            Tag::FLOAT64 => HostValue::F64(self.from_wl_float64(v)?),
            Tag::BYTES => HostValue::Bytes(self.from_wl_bytes(v)?),
            Tag::STRING => HostValue::String(self.from_wl_string(v)?),
            Tag::MSGPACK => HostValue::Msgpack(self.from_wl_msgpack_bytes(v)?),
            Tag::FUNCTION => HostValue::Function(v.payload()),
            Tag::ERROR => return Err(HostError::Guest(self.from_wl_error_message(v)?)),
            _ => HostValue::Other(v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LinearMemory;

    fn walink() -> Walink<LinearMemory> {
        Walink::new(LinearMemory::new())
    }

    /// A guest whose `walink_free` always traps.
    #[derive(Debug, Default)]
    struct TrappingFree(LinearMemory);

    impl GuestInstance for TrappingFree {
        fn alloc(&mut self, size: u32) -> Result<Value, HostError> {
            self.0.alloc(size)
        }

        fn free(&mut self, _v: Value) -> Result<Value, HostError> {
            Err(HostError::Guest("free trapped".into()))
        }

        fn read(&self, addr: u32, offset: u32, out: &mut [u8]) -> Result<(), HostError> {
            self.0.read(addr, offset, out)
        }

        fn write(&mut self, addr: u32, offset: u32, data: &[u8]) -> Result<(), HostError> {
            self.0.write(addr, offset, data)
        }
    }

    #[test]
    fn decoded_value_survives_a_failed_free() {
        let mut wl = Walink::new(TrappingFree::default());
        let v = wl.to_wl_string("kept").unwrap();
        assert_eq!(wl.from_wl_string(v), Ok("kept".to_owned()));

        let bad = wl.to_wl_bytes(b"abcd").unwrap();
        let header = ByteContainerHeader { cap: 1, size: 4 }.to_bytes();
        wl.guest_mut().write(bad.payload(), 0, &header).unwrap();
        assert_eq!(
            wl.from_wl_bytes(bad),
            Err(HostError::Abi(WalinkError::MalformedContainer)),
            "the read error wins over the free error"
        );
    }

    #[test]
    fn string_container_matches_guest_layout() {
        let mut wl = walink();
        let v = wl.to_wl_string("hello").unwrap();
        assert_eq!(v.tag(), Tag::STRING);
        assert!(v.is_address() && v.has_free_flag());

        let mut raw = [0_u8; 13];
        wl.guest().read(v.payload(), 0, &mut raw).unwrap();
        assert_eq!(&raw[..8], &[5, 0, 0, 0, 5, 0, 0, 0]);
        assert_eq!(&raw[8..], b"hello");
    }

    #[test]
    fn decoding_an_owned_value_frees_it() {
        let mut wl = walink();
        let v = wl.to_wl_bytes(&[1, 2, 3]).unwrap();
        assert!(wl.guest().contains(v.payload()));
        assert_eq!(wl.from_wl_bytes(v).unwrap(), [1, 2, 3]);
        assert!(!wl.guest().contains(v.payload()));
    }

    #[test]
    fn decoding_a_borrowed_value_keeps_it() {
        let mut wl = walink();
        let v = wl.to_wl_float64(6.25).unwrap().borrowed();
        assert_eq!(wl.from_wl_float64(v), Ok(6.25));
        assert!(wl.guest().contains(v.payload()));
    }

    #[test]
    fn float64_is_little_endian_in_guest_memory() {
        let mut wl = walink();
        let v = wl.to_wl_float64(1.5).unwrap();
        let mut raw = [0_u8; 8];
        wl.guest().read(v.payload(), 0, &mut raw).unwrap();
        assert_eq!(raw, 1.5_f64.to_bits().to_le_bytes());
    }

    #[test]
    fn error_value_decodes_to_guest_error() {
        let mut wl = walink();
        let v = wl.to_wl_error("bad input").unwrap();
        assert_eq!(wl.decode(v), Err(HostError::Guest("bad input".into())));
        assert_eq!(wl.guest().live_allocations(), 0);
    }

    #[test]
    fn decode_dispatches_on_tag() {
        let mut wl = walink();
        assert_eq!(wl.decode(Value::NULL), Ok(HostValue::Null));
        assert_eq!(wl.decode(wl.to_wl_i8(-1)), Ok(HostValue::I8(-1)));
        assert_eq!(wl.decode(wl.to_wl_u16(65535)), Ok(HostValue::U16(65535)));
        let s = wl.to_wl_string("x").unwrap();
        assert_eq!(wl.decode(s), Ok(HostValue::String("x".into())));
        let custom = Value::make(Meta::build(Tag::new(0x777), false, false, true), 9);
        assert_eq!(wl.decode(custom), Ok(HostValue::Other(custom)));
    }

    #[test]
    fn tag_mismatch_does_not_free() {
        let mut wl = walink();
        let v = wl.to_wl_bytes(b"abc").unwrap();
        assert!(matches!(
            wl.from_wl_string(v),
            Err(HostError::Abi(WalinkError::TypeMismatch { .. }))
        ));
        assert!(wl.guest().contains(v.payload()));
    }

    #[test]
    fn null_address_decodes_to_zero() {
        let mut wl = walink();
        let v = Value::make(Meta::build(Tag::STRING, true, true, false), 0);
        assert_eq!(wl.from_wl_string(v).unwrap(), "");
        let v = Value::make(Meta::build(Tag::FLOAT64, true, true, false), 0);
        assert_eq!(wl.from_wl_float64(v), Ok(0.0));
    }

    #[test]
    fn malformed_header_is_reported() {
        let mut wl = walink();
        let v = wl.to_wl_bytes(b"abcd").unwrap();
        let bad = ByteContainerHeader { cap: 2, size: 4 }.to_bytes();
        wl.guest_mut().write(v.payload(), 0, &bad).unwrap();
        assert_eq!(
            wl.from_wl_bytes(v),
            Err(HostError::Abi(WalinkError::MalformedContainer))
        );
        assert!(!wl.guest().contains(v.payload()));
    }

    #[test]
    fn failed_allocation_surfaces() {
        let mut wl = Walink::new(LinearMemory::with_limit(16));
        assert_eq!(
            wl.to_wl_string("this does not fit"),
            Err(HostError::AllocFailed { size: 25 })
        );
    }

    #[cfg(feature = "msgpack")]
    #[test]
    fn msgpack_round_trips_through_guest_memory() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let mut wl = walink();
        let v = wl.to_wl_msgpack(&Point { x: 1, y: -2 }).unwrap();
        assert_eq!(wl.from_wl_msgpack::<Point>(v), Ok(Point { x: 1, y: -2 }));
        assert_eq!(wl.guest().live_allocations(), 0);
    }

    proptest::proptest! {
        #[test]
        fn owned_buffers_round_trip_without_leaking(
            s in ".*",
            bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..512),
            x in proptest::num::f64::ANY,
        ) {
            let mut wl = walink();
            let sv = wl.to_wl_string(&s).unwrap();
            let bv = wl.to_wl_bytes(&bytes).unwrap();
            let fv = wl.to_wl_float64(x).unwrap();
            proptest::prop_assert_eq!(wl.guest().live_allocations(), 3);

            proptest::prop_assert_eq!(wl.from_wl_string(sv).unwrap(), s);
            proptest::prop_assert_eq!(wl.from_wl_bytes(bv).unwrap(), bytes);
            proptest::prop_assert_eq!(wl.from_wl_float64(fv).unwrap().to_bits(), x.to_bits());
            proptest::prop_assert_eq!(wl.guest().live_allocations(), 0);
        }
    }
}
