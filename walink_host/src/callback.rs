// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host callbacks reachable from the guest through `walink_callback`.
//!
//! The guest only ever sees a `FUNCTION` word whose payload is a [`CallbackId`]. When it calls
//! `walink_callback(handle, args_ptr, args_len)`, the host reads `args_len` little-endian words
//! from `args_ptr`, looks the id up and runs the closure. The argument array belongs to the guest
//! and is not retained past the call.

use hashbrown::HashMap;
use walink_value::format::{WORD_SIZE, decode_words};
use walink_value::{Meta, Tag, Value, WalinkError};

use crate::error::HostError;
use crate::instance::GuestInstance;
use crate::walink::Walink;

/// Identifier of a registered callback; the payload of its `FUNCTION` word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CallbackId(u32);

impl CallbackId {
    /// Creates a callback id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the `FUNCTION` word that names this callback.
    #[inline]
    pub const fn to_value(self) -> Value {
        Value::make(Meta::build(Tag::FUNCTION, false, false, false), self.0)
    }
}

/// A host closure callable from the guest.
pub type HostFn<G> = dyn FnMut(&mut Walink<G>, &[Value]) -> Result<Value, HostError>;

/// Observes callback dispatch.
///
/// Both hooks default to no-ops.
pub trait DispatchObserver {
    /// Called after the arguments are read, before the closure runs.
    fn dispatch_enter(&mut self, _id: CallbackId, _name: Option<&str>, _args: &[Value]) {}

    /// Called after the closure returns, whether it succeeded or not.
    fn dispatch_exit(&mut self, _id: CallbackId, _ok: bool) {}
}

struct Entry<G> {
    name: Option<Box<str>>,
    f: Box<HostFn<G>>,
}

/// Registered host callbacks.
pub struct CallbackTable<G> {
    entries: HashMap<CallbackId, Entry<G>>,
    next_id: u32,
    observer: Option<Box<dyn DispatchObserver>>,
}

impl<G> Default for CallbackTable<G> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<G> core::fmt::Debug for CallbackTable<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .field("observed", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<G> CallbackTable<G> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` callbacks.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            next_id: 1,
            observer: None,
        }
    }

    /// Installs `observer`, returning the previous one.
    pub fn set_observer(
        &mut self,
        observer: Option<Box<dyn DispatchObserver>>,
    ) -> Option<Box<dyn DispatchObserver>> {
        core::mem::replace(&mut self.observer, observer)
    }

    /// Registers `f` and returns the `FUNCTION` word the guest can call it through.
    ///
    /// Ids start at 1. An id is never handed out while a callback is registered under it.
    pub fn register<F>(&mut self, f: F) -> Value
    where
        F: FnMut(&mut Walink<G>, &[Value]) -> Result<Value, HostError> + 'static,
    {
        self.insert(None, Box::new(f))
    }

    /// Registers `f` under a display name used by observers.
    pub fn register_named<F>(&mut self, name: impl Into<Box<str>>, f: F) -> Value
    where
        F: FnMut(&mut Walink<G>, &[Value]) -> Result<Value, HostError> + 'static,
    {
        self.insert(Some(name.into()), Box::new(f))
    }

    fn insert(&mut self, name: Option<Box<str>>, f: Box<HostFn<G>>) -> Value {
        let id = self.fresh_id();
        self.entries.insert(id, Entry { name, f });
        id.to_value()
    }

    // Skips 0 and every id still registered once the counter wraps.
    fn fresh_id(&mut self) -> CallbackId {
        loop {
            let id = CallbackId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }

    /// Removes the callback named by `handle`. Returns `false` if nothing was registered.
    pub fn unregister(&mut self, handle: Value) -> bool {
        self.entries.remove(&CallbackId(handle.payload())).is_some()
    }

    /// Returns the display name of `id`, if it has one.
    #[must_use]
    pub fn name(&self, id: CallbackId) -> Option<&str> {
        self.entries.get(&id)?.name.as_deref()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<G: GuestInstance> CallbackTable<G> {
    /// Handles one `walink_callback(handle, args_ptr, args_len)` import call.
    pub fn dispatch(
        &mut self,
        walink: &mut Walink<G>,
        handle: Value,
        args_ptr: u32,
        args_len: u32,
    ) -> Result<Value, HostError> {
        if handle.tag() != Tag::FUNCTION {
            return Err(HostError::NotCallable {
                found: handle.tag(),
            });
        }
        let id = CallbackId(handle.payload());
        let args = read_args(walink.guest(), args_ptr, args_len)?;
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(HostError::UnknownCallback(id.0))?;
        log::debug!("dispatch callback {} with {} args", id.0, args.len());

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.dispatch_enter(id, entry.name.as_deref(), &args);
        }
        let out = (entry.f)(walink, &args);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.dispatch_exit(id, out.is_ok());
        }
        out
    }
}

fn read_args<G: GuestInstance>(
    guest: &G,
    args_ptr: u32,
    args_len: u32,
) -> Result<Vec<Value>, HostError> {
    if args_len == 0 {
        return Ok(Vec::new());
    }
    let count = usize::try_from(args_len).map_err(|_| WalinkError::MalformedContainer)?;
    let len = count
        .checked_mul(WORD_SIZE)
        .ok_or(WalinkError::MalformedContainer)?;
    let mut raw = vec![0_u8; len];
    guest.read(args_ptr, 0, &mut raw)?;
    Ok(decode_words(&raw, count).ok_or(WalinkError::MalformedContainer)?)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use walink_value::format::encode_words;
    use walink_value::scalar;

    use super::*;
    use crate::memory::LinearMemory;

    fn place_args(wl: &mut Walink<LinearMemory>, args: &[Value]) -> u32 {
        let words = encode_words(args);
        let addr = wl.allocate(u32::try_from(words.len()).unwrap()).unwrap();
        wl.guest_mut().write(addr, 0, &words).unwrap();
        addr
    }

    #[test]
    fn ids_start_at_one() {
        let mut table = CallbackTable::<LinearMemory>::new();
        let a = table.register(|_, _| Ok(Value::NULL));
        let b = table.register(|_, _| Ok(Value::NULL));
        assert_eq!(a.tag(), Tag::FUNCTION);
        assert!(!a.is_address());
        assert_eq!(a.payload(), 1);
        assert_eq!(b.payload(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn wrapped_counter_skips_live_ids() {
        let mut table = CallbackTable::<LinearMemory>::new();
        let first = table.register(|_, _| Ok(Value::NULL));
        table.next_id = u32::MAX;
        let last = table.register(|_, _| Ok(Value::NULL));
        let wrapped = table.register(|_, _| Ok(Value::NULL));

        assert_eq!(last.payload(), u32::MAX);
        assert_eq!(wrapped.payload(), 2, "id 1 is still live");
        assert_ne!(wrapped, first);
        assert_eq!(table.len(), 3);

        assert!(table.unregister(first));
        table.next_id = u32::MAX;
        table.unregister(last);
        assert_eq!(table.register(|_, _| Ok(Value::NULL)).payload(), u32::MAX);
        assert_eq!(table.register(|_, _| Ok(Value::NULL)).payload(), 1);
    }

    #[test]
    fn dispatch_reads_arguments_from_guest_memory() {
        let mut wl = Walink::new(LinearMemory::new());
        let mut table = CallbackTable::new();
        let cb = table.register(|wl: &mut Walink<LinearMemory>, args: &[Value]| {
            let n = wl.from_wl_i32(args[0])?;
            Ok(wl.to_wl_i32(n * 2))
        });
        let ptr = place_args(&mut wl, &[scalar::from_i32(7)]);
        let out = table.dispatch(&mut wl, cb, ptr, 1).unwrap();
        assert_eq!(wl.from_wl_i32(out), Ok(14));
    }

    #[test]
    fn closures_may_encode_into_guest_memory() {
        let mut wl = Walink::new(LinearMemory::new());
        let mut table = CallbackTable::new();
        let cb = table.register(|wl: &mut Walink<LinearMemory>, args: &[Value]| {
            let s = wl.from_wl_string(args[0])?;
            wl.to_wl_string(&s.to_uppercase())
        });
        let arg = wl.to_wl_string("shout").unwrap();
        let ptr = place_args(&mut wl, &[arg]);
        let out = table.dispatch(&mut wl, cb, ptr, 1).unwrap();
        assert_eq!(wl.from_wl_string(out).unwrap(), "SHOUT");
        assert!(!wl.guest().contains(arg.payload()), "owned argument is consumed");
    }

    #[test]
    fn zero_args_skip_memory() {
        let mut wl = Walink::new(LinearMemory::new());
        let mut table = CallbackTable::new();
        let cb = table.register(|_: &mut Walink<LinearMemory>, args: &[Value]| {
            Ok(scalar::from_u32(u32::try_from(args.len()).unwrap_or(u32::MAX)))
        });
        let out = table.dispatch(&mut wl, cb, 0, 0).unwrap();
        assert_eq!(scalar::to_u32(out), Ok(0));
    }

    #[test]
    fn unknown_and_non_function_handles() {
        let mut wl = Walink::new(LinearMemory::new());
        let mut table = CallbackTable::<LinearMemory>::new();
        assert_eq!(
            table.dispatch(&mut wl, CallbackId::new(42).to_value(), 0, 0),
            Err(HostError::UnknownCallback(42))
        );
        assert_eq!(
            table.dispatch(&mut wl, scalar::from_u32(1), 0, 0),
            Err(HostError::NotCallable {
                found: Tag::UINT32
            })
        );
        let cb = table.register(|_, _| Ok(Value::NULL));
        assert!(table.unregister(cb));
        assert!(!table.unregister(cb));
        assert_eq!(
            table.dispatch(&mut wl, cb, 0, 0),
            Err(HostError::UnknownCallback(1))
        );
    }

    #[test]
    fn observer_sees_enter_and_exit() {
        struct Log(Rc<RefCell<Vec<String>>>);

        impl DispatchObserver for Log {
            fn dispatch_enter(&mut self, id: CallbackId, name: Option<&str>, args: &[Value]) {
                self.0.borrow_mut().push(format!(
                    "enter {} {} {}",
                    id.as_u32(),
                    name.unwrap_or("-"),
                    args.len()
                ));
            }

            fn dispatch_exit(&mut self, id: CallbackId, ok: bool) {
                self.0.borrow_mut().push(format!("exit {} {ok}", id.as_u32()));
            }
        }

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut wl = Walink::new(LinearMemory::new());
        let mut table = CallbackTable::<LinearMemory>::new();
        table.set_observer(Some(Box::new(Log(Rc::clone(&events)))));
        let ok = table.register_named("ok", |_, _| Ok(Value::NULL));
        let bad = table.register(|_, _| Err(HostError::Guest("nope".into())));

        table.dispatch(&mut wl, ok, 0, 0).unwrap();
        assert!(table.dispatch(&mut wl, bad, 0, 0).is_err());
        assert_eq!(
            *events.borrow(),
            ["enter 1 ok 0", "exit 1 true", "enter 2 - 0", "exit 2 false"]
        );
        assert_eq!(table.name(CallbackId::new(1)), Some("ok"));
    }
}
