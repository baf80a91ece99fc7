// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use walink_value::Value;

use crate::callback::{CallbackTable, DispatchObserver};
use crate::error::HostError;
use crate::instance::GuestInstance;
use crate::walink::Walink;

/// Construction options for [`Host`].
#[derive(Default)]
pub struct HostOptions {
    /// Callbacks to reserve room for up front.
    pub callback_capacity: usize,
    /// Observer notified around every callback dispatch.
    pub observer: Option<Box<dyn DispatchObserver>>,
}

impl HostOptions {
    /// Sets [`HostOptions::callback_capacity`].
    #[must_use]
    pub fn with_callback_capacity(mut self, capacity: usize) -> Self {
        self.callback_capacity = capacity;
        self
    }

    /// Sets [`HostOptions::observer`].
    #[must_use]
    pub fn with_observer(mut self, observer: impl DispatchObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }
}

impl fmt::Debug for HostOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostOptions")
            .field("callback_capacity", &self.callback_capacity)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// A guest together with the host callbacks it can reach.
///
/// Engine bindings route the guest's `walink_callback` import to [`Host::dispatch`].
#[derive(Debug)]
pub struct Host<G> {
    walink: Walink<G>,
    callbacks: CallbackTable<G>,
}

impl<G: GuestInstance> Host<G> {
    /// Creates a host with default options.
    pub fn new(guest: G) -> Self {
        Self::with_options(guest, HostOptions::default())
    }

    /// Creates a host.
    pub fn with_options(guest: G, options: HostOptions) -> Self {
        let mut callbacks = CallbackTable::with_capacity(options.callback_capacity);
        callbacks.set_observer(options.observer);
        Self {
            walink: Walink::new(guest),
            callbacks,
        }
    }

    /// Returns the value codec.
    pub fn walink(&mut self) -> &mut Walink<G> {
        &mut self.walink
    }

    /// Returns the callback table.
    pub fn callbacks(&mut self) -> &mut CallbackTable<G> {
        &mut self.callbacks
    }

    /// Registers a host callback. See [`CallbackTable::register`].
    pub fn register<F>(&mut self, f: F) -> Value
    where
        F: FnMut(&mut Walink<G>, &[Value]) -> Result<Value, HostError> + 'static,
    {
        self.callbacks.register(f)
    }

    /// Registers a named host callback. See [`CallbackTable::register_named`].
    pub fn register_named<F>(&mut self, name: impl Into<Box<str>>, f: F) -> Value
    where
        F: FnMut(&mut Walink<G>, &[Value]) -> Result<Value, HostError> + 'static,
    {
        self.callbacks.register_named(name, f)
    }

    /// Handles a `walink_callback` import call.
    pub fn dispatch(
        &mut self,
        handle: Value,
        args_ptr: u32,
        args_len: u32,
    ) -> Result<Value, HostError> {
        self.callbacks
            .dispatch(&mut self.walink, handle, args_ptr, args_len)
    }

    /// Handles a `walink_callback` import call, reporting failures to the guest as `ERROR`.
    ///
    /// Falls back to the null word if the error message itself cannot be placed in guest memory.
    pub fn dispatch_or_error(&mut self, handle: Value, args_ptr: u32, args_len: u32) -> Value {
        match self.dispatch(handle, args_ptr, args_len) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("callback {:#x} failed: {err}", handle.payload());
                self.walink
                    .to_wl_error(&err.to_string())
                    .unwrap_or(Value::NULL)
            }
        }
    }

    /// Unwraps the guest.
    pub fn into_inner(self) -> G {
        self.walink.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use walink_value::{Tag, scalar};

    use super::*;
    use crate::callback::CallbackId;
    use crate::memory::LinearMemory;

    #[test]
    fn failing_callback_becomes_guest_error_value() {
        let mut host = Host::new(LinearMemory::new());
        let cb = host.register(|_, _| Err(HostError::Guest("boom".into())));
        let out = host.dispatch_or_error(cb, 0, 0);
        assert_eq!(out.tag(), Tag::ERROR);
        assert!(out.has_free_flag());
        assert_eq!(
            host.walink().from_wl_error_message(out).unwrap(),
            "guest error: boom"
        );
    }

    #[test]
    fn options_reach_the_table() {
        struct Count(std::rc::Rc<std::cell::Cell<u32>>);
        impl DispatchObserver for Count {
            fn dispatch_exit(&mut self, _id: CallbackId, _ok: bool) {
                self.0.set(self.0.get() + 1);
            }
        }

        let hits = std::rc::Rc::new(std::cell::Cell::new(0));
        let options = HostOptions::default()
            .with_callback_capacity(4)
            .with_observer(Count(std::rc::Rc::clone(&hits)));
        let mut host = Host::with_options(LinearMemory::new(), options);
        let cb = host.register(|_, _| Ok(scalar::from_bool(true)));
        assert_eq!(host.dispatch(cb, 0, 0), Ok(scalar::from_bool(true)));
        assert_eq!(hits.get(), 1);
    }
}
