// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callable view of host `FUNCTION` handles.
//!
//! The guest never looks inside a handle. [`Function::call`] lays the argument words out in a
//! pinned scratch frame, passes `(handle, frame address, argument count)` to the host-imported
//! `walink_callback`, and releases the frame once the host returns.
//!
//! Outside `wasm32` there is no host import to link against. Each thread may instead install a
//! dispatcher closure with [`install_host_callback`]; an in-process host reads the frame through
//! the [registry](crate::registry).

use walink_value::format::encode_words;
use walink_value::{Tag, Value, WalinkError};

use crate::registry::registry;

/// A borrowed, callable view of a `FUNCTION` value.
///
/// The view neither owns nor frees the handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Function {
    handle: Value,
}

/// Returns a callable view of `v`.
pub fn to_function(v: Value) -> Result<Function, WalinkError> {
    if v.tag() != Tag::FUNCTION {
        return Err(WalinkError::NotCallable { found: v.tag() });
    }
    Ok(Function { handle: v })
}

impl Function {
    /// Returns the underlying handle.
    #[must_use]
    pub fn handle(&self) -> Value {
        self.handle
    }

    /// Invokes the host callback synchronously.
    ///
    /// Arguments carrying `FREE_FLAG` are consumed by the host. The returned value's `FREE_FLAG`
    /// says whether the caller must release it.
    pub fn call(&self, args: &[Value]) -> Result<Value, WalinkError> {
        let frame = ArgsFrame::new(args)?;
        log::debug!(
            "callback {:#x} with {} args at {:#010x}",
            self.handle.payload(),
            frame.len,
            frame.addr
        );
        host::dispatch(self.handle, frame.addr, frame.len)
    }
}

/// Argument words pinned for the duration of one call.
struct ArgsFrame {
    addr: u32,
    len: u32,
}

impl ArgsFrame {
    fn new(args: &[Value]) -> Result<Self, WalinkError> {
        let len = u32::try_from(args.len()).map_err(|_| WalinkError::OutOfMemory {
            size: args.len() as u64,
        })?;
        if args.is_empty() {
            return Ok(Self { addr: 0, len });
        }
        let words = encode_words(args);
        let size = u32::try_from(words.len()).map_err(|_| WalinkError::OutOfMemory {
            size: words.len() as u64,
        })?;
        let addr = registry().allocate_with(size, |block| {
            block.copy_from_slice(&words);
            Ok(())
        })?;
        Ok(Self { addr, len })
    }
}

impl Drop for ArgsFrame {
    fn drop(&mut self) {
        if self.addr != 0 {
            registry().release(self.addr);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[allow(unsafe_code, reason = "host imports are foreign functions")]
mod host {
    use walink_value::{Value, WalinkError};

    #[link(wasm_import_module = "env")]
    unsafe extern "C" {
        fn walink_callback(handle: Value, args_ptr: u32, args_len: u32) -> Value;
    }

    pub(super) fn dispatch(
        handle: Value,
        args_ptr: u32,
        args_len: u32,
    ) -> Result<Value, WalinkError> {
        // SAFETY: the import only receives plain integers; `args_ptr` names a frame that stays
        // pinned until the caller's `ArgsFrame` drops after this returns.
        Ok(unsafe { walink_callback(handle, args_ptr, args_len) })
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::cell::RefCell;
    use std::rc::Rc;

    use walink_value::{Value, WalinkError};

    use super::HostCallback;

    thread_local! {
        static DISPATCHER: RefCell<Option<Rc<HostCallback>>> = const { RefCell::new(None) };
    }

    pub(super) fn install(f: Rc<HostCallback>) -> Option<Rc<HostCallback>> {
        DISPATCHER.with(|d| d.borrow_mut().replace(f))
    }

    pub(super) fn uninstall() -> Option<Rc<HostCallback>> {
        DISPATCHER.with(|d| d.borrow_mut().take())
    }

    pub(super) fn dispatch(
        handle: Value,
        args_ptr: u32,
        args_len: u32,
    ) -> Result<Value, WalinkError> {
        // Cloned out so a dispatcher can re-enter guest code that calls back again.
        let f = DISPATCHER
            .with(|d| d.borrow().clone())
            .ok_or(WalinkError::NotCallable {
                found: handle.tag(),
            })?;
        Ok(f(handle, args_ptr, args_len))
    }
}

/// Signature of `walink_callback`: `(handle, args_ptr, args_len) -> result`.
#[cfg(not(target_arch = "wasm32"))]
pub type HostCallback = dyn Fn(Value, u32, u32) -> Value;

/// Installs the dispatcher that stands in for `walink_callback` on the current thread.
///
/// Returns the previously installed dispatcher, if any.
#[cfg(not(target_arch = "wasm32"))]
pub fn install_host_callback<F>(f: F) -> Option<std::rc::Rc<HostCallback>>
where
    F: Fn(Value, u32, u32) -> Value + 'static,
{
    host::install(std::rc::Rc::new(f))
}

/// Removes the current thread's dispatcher.
#[cfg(not(target_arch = "wasm32"))]
pub fn uninstall_host_callback() -> Option<std::rc::Rc<HostCallback>> {
    host::uninstall()
}
