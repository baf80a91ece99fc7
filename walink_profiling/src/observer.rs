// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::vec::Vec;

use walink_host::{CallbackId, DispatchObserver, Value};

use crate::resolver::{DefaultLabelResolver, LabelResolver, default_callback_label};

type BackendGuard = tracy_client::Span;

struct SpanEntry {
    id: CallbackId,
    // Dropping the guard closes the span.
    _guard: Option<BackendGuard>,
}

/// A `DispatchObserver` that emits one Tracy span per host callback dispatch.
pub struct ProfilingDispatchObserver<R = DefaultLabelResolver> {
    resolver: R,
    stack: Vec<SpanEntry>,
}

impl ProfilingDispatchObserver<DefaultLabelResolver> {
    /// Create a new observer with id-based labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LabelResolver> ProfilingDispatchObserver<R> {
    /// Create a new observer with a custom label resolver.
    #[must_use]
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
        }
    }

    /// Number of dispatches currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn start_span(label: &str, id: CallbackId) -> Option<BackendGuard> {
        let client = tracy_client::Client::running()?;
        Some(client.span_alloc(Some(label), "walink.callback", "walink", id.as_u32(), 0))
    }

    // Drop in LIFO order so nested spans close inner-to-outer.
    fn drop_active_spans(&mut self) {
        while self.stack.pop().is_some() {}
    }
}

impl<R: LabelResolver> DispatchObserver for ProfilingDispatchObserver<R> {
    fn dispatch_enter(&mut self, id: CallbackId, name: Option<&str>, _args: &[Value]) {
        let label = self
            .resolver
            .callback_label(id, name)
            .unwrap_or_else(|| default_callback_label(id));
        let guard = Self::start_span(&label, id);
        self.stack.push(SpanEntry { id, _guard: guard });
    }

    fn dispatch_exit(&mut self, id: CallbackId, _ok: bool) {
        if self.stack.last().is_some_and(|top| top.id == id) {
            self.stack.pop();
            return;
        }
        // If the stack got out of sync, drop any active spans to avoid leaking.
        self.drop_active_spans();
    }
}

impl<R> Default for ProfilingDispatchObserver<R>
where
    R: LabelResolver + Default,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<R> std::fmt::Debug for ProfilingDispatchObserver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingDispatchObserver")
            .field("stack_depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}
