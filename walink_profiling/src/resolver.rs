// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::string::String;

use walink_host::CallbackId;

/// Optional label resolver for callback spans.
///
/// Return `None` to fall back to the default id-based label.
pub trait LabelResolver {
    /// Resolve a label for a dispatch of `id`, registered under `name` if it has one.
    fn callback_label(&mut self, _id: CallbackId, _name: Option<&str>) -> Option<String> {
        None
    }
}

/// Default resolver that keeps stable id-based labels.
#[derive(Default, Debug)]
pub struct DefaultLabelResolver;

impl LabelResolver for DefaultLabelResolver {}

/// Resolver that uses the names callbacks were registered under.
#[derive(Default, Debug)]
pub struct NamedLabelResolver {
    cache: HashMap<CallbackId, String>,
}

impl LabelResolver for NamedLabelResolver {
    fn callback_label(&mut self, id: CallbackId, name: Option<&str>) -> Option<String> {
        if let Some(label) = self.cache.get(&id) {
            return Some(label.clone());
        }
        let label = format!("callback:{}", name?);
        self.cache.insert(id, label.clone());
        Some(label)
    }
}

pub(crate) fn default_callback_label(id: CallbackId) -> String {
    format!("callback:{}", id.as_u32())
}
