// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Profiling adapters for `walink_host` callback dispatch (currently Tracy).
//!
//! This crate is `std`-only and keeps `walink_host` itself free of profiling dependencies.
//! It listens for dispatch enter/exit notifications and emits matching profiling spans.
//!
//! ## Backend
//! This crate currently supports the Tracy backend via `tracy-client`. Without a running Tracy
//! client every hook is a no-op.
//!
//! ## Example
//! ```
//! use walink_host::{Host, HostOptions, LinearMemory};
//! use walink_profiling::{NamedLabelResolver, ProfilingDispatchObserver};
//!
//! let observer = ProfilingDispatchObserver::with_resolver(NamedLabelResolver::default());
//! let options = HostOptions::default().with_observer(observer);
//! let mut host = Host::with_options(LinearMemory::new(), options);
//! let ping = host.register_named("ping", |wl, _args| Ok(wl.to_wl_bool(true)));
//! assert_eq!(host.dispatch(ping, 0, 0)?.payload(), 1);
//! # Ok::<(), walink_host::HostError>(())
//! ```

mod observer;
mod resolver;

pub use observer::ProfilingDispatchObserver;
pub use resolver::{DefaultLabelResolver, LabelResolver, NamedLabelResolver};
