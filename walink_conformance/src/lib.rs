// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance suite for the walink ABI.
//!
//! [`api`] is a small guest API written against `walink_guest`. Built for `wasm32` it is a real
//! module; on other targets [`loopback`] hosts the very same functions in-process, so the
//! integration tests in this crate drive `walink_host` against actual guest code without a wasm
//! engine.

pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod loopback;
