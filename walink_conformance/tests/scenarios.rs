// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end calls from `walink_host` into the sample guest API.

use walink_conformance::api;
use walink_conformance::loopback::{self, Loopback};
use walink_guest::registry::registry;
use walink_host::{Host, HostError, HostValue, Tag, Value};

fn host() -> Host<Loopback> {
    Host::new(Loopback)
}

#[test]
fn add_returns_an_immediate_sum() {
    let mut host = host();
    let a = host.walink().to_wl_i32(2);
    let b = host.walink().to_wl_i32(3);

    let out = api::add(a, b);

    assert_eq!(out.tag(), Tag::SINT32);
    assert_eq!(out.payload(), 5);
    assert!(!out.is_address(), "sums travel in the word");
    assert_eq!(host.walink().from_wl_i32(out).unwrap(), 5);
}

#[test]
fn add_wraps_on_overflow() {
    let mut host = host();
    let out = api::add(host.walink().to_wl_i32(i32::MAX), host.walink().to_wl_i32(1));
    assert_eq!(host.walink().from_wl_i32(out).unwrap(), i32::MIN);
}

#[test]
fn echo_string_consumes_input_and_returns_owned_copy() {
    let mut host = host();
    let input = host.walink().to_wl_string("hello").unwrap();
    assert!(input.has_free_flag());
    assert!(registry().contains(input.payload()));

    let out = api::echo_string(input);

    assert!(
        !registry().contains(input.payload()),
        "guest released the input"
    );
    assert_eq!(out.tag(), Tag::STRING);
    assert!(out.has_free_flag());
    assert_ne!(out.payload(), 0);
    assert!(registry().contains(out.payload()));

    assert_eq!(host.walink().from_wl_string(out).unwrap(), "hello");
    assert!(
        !registry().contains(out.payload()),
        "host consumed the result"
    );
}

#[test]
fn echo_string_keeps_utf8_and_empty_strings() {
    let mut host = host();
    for s in ["", "héllo wörld", "\u{1F980}"] {
        let input = host.walink().to_wl_string(s).unwrap();
        let out = api::echo_string(input);
        assert_eq!(host.walink().from_wl_string(out).unwrap(), s);
    }
}

#[test]
fn callback_round_trip_doubles_its_argument() {
    let host = loopback::connect();
    let cb = host.borrow_mut().register(|wl, args| {
        let n = wl.from_wl_i32(args[0])?;
        Ok(wl.to_wl_i32(n * 2))
    });
    assert_eq!(cb.tag(), Tag::FUNCTION);

    let arg = host.borrow_mut().walink().to_wl_i32(7);
    let out = api::call_me_back(cb, arg);

    assert_eq!(host.borrow_mut().walink().from_wl_i32(out).unwrap(), 14);
    loopback::disconnect();
}

#[test]
fn callback_can_take_ownership_of_a_string_argument() {
    let host = loopback::connect();
    let cb = host.borrow_mut().register(|wl, args| {
        let s = wl.from_wl_string(args[0])?;
        wl.to_wl_string(&s.to_uppercase())
    });

    let arg = host.borrow_mut().walink().to_wl_string("shout").unwrap();
    let out = api::call_me_back(cb, arg);

    assert!(
        !registry().contains(arg.payload()),
        "host released the argument"
    );
    assert_eq!(
        host.borrow_mut().walink().from_wl_string(out).unwrap(),
        "SHOUT"
    );
    loopback::disconnect();
}

#[test]
fn failing_callback_reaches_the_guest_as_an_error_value() {
    let host = loopback::connect();
    let cb = host
        .borrow_mut()
        .register(|_, _| Err(HostError::Guest("boom".into())));

    let out = api::call_me_back(cb, walink_guest::from_i32(1));

    assert_eq!(out.tag(), Tag::ERROR);
    assert!(out.has_free_flag());
    let decoded = host.borrow_mut().walink().decode(out);
    assert!(
        matches!(&decoded, Err(HostError::Guest(msg)) if msg == "guest error: boom"),
        "unexpected decode: {decoded:?}"
    );
    loopback::disconnect();
}

#[test]
fn guest_error_is_consumed_by_the_host() {
    let mut host = host();
    let msg = host.walink().to_wl_string("bad input").unwrap();

    let out = api::fail_with(msg);

    assert_eq!(out.tag(), Tag::ERROR);
    assert!(out.has_free_flag());
    assert!(registry().contains(out.payload()));
    assert_eq!(
        host.walink().from_wl_error_message(out).unwrap(),
        "bad input"
    );
    assert!(!registry().contains(out.payload()));
}

#[test]
fn roundtrip_bool_answers_wrong_tags_with_an_error() {
    let mut host = host();
    let t = host.walink().to_wl_bool(true);
    assert_eq!(api::roundtrip_bool(t), t);

    let out = api::roundtrip_bool(host.walink().to_wl_i32(1));
    assert_eq!(
        host.walink().decode(out).unwrap_err().to_string(),
        "guest error: roundtrip_bool: invalid tag"
    );
}

#[test]
fn guest_owned_result_is_released_by_decode() {
    let mut host = host();
    let out = api::make_hello_string();
    assert!(registry().contains(out.payload()));
    assert!(matches!(
        host.walink().decode(out).unwrap(),
        HostValue::String(s) if s == "hello from wasm"
    ));
    assert!(!registry().contains(out.payload()));
}

#[test]
fn double_free_stays_true_and_leaves_registry_consistent() {
    let mut host = host();
    let v = host.walink().to_wl_string("twice").unwrap();
    let keep = host.walink().to_wl_string("untouched").unwrap();

    assert!(host.walink().release(v).unwrap());
    assert!(!registry().contains(v.payload()));
    assert!(host.walink().release(v).unwrap(), "free is idempotent");
    assert!(host.walink().release(v).unwrap(), "free is idempotent");

    assert!(registry().contains(keep.payload()));
    assert_eq!(host.walink().from_wl_string(keep).unwrap(), "untouched");
}

#[test]
fn free_of_a_scalar_is_false() {
    let mut host = host();
    let n = host.walink().to_wl_i32(9);
    assert!(!host.walink().release(n).unwrap());
    assert!(!host.walink().release(Value::NULL).unwrap());
}

#[test]
fn borrowed_read_leaves_the_entry_pinned() {
    let mut host = host();
    let v = host.walink().to_wl_string("still here").unwrap();
    assert!(v.has_free_flag());

    assert_eq!(walink_guest::to_string(v, false).unwrap(), "still here");
    assert!(registry().contains(v.payload()));
    assert_eq!(walink_guest::to_string(v, false).unwrap(), "still here");

    assert_eq!(host.walink().from_wl_string(v).unwrap(), "still here");
    assert!(!registry().contains(v.payload()));
}
