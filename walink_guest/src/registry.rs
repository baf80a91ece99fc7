// Copyright 2026 the Walink Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-wide retention registry for guest heap blocks.
//!
//! Once an address has escaped into a value word, nothing on the guest side can see it any more:
//! the host may hold the word for as long as it likes. The registry owns every block walink
//! allocates, keyed by the block's address, and keeps it alive until it is explicitly released.
//!
//! On `wasm32` the key is the block's real linear-memory address, so the host can read and write
//! it directly. Elsewhere the registry hands out synthetic 8-aligned addresses from a bump
//! counter; blocks are then only reachable through the registry, which is what the in-process
//! loopback host does.

use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use walink_value::WalinkError;

/// Alignment of synthetic addresses.
#[cfg(not(target_arch = "wasm32"))]
const SYNTHETIC_ALIGN: u32 = 8;

/// Probes before giving up on finding a free synthetic address.
#[cfg(not(target_arch = "wasm32"))]
const SYNTHETIC_PROBES: usize = 64;

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Returns the process-wide registry.
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Maps guest addresses to the blocks that back them.
///
/// One mutex guards the map; every critical section is a single hash-map operation or a copy out
/// of one block.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blocks: HashMap<u32, Box<[u8]>>,
    #[cfg(not(target_arch = "wasm32"))]
    next_addr: u32,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// Guest code uses the process-wide [`registry()`]; separate instances are for tests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a zeroed block of `len` bytes, pins it and returns its address.
    pub fn allocate(&self, len: u32) -> Result<u32, WalinkError> {
        self.allocate_with(len, |_| Ok(()))
    }

    /// Allocates a zeroed block of `len` bytes, lets `init` fill it, then pins it.
    ///
    /// Nothing is registered if allocation or `init` fails.
    pub fn allocate_with<F>(&self, len: u32, init: F) -> Result<u32, WalinkError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), WalinkError>,
    {
        let mut block = zeroed_block(len)?;
        init(&mut block[..])?;
        let mut inner = self.lock();
        let addr = inner.address_for(&block)?;
        log::trace!("retain {addr:#010x} ({len} bytes)");
        inner.blocks.insert(addr, block);
        Ok(addr)
    }

    /// Pins `block` under `addr`, returning any block previously pinned there.
    pub fn retain(&self, addr: u32, block: Box<[u8]>) -> Option<Box<[u8]>> {
        log::trace!("retain {addr:#010x} ({} bytes)", block.len());
        self.lock().blocks.insert(addr, block)
    }

    /// Removes the pin on `addr` and returns the block, dropping the registry's reference.
    ///
    /// Releasing an address that is not pinned is a no-op.
    pub fn release(&self, addr: u32) -> Option<Box<[u8]>> {
        let block = self.lock().blocks.remove(&addr);
        match &block {
            Some(b) => log::trace!("release {addr:#010x} ({} bytes)", b.len()),
            None => log::warn!("release of {addr:#010x}, which is not retained"),
        }
        block
    }

    /// Runs `f` on the block pinned at `addr` without releasing it.
    pub fn with_block<R>(&self, addr: u32, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let inner = self.lock();
        inner.blocks.get(&addr).map(|b| f(b))
    }

    /// Runs `f` on the block pinned at `addr` with write access.
    pub fn with_block_mut<R>(&self, addr: u32, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let mut inner = self.lock();
        inner.blocks.get_mut(&addr).map(|b| f(b))
    }

    /// Returns `true` if `addr` is pinned.
    #[must_use]
    pub fn contains(&self, addr: u32) -> bool {
        self.lock().blocks.contains_key(&addr)
    }

    /// Returns the number of pinned blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().blocks.len()
    }

    /// Returns `true` if nothing is pinned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    #[cfg(target_arch = "wasm32")]
    fn address_for(&mut self, block: &[u8]) -> Result<u32, WalinkError> {
        u32::try_from(block.as_ptr().addr()).map_err(|_| WalinkError::OutOfMemory {
            size: block.len() as u64,
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn address_for(&mut self, block: &[u8]) -> Result<u32, WalinkError> {
        let span = u32::try_from(block.len())
            .ok()
            .and_then(|len| len.checked_next_multiple_of(SYNTHETIC_ALIGN))
            .ok_or(WalinkError::OutOfMemory {
                size: block.len() as u64,
            })?;
        for _ in 0..SYNTHETIC_PROBES {
            let addr = self.next_addr;
            self.next_addr = addr.wrapping_add(span);
            if addr != 0 && !self.blocks.contains_key(&addr) {
                return Ok(addr);
            }
        }
        Err(WalinkError::OutOfMemory {
            size: block.len() as u64,
        })
    }
}

/// Zero-length requests still get one byte so every block has a distinct, non-null address.
fn zeroed_block(len: u32) -> Result<Box<[u8]>, WalinkError> {
    let oom = WalinkError::OutOfMemory {
        size: u64::from(len),
    };
    let len = usize::try_from(len).map_err(|_| oom.clone())?.max(1);
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| oom)?;
    buf.resize(len, 0);
    Ok(buf.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_pins_until_release() {
        let reg = Registry::new();
        let addr = reg.allocate(16).unwrap();
        assert_ne!(addr, 0);
        assert!(reg.contains(addr));
        assert_eq!(reg.with_block(addr, <[u8]>::len), Some(16));

        let block = reg.release(addr).expect("block should be retained");
        assert_eq!(block.len(), 16);
        assert!(!reg.contains(addr));
        assert!(reg.release(addr).is_none());
    }

    #[test]
    fn addresses_are_distinct_and_aligned() {
        let reg = Registry::new();
        let a = reg.allocate(3).unwrap();
        let b = reg.allocate(0).unwrap();
        let c = reg.allocate(9).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        #[cfg(not(target_arch = "wasm32"))]
        for addr in [a, b, c] {
            assert_eq!(addr % SYNTHETIC_ALIGN, 0);
        }
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn failed_init_registers_nothing() {
        let reg = Registry::new();
        let err = reg
            .allocate_with(8, |_| Err(WalinkError::MalformedContainer))
            .unwrap_err();
        assert_eq!(err, WalinkError::MalformedContainer);
        assert!(reg.is_empty());
    }

    #[test]
    fn writes_are_visible_to_later_reads() {
        let reg = Registry::new();
        let addr = reg.allocate(4).unwrap();
        reg.with_block_mut(addr, |b| b.copy_from_slice(b"walk")).unwrap();
        assert_eq!(reg.with_block(addr, <[u8]>::to_vec), Some(b"walk".to_vec()));
    }

    #[test]
    fn concurrent_churn_leaves_nothing_behind() {
        let reg = Registry::new();
        std::thread::scope(|scope| {
            for t in 0..8_u8 {
                let reg = &reg;
                scope.spawn(move || {
                    for i in 0..2_000_u32 {
                        let addr = reg.allocate(i % 64).unwrap();
                        reg.with_block_mut(addr, |b| b.fill(t)).unwrap();
                        assert!(reg.contains(addr), "fresh block is pinned");
                        assert!(
                            reg.with_block(addr, |b| b.iter().all(|&x| x == t)).unwrap(),
                            "no other thread touched this block"
                        );
                        assert!(reg.release(addr).is_some(), "released exactly once");
                    }
                });
            }
        });
        assert!(reg.is_empty());
    }

    #[test]
    fn retain_replaces_and_returns_previous() {
        let reg = Registry::new();
        assert!(reg.retain(0x40, Box::new([1])).is_none());
        let old = reg.retain(0x40, Box::new([2, 3])).unwrap();
        assert_eq!(&old[..], &[1]);
        assert_eq!(reg.with_block(0x40, <[u8]>::len), Some(2));
    }
}
