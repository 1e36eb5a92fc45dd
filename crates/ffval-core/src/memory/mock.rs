// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Mock memory environment for testing.
//!
//! A watermark allocator over one heap-allocated buffer with identity
//! virtual-to-physical translation. The backing buffer is shared (via
//! [`SharedMem`]) with the mock partition manager so that send-buffer
//! contents written by the caller are genuinely visible to the mock callee.

use std::boxed::Box;
use std::cell::RefCell;
use std::rc::Rc;
use std::vec;

use ffval_abi::{PAGE_SIZE_4K, Paddr, Vaddr};

use crate::memory::MemoryEnv;

/// Backing storage shared between [`MockMemory`] and the mock callee.
pub type SharedMem = Rc<RefCell<Box<[u8]>>>;

/// A mock memory environment backed by a shared host buffer.
///
/// Allocation is a page-granular watermark (freed buffers are only
/// accounted, never recycled - scenarios allocate a handful of pages).
/// Translation is identity, so the mock callee indexes the same buffer by
/// the physical addresses it receives.
pub struct MockMemory {
    mem: SharedMem,
    base: Vaddr,
    watermark: usize,
    outstanding: usize,
}

impl MockMemory {
    /// Creates a mock environment of `size` bytes based at `base`.
    #[must_use]
    pub fn new(size: usize, base: Vaddr) -> Self {
        Self {
            mem: Rc::new(RefCell::new(vec![0u8; size].into_boxed_slice())),
            base,
            watermark: 0,
            outstanding: 0,
        }
    }

    /// Returns a handle to the backing storage for the mock callee.
    #[must_use]
    pub fn share(&self) -> SharedMem {
        Rc::clone(&self.mem)
    }

    /// Base address of the mock address space.
    #[inline]
    #[must_use]
    pub const fn base(&self) -> Vaddr {
        self.base
    }

    /// Number of allocations not yet freed; scenarios must leave zero.
    #[inline]
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Convert a virtual address to an offset into the backing buffer.
    #[expect(
        clippy::panic,
        reason = "test mock panics intentionally on invalid address"
    )]
    fn offset(&self, va: Vaddr, len: usize) -> usize {
        let size = self.mem.borrow().len();
        assert!(
            va >= self.base,
            "virtual address {va} is below base {}",
            self.base
        );
        let offset = usize::try_from(va.as_u64().wrapping_sub(self.base.as_u64()))
            .unwrap_or_else(|_| panic!("virtual address {va} exceeds usize::MAX"));
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= size),
            "access of {len} bytes at {va} is beyond end of mock memory"
        );
        offset
    }
}

impl MemoryEnv for MockMemory {
    fn alloc(&mut self, size: usize) -> Option<Vaddr> {
        let rounded = size.div_ceil(PAGE_SIZE_4K) * PAGE_SIZE_4K;
        if self.watermark + rounded > self.mem.borrow().len() {
            return None;
        }
        let va = self.base.add(self.watermark as u64);
        self.watermark += rounded;
        self.outstanding += 1;
        Some(va)
    }

    fn free(&mut self, va: Vaddr, size: usize) {
        // Watermark allocator: accounting only.
        let _ = self.offset(va, size);
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    fn translate(&self, va: Vaddr) -> Option<Paddr> {
        // Identity mapping within bounds.
        let size = self.mem.borrow().len() as u64;
        let end = self.base.as_u64().checked_add(size)?;
        (va >= self.base && va.as_u64() < end).then(|| Paddr::new(va.as_u64()))
    }

    fn write(&mut self, va: Vaddr, bytes: &[u8]) {
        let offset = self.offset(va, bytes.len());
        self.mem.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn read(&self, va: Vaddr, out: &mut [u8]) {
        let offset = self.offset(va, out.len());
        out.copy_from_slice(&self.mem.borrow()[offset..offset + out.len()]);
    }
}
