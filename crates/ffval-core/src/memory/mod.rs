// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! The external memory environment seam.
//!
//! Buffer allocation, virtual-to-physical translation, and raw buffer
//! copies are collaborator services of the platform; the conformance core
//! consumes them through [`MemoryEnv`] and never duplicates their logic.
//! Tests substitute [`MockMemory`], a watermark allocator over one shared
//! host buffer that also backs the mock partition manager.

#[cfg(test)]
mod memory_test;

// Mock requires alloc, only available with std or test
#[cfg(any(test, feature = "std"))]
mod mock;

#[cfg(any(test, feature = "std"))]
pub use mock::{MockMemory, SharedMem};

use ffval_abi::{Paddr, Vaddr};

/// Memory services consumed from the platform.
pub trait MemoryEnv {
    /// Allocates a page-aligned buffer of at least `size` bytes.
    ///
    /// Returns `None` on exhaustion; required test buffers failing to
    /// allocate is the one condition that terminates a running scenario.
    fn alloc(&mut self, size: usize) -> Option<Vaddr>;

    /// Frees a buffer previously returned by [`MemoryEnv::alloc`].
    fn free(&mut self, va: Vaddr, size: usize);

    /// Translates a virtual address to the physical address the callee's
    /// translation regime sees. Returns `None` for unmapped addresses.
    fn translate(&self, va: Vaddr) -> Option<Paddr>;

    /// Copies `bytes` into the buffer at `va`.
    fn write(&mut self, va: Vaddr, bytes: &[u8]);

    /// Copies `out.len()` bytes out of the buffer at `va`.
    fn read(&self, va: Vaddr, out: &mut [u8]);
}
