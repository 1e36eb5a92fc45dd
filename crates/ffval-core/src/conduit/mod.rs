// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! The call shim: the seam between the conformance core and the hardware
//! call boundary.
//!
//! Every interaction with the system under test goes through a [`Conduit`].
//! The shim performs no validation and no retries - any bit pattern the
//! caller supplies is forwarded verbatim, and retry is a policy decision of
//! the layers above. The production implementation issues a secure monitor
//! call; tests substitute [`MockPartitionManager`].

#[cfg(test)]
mod mock_test;

// Mock requires alloc, only available with std or test
#[cfg(any(test, feature = "std"))]
mod mock;
#[cfg(all(target_arch = "aarch64", not(any(test, feature = "std"))))]
mod smc;

#[cfg(any(test, feature = "std"))]
pub use mock::MockPartitionManager;
#[cfg(all(target_arch = "aarch64", not(any(test, feature = "std"))))]
pub use smc::SmcConduit;

use ffval_abi::{AbiFunc, CallRegs, RegWidth};

/// The hardware call boundary.
///
/// A call is a synchronous, blocking transfer of control to the callee; it
/// returns only when the callee yields control back. Implementations must
/// treat the call as a strict sequence point: no memory access may be
/// reordered or speculated across it.
pub trait Conduit {
    /// Issues one invocation and returns the raw result tuple unchanged.
    fn call(&mut self, regs: CallRegs) -> CallRegs;
}

/// Builds and issues one invocation of `func` at the given width.
///
/// The function id is derived from the single `{operation, width}` table in
/// `ffval-abi`; for 32-bit encodings every argument register is narrowed to
/// its low 32 bits before the call, matching the bit-exact register
/// convention of the interface.
pub fn invoke<C: Conduit>(
    conduit: &mut C,
    func: AbiFunc,
    width: RegWidth,
    mut regs: CallRegs,
) -> CallRegs {
    regs.fid = u64::from(func.id(width));
    if !(matches!(width, RegWidth::Bits64) && func.has_smc64()) {
        regs = regs.narrowed();
    }
    conduit.call(regs)
}
