// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Secure monitor call conduit for aarch64.
//!
//! Issues `smc #0` with the 8-register convention. Compiler fences on both
//! sides pin the call as a sequence point; the asm block itself is marked
//! as clobbering memory so the compiler cannot cache buffer contents
//! across the control transfer.

use core::arch::asm;
use core::sync::atomic::{Ordering, compiler_fence};

use ffval_abi::CallRegs;

use crate::conduit::Conduit;

/// Conduit backed by the secure monitor call instruction.
pub struct SmcConduit;

impl Conduit for SmcConduit {
    fn call(&mut self, regs: CallRegs) -> CallRegs {
        let [mut x0, mut x1, mut x2, mut x3, mut x4, mut x5, mut x6, mut x7] = regs.to_array();

        compiler_fence(Ordering::SeqCst);
        // SAFETY: the callee follows the 8-register call convention and
        // returns control to the instruction after the smc.
        unsafe {
            asm!(
                "smc #0",
                inout("x0") x0,
                inout("x1") x1,
                inout("x2") x2,
                inout("x3") x3,
                inout("x4") x4,
                inout("x5") x5,
                inout("x6") x6,
                inout("x7") x7,
                options(nostack),
            );
        }
        compiler_fence(Ordering::SeqCst);

        CallRegs::from_array([x0, x1, x2, x3, x4, x5, x6, x7])
    }
}
