// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! The fixed 8-register argument/result tuple.
//!
//! Every call transfers exactly eight 64-bit words to the callee and
//! receives eight words back in the same registers. The meaning of each
//! slot depends on the function id in slot 0.
//!
//! # Register Layout
//!
//! | Slot | Content |
//! |------|---------|
//! | 0    | function id (call) / result discriminant (return) |
//! | 1-7  | operation-specific arguments / results |
//!
//! Result slots beyond an operation's defined return payload are reserved
//! and must read as zero (MBZ); see the result validator in `ffval-core`.

use core::fmt;

use crate::layout::REG_COUNT;


/// The 8-word register tuple passed to and returned from every call.
///
/// A `CallRegs` value has no identity beyond the call in flight: callers
/// build one, the call shim consumes it and returns the overwritten result
/// tuple.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct CallRegs {
    /// Function id on the way in; result discriminant on the way out.
    pub fid: u64,
    /// Argument/result register 1.
    pub arg1: u64,
    /// Argument/result register 2.
    pub arg2: u64,
    /// Argument/result register 3.
    pub arg3: u64,
    /// Argument/result register 4.
    pub arg4: u64,
    /// Argument/result register 5.
    pub arg5: u64,
    /// Argument/result register 6.
    pub arg6: u64,
    /// Argument/result register 7.
    pub arg7: u64,
}

impl CallRegs {
    /// Creates a zeroed tuple with the given function id.
    #[inline]
    #[must_use]
    pub const fn new(fid: u64) -> Self {
        Self {
            fid,
            arg1: 0,
            arg2: 0,
            arg3: 0,
            arg4: 0,
            arg5: 0,
            arg6: 0,
            arg7: 0,
        }
    }

    /// Returns the tuple as an ordered array of eight words.
    #[must_use]
    pub const fn to_array(self) -> [u64; REG_COUNT] {
        [
            self.fid, self.arg1, self.arg2, self.arg3, self.arg4, self.arg5, self.arg6, self.arg7,
        ]
    }

    /// Builds a tuple from an ordered array of eight words.
    #[must_use]
    pub const fn from_array(words: [u64; REG_COUNT]) -> Self {
        Self {
            fid: words[0],
            arg1: words[1],
            arg2: words[2],
            arg3: words[3],
            arg4: words[4],
            arg5: words[5],
            arg6: words[6],
            arg7: words[7],
        }
    }

    /// Returns a copy with every argument register narrowed to 32 bits.
    ///
    /// The function id is left untouched; narrowing is applied by the call
    /// shim for SMC32 encodings only.
    #[must_use]
    pub const fn narrowed(self) -> Self {
        const MASK: u64 = u32::MAX as u64;
        Self {
            fid: self.fid,
            arg1: self.arg1 & MASK,
            arg2: self.arg2 & MASK,
            arg3: self.arg3 & MASK,
            arg4: self.arg4 & MASK,
            arg5: self.arg5 & MASK,
            arg6: self.arg6 & MASK,
            arg7: self.arg7 & MASK,
        }
    }
}

impl fmt::Debug for CallRegs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CallRegs[{:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}, {:#x}]",
            self.fid, self.arg1, self.arg2, self.arg3, self.arg4, self.arg5, self.arg6, self.arg7
        )
    }
}
