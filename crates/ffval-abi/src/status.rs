// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Status codes carried in the error discriminant.
//!
//! When a call fails, the callee returns the `Error` function id in slot 0
//! and a signed 32-bit status code in slot 2. The code is transported as
//! an unsigned 32-bit value without sign extension.

use core::fmt;


/// A signed status code returned by the callee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    /// The operation is not implemented by the callee.
    NotSupported = -1,
    /// An argument was malformed or out of range.
    InvalidParameters = -2,
    /// The callee ran out of memory servicing the request.
    NoMemory = -3,
    /// The callee cannot service the request right now; the caller must
    /// retry. This is the flow-control signal for a full receive queue.
    Busy = -4,
    /// The operation was interrupted and must be reissued.
    Interrupted = -5,
    /// The caller is not permitted to perform the operation.
    Denied = -6,
    /// The operation must be retried later.
    Retry = -7,
    /// The operation was aborted.
    Aborted = -8,
}

impl StatusCode {
    /// Try to convert from a raw signed value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::NotSupported),
            -2 => Some(Self::InvalidParameters),
            -3 => Some(Self::NoMemory),
            -4 => Some(Self::Busy),
            -5 => Some(Self::Interrupted),
            -6 => Some(Self::Denied),
            -7 => Some(Self::Retry),
            -8 => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Decode a status code from a result register.
    ///
    /// The wire carries the code masked to 32 bits without sign extension.
    #[must_use]
    pub const fn from_reg(value: u64) -> Option<Self> {
        Self::from_i32(value as u32 as i32)
    }

    /// Returns the raw signed value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Encodes the code for a result register: masked to 32 bits, no sign
    /// extension.
    #[must_use]
    pub const fn to_reg(self) -> u64 {
        self as i32 as u32 as u64
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_i32())
    }
}
