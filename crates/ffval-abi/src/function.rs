// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Operations, register widths, and the function identifier table.
//!
//! Every invocation at the hardware boundary is identified by a 32-bit
//! function id. Operations that accept 64-bit arguments exist in two
//! encodings which differ only in bit 30 of the id; the conformance core
//! treats the width as an encoding parameter, never as a separate
//! operation. This module is the single place where `{operation, width}`
//! maps to a function id.

use core::fmt;


/// Bit 30 of a function id selects the 64-bit calling convention.
const SMC64_BIT: u32 = 1 << 30;

/// Register width of a call encoding.
///
/// For 32-bit encodings every argument register is narrowed to its low
/// 32 bits before the call is issued. Width is an encoding detail: both
/// encodings of an operation must produce identical protocol behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegWidth {
    /// 32-bit calling convention; arguments narrowed to `u32`.
    Bits32,
    /// 64-bit calling convention; arguments passed verbatim.
    Bits64,
}

/// An operation of the partition manager call interface.
///
/// The discriminant is the SMC32 function id of the operation. Use
/// [`AbiFunc::id`] to obtain the id for a given [`RegWidth`]; use
/// [`AbiFunc::from_id`] to classify a result discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum AbiFunc {
    /// Error response to a previous invocation.
    Error = 0x8400_0060,
    /// Success response to a previous invocation.
    Success = 0x8400_0061,
    /// Control returned to the caller because of an interrupt.
    Interrupt = 0x8400_0062,
    /// Query the interface version.
    Version = 0x8400_0063,
    /// Query whether a function id is implemented.
    Features = 0x8400_0064,
    /// Relinquish ownership of the receive buffer after reading a message.
    RxRelease = 0x8400_0065,
    /// Register a send/receive buffer pair with the callee.
    RxTxMap = 0x8400_0066,
    /// Unregister a previously registered buffer pair.
    RxTxUnmap = 0x8400_0067,
    /// Query information about partitions in the system.
    PartitionInfoGet = 0x8400_0068,
    /// Query the 16-bit id of the calling endpoint.
    IdGet = 0x8400_0069,
    /// Poll for a message in the receive buffer without blocking.
    MsgPoll = 0x8400_006A,
    /// Block until a message or wake-up arrives.
    MsgWait = 0x8400_006B,
    /// Relinquish execution back to the scheduler.
    Yield = 0x8400_006C,
    /// Run an endpoint's execution context.
    Run = 0x8400_006D,
    /// Send a message through the registered send buffer.
    MsgSend = 0x8400_006E,
    /// Send a partition message in registers as a blocking request.
    MsgSendDirectReq = 0x8400_006F,
    /// Send a partition message in registers as a response.
    MsgSendDirectResp = 0x8400_0070,
    /// Start a transaction transferring ownership of a memory region.
    MemDonate = 0x8400_0071,
    /// Start a transaction lending exclusive access to a memory region.
    MemLend = 0x8400_0072,
    /// Start a transaction sharing concurrent access to a memory region.
    MemShare = 0x8400_0073,
    /// Request completion of a memory transaction as the borrower.
    MemRetrieveReq = 0x8400_0074,
    /// Response carrying the retrieved region description.
    MemRetrieveResp = 0x8400_0075,
    /// Transfer access back from a borrower to the owner.
    MemRelinquish = 0x8400_0076,
    /// Restore the owner's exclusive access to a region.
    MemReclaim = 0x8400_0077,
}

impl AbiFunc {
    /// Returns whether this operation has a 64-bit encoding.
    ///
    /// Operations without one always use the SMC32 id regardless of the
    /// requested width.
    #[must_use]
    pub const fn has_smc64(self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::RxTxMap
                | Self::MsgSendDirectReq
                | Self::MsgSendDirectResp
                | Self::MemDonate
                | Self::MemLend
                | Self::MemShare
                | Self::MemRetrieveReq
        )
    }

    /// Returns the function id for this operation at the given width.
    #[must_use]
    pub const fn id(self, width: RegWidth) -> u32 {
        let base = self as u32;
        match width {
            RegWidth::Bits64 if self.has_smc64() => base | SMC64_BIT,
            _ => base,
        }
    }

    /// Classifies a raw function id into an operation and its width.
    ///
    /// Returns `None` for ids outside the interface.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<(Self, RegWidth)> {
        let width = if id & SMC64_BIT != 0 {
            RegWidth::Bits64
        } else {
            RegWidth::Bits32
        };
        let func = match id & !SMC64_BIT {
            0x8400_0060 => Self::Error,
            0x8400_0061 => Self::Success,
            0x8400_0062 => Self::Interrupt,
            0x8400_0063 => Self::Version,
            0x8400_0064 => Self::Features,
            0x8400_0065 => Self::RxRelease,
            0x8400_0066 => Self::RxTxMap,
            0x8400_0067 => Self::RxTxUnmap,
            0x8400_0068 => Self::PartitionInfoGet,
            0x8400_0069 => Self::IdGet,
            0x8400_006A => Self::MsgPoll,
            0x8400_006B => Self::MsgWait,
            0x8400_006C => Self::Yield,
            0x8400_006D => Self::Run,
            0x8400_006E => Self::MsgSend,
            0x8400_006F => Self::MsgSendDirectReq,
            0x8400_0070 => Self::MsgSendDirectResp,
            0x8400_0071 => Self::MemDonate,
            0x8400_0072 => Self::MemLend,
            0x8400_0073 => Self::MemShare,
            0x8400_0074 => Self::MemRetrieveReq,
            0x8400_0075 => Self::MemRetrieveResp,
            0x8400_0076 => Self::MemRelinquish,
            0x8400_0077 => Self::MemReclaim,
            _ => return None,
        };
        // A 64-bit id is only valid for operations that define one.
        if matches!(width, RegWidth::Bits64) && !func.has_smc64() {
            return None;
        }
        Some((func, width))
    }
}

impl fmt::Display for AbiFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
