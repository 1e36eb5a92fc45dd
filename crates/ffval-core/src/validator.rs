// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Result tuple validation.
//!
//! Every call returns the same 8-word tuple. Slot 0 carries the
//! success/error discriminant; slots beyond the call kind's defined return
//! payload are reserved and must read as zero (MBZ). A nonzero reserved
//! slot is a conformance violation in its own right, checked in addition
//! to - and independently of - the discriminant.

use core::fmt;

use ffval_abi::{AbiFunc, CallRegs, REG_COUNT, RegWidth, StatusCode};

#[cfg(test)]
mod validator_test;

/// Classification of the result discriminant in slot 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discriminant {
    /// The 32-bit success variant.
    Success32,
    /// The 64-bit success variant.
    Success64,
    /// An error with a recognized status code.
    Error(StatusCode),
    /// An error whose status register holds an unknown value.
    MalformedError(u64),
    /// Control returned because of an interrupt.
    Interrupt,
    /// Any other function id (e.g. a delivery indication).
    Other(u64),
}

impl Discriminant {
    /// Either success variant; the width of the success encoding is an
    /// encoding detail, never a protocol branch.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success32 | Self::Success64)
    }

    /// The busy flow-control signal.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Error(StatusCode::Busy))
    }

    /// The status code, if this is a recognized error.
    #[must_use]
    pub const fn error_code(self) -> Option<StatusCode> {
        match self {
            Self::Error(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success32 => write!(f, "success32"),
            Self::Success64 => write!(f, "success64"),
            Self::Error(code) => write!(f, "error:{code}"),
            Self::MalformedError(raw) => write!(f, "error:unknown({raw:#x})"),
            Self::Interrupt => write!(f, "interrupt"),
            Self::Other(fid) => write!(f, "other({fid:#x})"),
        }
    }
}

/// Result of validating one result tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Classified discriminant from slot 0.
    pub discriminant: Discriminant,
    /// Whether every reserved trailing slot read zero.
    pub reserved_ok: bool,
}

/// Classifies the discriminant in slot 0 of a result tuple.
#[must_use]
pub fn classify(regs: &CallRegs) -> Discriminant {
    match AbiFunc::from_id(regs.fid as u32) {
        Some((AbiFunc::Success, RegWidth::Bits32)) => Discriminant::Success32,
        Some((AbiFunc::Success, RegWidth::Bits64)) => Discriminant::Success64,
        Some((AbiFunc::Error, _)) => match StatusCode::from_reg(regs.arg2) {
            Some(code) => Discriminant::Error(code),
            None => Discriminant::MalformedError(regs.arg2),
        },
        Some((AbiFunc::Interrupt, _)) => Discriminant::Interrupt,
        _ => Discriminant::Other(regs.fid),
    }
}

/// Checks that the trailing `reserved_count` slots of the tuple are zero.
#[must_use]
pub fn reserved_slots_zero(regs: &CallRegs, reserved_count: usize) -> bool {
    let words = regs.to_array();
    let first = REG_COUNT.saturating_sub(reserved_count);
    words[first..].iter().all(|&word| word == 0)
}

/// Validates one result tuple.
///
/// `reserved_count` is the number of trailing slots outside the call
/// kind's defined return payload (for the success shape of the result).
/// Both checks are computed; the caller decides precedence - protocol
/// layers surface an error discriminant first and the reserved-field
/// verdict on success results.
#[must_use]
pub fn validate(regs: &CallRegs, reserved_count: usize) -> Outcome {
    Outcome {
        discriminant: classify(regs),
        reserved_ok: reserved_slots_zero(regs, reserved_count),
    }
}
