// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Memory transaction state machine.
//!
//! Donating, lending, and sharing memory follow one lifecycle: the owner
//! starts the transaction and receives an opaque handle, the borrower
//! retrieves and later relinquishes access by that handle, and the owner
//! finally reclaims the region. The three kinds and both register widths
//! share the state machine; only the function id differs.
//!
//! Each [`MemoryTransaction`] tracks its own lifecycle locally and refuses
//! out-of-order steps as [`TxnError::InvalidTransition`] before touching
//! the callee, keeping caller bugs distinct from callee nonconformance.

use core::fmt;

use bitflags::bitflags;
use ffval_abi::{AbiFunc, CallRegs, EndpointId, Handle, Paddr, RegWidth, StatusCode};

use crate::conduit::{Conduit, invoke};
use crate::validator::{self, Discriminant};


/// Reserved trailing slots when the result payload is a handle in slots
/// 2 and 3.
const HANDLE_RESERVED_SLOTS: usize = 4;

/// Reserved trailing slots when the discriminant is the only payload.
const BARE_RESERVED_SLOTS: usize = 7;

/// The three ways of granting another endpoint access to memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnKind {
    /// Ownership moves to the receiver.
    Donate,
    /// The receiver gets exclusive access; the owner keeps ownership.
    Lend,
    /// Owner and receiver access the region concurrently.
    Share,
}

impl TxnKind {
    /// The function id family starting a transaction of this kind.
    #[must_use]
    pub const fn func(self) -> AbiFunc {
        match self {
            Self::Donate => AbiFunc::MemDonate,
            Self::Lend => AbiFunc::MemLend,
            Self::Share => AbiFunc::MemShare,
        }
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Donate => write!(f, "donate"),
            Self::Lend => write!(f, "lend"),
            Self::Share => write!(f, "share"),
        }
    }
}

bitflags! {
    /// Access attributes requested for the transferred region.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RegionAttributes: u32 {
        /// Readable by the receiver.
        const READ = 1 << 0;
        /// Writable by the receiver.
        const WRITE = 1 << 1;
        /// Executable by the receiver.
        const EXECUTE = 1 << 2;
    }
}

impl RegionAttributes {
    /// The common data-buffer grant.
    pub const RW: Self = Self::READ.union(Self::WRITE);
}

/// A physically contiguous region offered in a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Physical base address, page aligned.
    pub base: Paddr,
    /// Region size in 4K pages.
    pub page_count: u32,
    /// Access attributes granted to the receiver.
    pub attributes: RegionAttributes,
}

/// Lifecycle position of one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    /// Created locally, not yet offered to the callee.
    Idle,
    /// Offered; the callee issued a handle.
    Begun,
    /// The borrower retrieved access.
    Retrieved,
    /// The borrower gave access back; the owner has not reclaimed yet.
    Relinquished,
    /// The owner reclaimed the region; the handle is dead.
    Reclaimed,
}

/// Error during a memory transaction step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnError {
    /// The callee refused to start the transaction.
    Begin(StatusCode),
    /// The callee refused the borrower's retrieve.
    Retrieve(StatusCode),
    /// The callee refused the borrower's relinquish.
    Relinquish(StatusCode),
    /// The callee refused the owner's reclaim.
    Reclaim(StatusCode),
    /// The step does not follow from the transaction's current state.
    /// Reported locally, without invoking the callee.
    InvalidTransition {
        /// State the transaction was in.
        from: TxnState,
    },
    /// A nonzero value was read in a reserved result slot.
    ReservedField,
    /// The result could not be classified as success or error.
    Malformed(u64),
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin(code) => write!(f, "transaction offer refused: {code}"),
            Self::Retrieve(code) => write!(f, "retrieve refused: {code}"),
            Self::Relinquish(code) => write!(f, "relinquish refused: {code}"),
            Self::Reclaim(code) => write!(f, "reclaim refused: {code}"),
            Self::InvalidTransition { from } => {
                write!(f, "step not valid from state {from:?}")
            }
            Self::ReservedField => write!(f, "nonzero value in reserved result slot"),
            Self::Malformed(raw) => write!(f, "unclassifiable transaction result {raw:#x}"),
        }
    }
}

/// One memory transaction, driven through its lifecycle by the caller.
#[derive(Debug)]
pub struct MemoryTransaction {
    kind: TxnKind,
    width: RegWidth,
    region: MemoryRegion,
    receiver: EndpointId,
    state: TxnState,
    handle: Option<Handle>,
}

impl MemoryTransaction {
    /// Sets up a transaction over `region` for `receiver`.
    #[must_use]
    pub const fn new(
        kind: TxnKind,
        width: RegWidth,
        region: MemoryRegion,
        receiver: EndpointId,
    ) -> Self {
        Self {
            kind,
            width,
            region,
            receiver,
            state: TxnState::Idle,
            handle: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TxnState {
        self.state
    }

    /// The handle issued at begin, while the transaction is live.
    #[must_use]
    pub const fn handle(&self) -> Option<Handle> {
        self.handle
    }

    /// Offers the region to the callee. On success the callee's handle is
    /// recorded and the transaction is live.
    pub fn begin<C: Conduit>(&mut self, conduit: &mut C) -> Result<Handle, TxnError> {
        if self.state != TxnState::Idle {
            return Err(TxnError::InvalidTransition { from: self.state });
        }

        let mut regs = CallRegs::default();
        regs.arg1 = self.region.base.as_u64();
        regs.arg2 = u64::from(self.region.attributes.bits());
        regs.arg4 = u64::from(self.region.page_count);
        regs.arg5 = u64::from(self.receiver.as_u16());
        let result = invoke(conduit, self.kind.func(), self.width, regs);

        let outcome = validator::validate(&result, HANDLE_RESERVED_SLOTS);
        match outcome.discriminant {
            discriminant if discriminant.is_success() => {
                if !outcome.reserved_ok {
                    return Err(TxnError::ReservedField);
                }
                let handle = Handle::from_parts(result.arg2, result.arg3);
                self.handle = Some(handle);
                self.state = TxnState::Begun;
                log::debug!("{} transaction began, {handle}", self.kind);
                Ok(handle)
            }
            Discriminant::Error(code) => Err(TxnError::Begin(code)),
            _ => Err(TxnError::Malformed(result.fid)),
        }
    }

    /// Retrieves access on the borrower's behalf.
    pub fn retrieve<C: Conduit>(&mut self, conduit: &mut C) -> Result<(), TxnError> {
        let handle = match self.state {
            TxnState::Begun | TxnState::Relinquished => self.live_handle()?,
            from => return Err(TxnError::InvalidTransition { from }),
        };

        let mut regs = CallRegs::default();
        regs.arg1 = handle.lo();
        regs.arg2 = handle.hi();
        let result = invoke(conduit, AbiFunc::MemRetrieveReq, self.width, regs);

        // A retrieve is acknowledged with the dedicated response id
        // carrying the handle back, not with the plain success variant.
        match validator::classify(&result) {
            Discriminant::Other(fid)
                if fid as u32 == AbiFunc::MemRetrieveResp.id(RegWidth::Bits32) =>
            {
                if !validator::reserved_slots_zero(&result, HANDLE_RESERVED_SLOTS) {
                    return Err(TxnError::ReservedField);
                }
                self.state = TxnState::Retrieved;
                Ok(())
            }
            Discriminant::Error(code) => Err(TxnError::Retrieve(code)),
            _ => Err(TxnError::Malformed(result.fid)),
        }
    }

    /// Gives access back on the borrower's behalf.
    pub fn relinquish<C: Conduit>(&mut self, conduit: &mut C) -> Result<(), TxnError> {
        if self.state != TxnState::Retrieved {
            return Err(TxnError::InvalidTransition { from: self.state });
        }
        let handle = self.live_handle()?;

        let mut regs = CallRegs::default();
        regs.arg1 = handle.lo();
        regs.arg2 = handle.hi();
        let result = invoke(conduit, AbiFunc::MemRelinquish, RegWidth::Bits32, regs);

        self.bare_step(&result, TxnState::Relinquished, TxnError::Relinquish)
    }

    /// Reclaims the region for the owner, retiring the handle. Only valid
    /// once the borrower has relinquished; anything earlier is an
    /// out-of-order step.
    pub fn reclaim<C: Conduit>(&mut self, conduit: &mut C) -> Result<(), TxnError> {
        if self.state != TxnState::Relinquished {
            return Err(TxnError::InvalidTransition { from: self.state });
        }
        let handle = self.live_handle()?;

        let mut regs = CallRegs::default();
        regs.arg1 = handle.lo();
        regs.arg2 = handle.hi();
        let result = invoke(conduit, AbiFunc::MemReclaim, RegWidth::Bits32, regs);

        self.bare_step(&result, TxnState::Reclaimed, TxnError::Reclaim)?;
        self.handle = None;
        Ok(())
    }

    fn bare_step(
        &mut self,
        result: &CallRegs,
        next: TxnState,
        refused: fn(StatusCode) -> TxnError,
    ) -> Result<(), TxnError> {
        let outcome = validator::validate(result, BARE_RESERVED_SLOTS);
        match outcome.discriminant {
            discriminant if discriminant.is_success() => {
                if !outcome.reserved_ok {
                    return Err(TxnError::ReservedField);
                }
                self.state = next;
                Ok(())
            }
            Discriminant::Error(code) => Err(refused(code)),
            _ => Err(TxnError::Malformed(result.fid)),
        }
    }

    // All live states are entered by recording a handle.
    fn live_handle(&self) -> Result<Handle, TxnError> {
        self.handle
            .ok_or(TxnError::InvalidTransition { from: self.state })
    }
}
