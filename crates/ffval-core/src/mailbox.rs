// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Send/receive buffer pair lifecycle.
//!
//! An endpoint registers one buffer pair with the callee for indirect
//! messaging and owns it exclusively until unregistered. Registration
//! state is owned by the [`Mailbox`] instance - scoped to the endpoint or
//! session under test, never process-wide.
//!
//! # Registration Idempotency
//!
//! Not every implementation under test supports unregistering; the
//! capability is resolved once from a feature query at construction (see
//! [`Mailbox::probe`]). Where it is absent, a pair can only ever be
//! registered once, so repeated `register` calls for the same pair are
//! answered locally with success without reinvoking the callee. A repeat
//! with a *different* pair is refused as [`BufferError::Mismatch`] rather
//! than silently accepted.

use core::fmt;

use ffval_abi::{AbiFunc, CallRegs, EndpointId, RegWidth, StatusCode, Vaddr};

use crate::conduit::{Conduit, invoke};
use crate::discovery;
use crate::memory::MemoryEnv;
use crate::validator;


/// Reserved trailing slots in buffer-management results (no payload
/// beyond the discriminant).
const RESERVED_SLOTS: usize = 7;

/// A send/receive buffer pair, by the caller's virtual addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferPair {
    /// Send buffer (caller writes, callee reads).
    pub send: Vaddr,
    /// Receive buffer (callee writes, caller reads).
    pub recv: Vaddr,
    /// Size of each buffer in 4K pages.
    pub page_count: u32,
}

/// Error during buffer lifecycle operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The registration call returned an error discriminant.
    Map(StatusCode),
    /// The unregistration call returned an error discriminant.
    Unmap(StatusCode),
    /// The receive-buffer release returned an error discriminant.
    Release(StatusCode),
    /// `register` was repeated with a different pair while one is active.
    Mismatch,
    /// A buffer address has no physical translation.
    Translate,
    /// A nonzero value was read in a reserved result slot.
    ReservedField,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(code) => write!(f, "buffer registration failed: {code}"),
            Self::Unmap(code) => write!(f, "buffer unregistration failed: {code}"),
            Self::Release(code) => write!(f, "receive buffer release failed: {code}"),
            Self::Mismatch => write!(f, "a different buffer pair is already registered"),
            Self::Translate => write!(f, "buffer address has no physical translation"),
            Self::ReservedField => write!(f, "nonzero value in reserved result slot"),
        }
    }
}

/// Buffer pair lifecycle manager for one endpoint.
pub struct Mailbox {
    width: RegWidth,
    unmap_supported: bool,
    registered: Option<BufferPair>,
}

impl Mailbox {
    /// Creates a manager with an explicit unmap capability flag.
    #[must_use]
    pub const fn new(width: RegWidth, unmap_supported: bool) -> Self {
        Self {
            width,
            unmap_supported,
            registered: None,
        }
    }

    /// Creates a manager, resolving the unmap capability from a feature
    /// query against the callee.
    pub fn probe<C: Conduit>(conduit: &mut C, width: RegWidth) -> Self {
        let unmap_supported =
            discovery::feature_supported(conduit, AbiFunc::RxTxUnmap, RegWidth::Bits32)
                .unwrap_or(false);
        if !unmap_supported {
            log::debug!("callee does not support buffer unregistration; modelling it as a no-op");
        }
        Self::new(width, unmap_supported)
    }

    /// The currently registered pair, if any.
    #[must_use]
    pub const fn registered(&self) -> Option<&BufferPair> {
        self.registered.as_ref()
    }

    /// Registers a buffer pair with the callee.
    ///
    /// Idempotent for an identical pair: once registered, later calls
    /// succeed locally without reinvoking the callee.
    pub fn register<C: Conduit, M: MemoryEnv>(
        &mut self,
        conduit: &mut C,
        mem: &M,
        pair: BufferPair,
    ) -> Result<(), BufferError> {
        if let Some(active) = self.registered {
            if active == pair {
                log::debug!("buffer pair already registered; skipping reinvocation");
                return Ok(());
            }
            return Err(BufferError::Mismatch);
        }

        let send_pa = mem.translate(pair.send).ok_or(BufferError::Translate)?;
        let recv_pa = mem.translate(pair.recv).ok_or(BufferError::Translate)?;

        let mut regs = CallRegs::default();
        regs.arg1 = send_pa.as_u64();
        regs.arg2 = recv_pa.as_u64();
        regs.arg3 = u64::from(pair.page_count);
        let result = invoke(conduit, AbiFunc::RxTxMap, self.width, regs);

        let outcome = validator::validate(&result, RESERVED_SLOTS);
        match outcome.discriminant {
            discriminant if discriminant.is_success() => {
                if !outcome.reserved_ok {
                    return Err(BufferError::ReservedField);
                }
                self.registered = Some(pair);
                Ok(())
            }
            validator::Discriminant::Error(code) => Err(BufferError::Map(code)),
            _ => Err(BufferError::Map(StatusCode::Aborted)),
        }
    }

    /// Unregisters the active buffer pair.
    ///
    /// Where the callee lacks the unmap capability this is a recorded
    /// no-op reporting success; the registration is kept so a later
    /// `register` of the same pair stays a local no-op. Callers must not
    /// assume an unregister was effective.
    pub fn unregister<C: Conduit>(
        &mut self,
        conduit: &mut C,
        endpoint: EndpointId,
    ) -> Result<(), BufferError> {
        if self.registered.is_none() {
            return Ok(());
        }
        if !self.unmap_supported {
            log::debug!("unregister skipped: callee lacks the unmap capability");
            return Ok(());
        }

        let mut regs = CallRegs::default();
        regs.arg1 = u64::from(endpoint.as_u16()) << 16;
        let result = invoke(conduit, AbiFunc::RxTxUnmap, RegWidth::Bits32, regs);

        let outcome = validator::validate(&result, RESERVED_SLOTS);
        match outcome.discriminant {
            discriminant if discriminant.is_success() => {
                if !outcome.reserved_ok {
                    return Err(BufferError::ReservedField);
                }
                self.registered = None;
                Ok(())
            }
            validator::Discriminant::Error(code) => Err(BufferError::Unmap(code)),
            _ => Err(BufferError::Unmap(StatusCode::Aborted)),
        }
    }

    /// Releases ownership of the receive buffer back to the callee after a
    /// message has been consumed.
    pub fn release_rx<C: Conduit>(&self, conduit: &mut C) -> Result<(), BufferError> {
        let result = invoke(
            conduit,
            AbiFunc::RxRelease,
            RegWidth::Bits32,
            CallRegs::default(),
        );

        let outcome = validator::validate(&result, RESERVED_SLOTS);
        match outcome.discriminant {
            discriminant if discriminant.is_success() => {
                if outcome.reserved_ok {
                    Ok(())
                } else {
                    Err(BufferError::ReservedField)
                }
            }
            validator::Discriminant::Error(code) => Err(BufferError::Release(code)),
            _ => Err(BufferError::Release(StatusCode::Aborted)),
        }
    }
}
