// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Memory sharing scenario: one full transaction lifecycle per
//! {kind, width} combination.
//!
//! The owner offers a two-page region, the borrower retrieves and
//! relinquishes it, and the owner reclaims. The scenario asserts the
//! terminal reclaimed state and reserved-field compliance of every step
//! (the protocol layer folds the reserved sweep into each result). The
//! region is freed on every exit path.

use ffval_abi::{EndpointId, PAGE_SIZE_4K, RegWidth, Vaddr};
use ffval_core::conduit::Conduit;
use ffval_core::discovery;
use ffval_core::memory::MemoryEnv;
use ffval_core::transaction::{
    MemoryRegion, MemoryTransaction, RegionAttributes, TxnKind, TxnState,
};

use crate::verdict::{FailPoint, Verdict, record};


const REGION_PAGES: u32 = 2;
const REGION_BYTES: usize = REGION_PAGES as usize * PAGE_SIZE_4K;

const POINT_ALLOC: FailPoint = FailPoint(1);
const POINT_TRANSLATE: FailPoint = FailPoint(2);
const POINT_BEGIN: FailPoint = FailPoint(3);
const POINT_RETRIEVE: FailPoint = FailPoint(4);
const POINT_RELINQUISH: FailPoint = FailPoint(5);
const POINT_RECLAIM: FailPoint = FailPoint(6);
const POINT_TERMINAL_STATE: FailPoint = FailPoint(7);

/// Runs one full cycle of `kind` at `width`, granting to `receiver`.
pub fn run<C: Conduit, M: MemoryEnv>(
    conduit: &mut C,
    mem: &mut M,
    receiver: EndpointId,
    kind: TxnKind,
    width: RegWidth,
) -> Verdict {
    match discovery::feature_supported(conduit, kind.func(), width) {
        Ok(true) => {}
        Ok(false) => {
            log::info!("{kind} unimplemented at this width, skipping");
            return Verdict::Skip;
        }
        Err(_) => return Verdict::Fail(POINT_BEGIN),
    }

    let Some(va) = mem.alloc(REGION_BYTES) else {
        return Verdict::Fail(POINT_ALLOC);
    };

    let mut verdict = Verdict::Pass;
    record(&mut verdict, cycle(conduit, mem, va, receiver, kind, width));
    mem.free(va, REGION_BYTES);
    verdict
}

fn cycle<C: Conduit, M: MemoryEnv>(
    conduit: &mut C,
    mem: &M,
    va: Vaddr,
    receiver: EndpointId,
    kind: TxnKind,
    width: RegWidth,
) -> Result<(), FailPoint> {
    let base = mem.translate(va).ok_or(POINT_TRANSLATE)?;
    let region = MemoryRegion {
        base,
        page_count: REGION_PAGES,
        attributes: RegionAttributes::RW,
    };

    let mut txn = MemoryTransaction::new(kind, width, region, receiver);
    txn.begin(conduit).map_err(|_| POINT_BEGIN)?;
    txn.retrieve(conduit).map_err(|_| POINT_RETRIEVE)?;
    txn.relinquish(conduit).map_err(|_| POINT_RELINQUISH)?;
    txn.reclaim(conduit).map_err(|_| POINT_RECLAIM)?;

    if txn.state() != TxnState::Reclaimed {
        return Err(POINT_TERMINAL_STATE);
    }
    Ok(())
}
