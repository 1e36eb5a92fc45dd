// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ffval_abi::{AbiFunc, EndpointId, PAGE_SIZE_4K, RegWidth, Vaddr};
use ffval_core::conduit::MockPartitionManager;
use ffval_core::memory::MockMemory;
use ffval_core::messaging::RetryPolicy;

use super::run;
use crate::verdict::Verdict;

const BASE: u64 = 0x4000_0000;
const SERVER: EndpointId = EndpointId::new(0x8002);

const POLICY: RetryPolicy = RetryPolicy {
    max_attempts: 4,
    backoff_spins: 0,
};

fn setup() -> (MockMemory, MockPartitionManager) {
    let mem = MockMemory::new(16 * PAGE_SIZE_4K, Vaddr::new(BASE));
    let pm = MockPartitionManager::new(mem.share(), BASE);
    (mem, pm)
}

#[test]
fn conformant_callee_passes() {
    let (mut mem, mut pm) = setup();
    assert_eq!(run(&mut pm, &mut mem, SERVER, POLICY), Verdict::Pass);
}

#[test]
fn all_buffers_are_freed_afterwards() {
    let (mut mem, mut pm) = setup();
    run(&mut pm, &mut mem, SERVER, POLICY);
    assert_eq!(mem.outstanding(), 0);
}

#[test]
fn buffers_are_freed_even_when_a_step_fails() {
    let (mut mem, mut pm) = setup();
    pm.set_busy_budget(u32::MAX);
    let verdict = run(&mut pm, &mut mem, SERVER, POLICY);
    assert!(matches!(verdict, Verdict::Fail(_)));
    assert_eq!(mem.outstanding(), 0);
}

#[test]
fn unsupported_send_skips_instead_of_failing() {
    let (mut mem, mut pm) = setup();
    pm.mark_unsupported(AbiFunc::MsgSend, RegWidth::Bits32);
    assert_eq!(run(&mut pm, &mut mem, SERVER, POLICY), Verdict::Skip);
    assert_eq!(mem.outstanding(), 0);
}

#[test]
fn transient_busy_answers_do_not_fail_the_scenario() {
    let (mut mem, mut pm) = setup();
    pm.set_busy_budget(2);
    assert_eq!(run(&mut pm, &mut mem, SERVER, POLICY), Verdict::Pass);
}

#[test]
fn a_poisoned_send_reply_fails_the_scenario() {
    let (mut mem, mut pm) = setup();
    pm.poison_reply_of(AbiFunc::MsgSend, RegWidth::Bits32, 7);
    let verdict = run(&mut pm, &mut mem, SERVER, POLICY);
    assert!(matches!(verdict, Verdict::Fail(_)));
    assert_eq!(mem.outstanding(), 0);
}

#[test]
fn works_against_a_callee_without_unmap_support() {
    let (mut mem, mut pm) = setup();
    pm.mark_unsupported(AbiFunc::RxTxUnmap, RegWidth::Bits32);
    assert_eq!(run(&mut pm, &mut mem, SERVER, POLICY), Verdict::Pass);
    assert_eq!(pm.calls_to(AbiFunc::RxTxUnmap, RegWidth::Bits32), 0);
}
