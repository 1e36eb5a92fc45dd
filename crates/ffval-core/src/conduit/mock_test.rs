// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ffval_abi::{
    AbiFunc, CallRegs, EndpointId, PAGE_SIZE_4K, RegWidth, StatusCode, Vaddr, Version,
};

use super::{Conduit, MockPartitionManager, invoke};
use crate::memory::{MemoryEnv, MockMemory};
use crate::validator::{Discriminant, classify};

const BASE: u64 = 0x4000_0000;

fn setup() -> (MockMemory, MockPartitionManager) {
    let mem = MockMemory::new(16 * PAGE_SIZE_4K, Vaddr::new(BASE));
    let pm = MockPartitionManager::new(mem.share(), BASE);
    (mem, pm)
}

fn map_pair(mem: &mut MockMemory, pm: &mut MockPartitionManager) -> (Vaddr, Vaddr) {
    let tx = mem.alloc(PAGE_SIZE_4K).unwrap();
    let rx = mem.alloc(PAGE_SIZE_4K).unwrap();
    let mut regs = CallRegs::default();
    regs.arg1 = tx.as_u64();
    regs.arg2 = rx.as_u64();
    regs.arg3 = 1;
    let result = invoke(pm, AbiFunc::RxTxMap, RegWidth::Bits32, regs);
    assert!(classify(&result).is_success());
    (tx, rx)
}

#[test]
fn version_negotiates_the_older_of_the_two() {
    let (_, mut pm) = setup();
    let mut regs = CallRegs::default();
    regs.arg1 = Version::new(1, 0).to_reg();
    let result = invoke(&mut pm, AbiFunc::Version, RegWidth::Bits32, regs);
    assert_eq!(Version::from_reg(result.fid), Version::new(1, 0));

    regs.arg1 = Version::new(2, 0).to_reg();
    let result = invoke(&mut pm, AbiFunc::Version, RegWidth::Bits32, regs);
    assert_eq!(Version::from_reg(result.fid), Version::new(1, 1));
}

#[test]
fn unsupported_marker_fails_both_probe_and_invocation() {
    let (_, mut pm) = setup();
    pm.mark_unsupported(AbiFunc::RxTxUnmap, RegWidth::Bits32);

    let mut regs = CallRegs::default();
    regs.arg1 = u64::from(AbiFunc::RxTxUnmap.id(RegWidth::Bits32));
    let probe = invoke(&mut pm, AbiFunc::Features, RegWidth::Bits32, regs);
    assert_eq!(
        classify(&probe),
        Discriminant::Error(StatusCode::NotSupported)
    );

    let call = invoke(
        &mut pm,
        AbiFunc::RxTxUnmap,
        RegWidth::Bits32,
        CallRegs::default(),
    );
    assert_eq!(
        classify(&call),
        Discriminant::Error(StatusCode::NotSupported)
    );
}

#[test]
fn mapping_twice_is_denied() {
    let (mut mem, mut pm) = setup();
    let (tx, rx) = map_pair(&mut mem, &mut pm);

    let mut regs = CallRegs::default();
    regs.arg1 = tx.as_u64();
    regs.arg2 = rx.as_u64();
    regs.arg3 = 1;
    let result = invoke(&mut pm, AbiFunc::RxTxMap, RegWidth::Bits32, regs);
    assert_eq!(classify(&result), Discriminant::Error(StatusCode::Denied));
}

#[test]
fn unaligned_buffers_are_rejected() {
    let (_, mut pm) = setup();
    let mut regs = CallRegs::default();
    regs.arg1 = BASE + 0x10;
    regs.arg2 = BASE + PAGE_SIZE_4K as u64;
    regs.arg3 = 1;
    let result = invoke(&mut pm, AbiFunc::RxTxMap, RegWidth::Bits32, regs);
    assert_eq!(
        classify(&result),
        Discriminant::Error(StatusCode::InvalidParameters)
    );
}

#[test]
fn message_payload_travels_through_the_shared_buffer() {
    let (mut mem, mut pm) = setup();
    let (tx, rx) = map_pair(&mut mem, &mut pm);

    let payload = b"hello over the wire";
    mem.write(tx, payload);

    let mut regs = CallRegs::default();
    regs.arg1 = EndpointId::pack(EndpointId::new(1), EndpointId::new(2));
    regs.arg3 = payload.len() as u64;
    let sent = invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs);
    assert!(classify(&sent).is_success());

    let delivery = invoke(&mut pm, AbiFunc::MsgWait, RegWidth::Bits32, CallRegs::default());
    assert_eq!(delivery.fid, u64::from(AbiFunc::MsgSend.id(RegWidth::Bits32)));
    assert_eq!(delivery.arg3, payload.len() as u64);

    let mut received = [0u8; 19];
    mem.read(rx, &mut received);
    assert_eq!(&received, payload);
}

#[test]
fn busy_budget_counts_down_per_send() {
    let (mut mem, mut pm) = setup();
    map_pair(&mut mem, &mut pm);
    pm.set_busy_budget(2);

    let mut regs = CallRegs::default();
    regs.arg1 = EndpointId::pack(EndpointId::new(1), EndpointId::new(2));
    regs.arg3 = 4;
    for _ in 0..2 {
        let result = invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs);
        assert!(classify(&result).is_busy());
    }
    let result = invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs);
    assert!(classify(&result).is_success());
}

#[test]
fn send_is_busy_until_previous_delivery_consumed_and_released() {
    let (mut mem, mut pm) = setup();
    map_pair(&mut mem, &mut pm);

    let mut regs = CallRegs::default();
    regs.arg1 = EndpointId::pack(EndpointId::new(1), EndpointId::new(2));
    regs.arg3 = 4;
    assert!(classify(&invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs)).is_success());

    // Undelivered message: queue full.
    assert!(classify(&invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs)).is_busy());

    invoke(&mut pm, AbiFunc::MsgPoll, RegWidth::Bits32, CallRegs::default());
    // Delivered but the caller still owns the receive buffer.
    assert!(classify(&invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs)).is_busy());

    let released = invoke(&mut pm, AbiFunc::RxRelease, RegWidth::Bits32, CallRegs::default());
    assert!(classify(&released).is_success());
    assert!(classify(&invoke(&mut pm, AbiFunc::MsgSend, RegWidth::Bits32, regs)).is_success());
}

#[test]
fn poll_with_nothing_pending_says_retry() {
    let (mut mem, mut pm) = setup();
    map_pair(&mut mem, &mut pm);
    let result = invoke(&mut pm, AbiFunc::MsgPoll, RegWidth::Bits32, CallRegs::default());
    assert_eq!(classify(&result), Discriminant::Error(StatusCode::Retry));
}

#[test]
fn poison_arms_exactly_one_reply() {
    let (_, mut pm) = setup();
    pm.poison_reserved_slot(7);

    let first = invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    assert_ne!(first.arg7, 0);

    let second = invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    assert_eq!(second.arg7, 0);
}

#[test]
fn targeted_poison_skips_unrelated_calls() {
    let (_, mut pm) = setup();
    pm.poison_reply_of(AbiFunc::IdGet, RegWidth::Bits32, 6);

    let probe = invoke(&mut pm, AbiFunc::Features, RegWidth::Bits32, CallRegs::default());
    assert_eq!(probe.arg6, 0);

    let first = invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    assert_ne!(first.arg6, 0);

    let second = invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    assert_eq!(second.arg6, 0);
}

#[test]
fn call_log_counts_by_function_id() {
    let (_, mut pm) = setup();
    invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    invoke(&mut pm, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());
    assert_eq!(pm.calls_to(AbiFunc::IdGet, RegWidth::Bits32), 2);
    assert_eq!(pm.calls_to(AbiFunc::MsgSend, RegWidth::Bits32), 0);
}
