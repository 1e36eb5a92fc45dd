// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ffval_abi::{AbiFunc, CallRegs, REG_COUNT, RegWidth, StatusCode};
use proptest::prelude::*;

use super::{Discriminant, classify, reserved_slots_zero, validate};

fn success(width: RegWidth) -> CallRegs {
    CallRegs::new(u64::from(AbiFunc::Success.id(width)))
}

fn error(code: StatusCode) -> CallRegs {
    let mut regs = CallRegs::new(u64::from(AbiFunc::Error.id(RegWidth::Bits32)));
    regs.arg2 = code.to_reg();
    regs
}

#[test]
fn classifies_both_success_widths() {
    assert_eq!(classify(&success(RegWidth::Bits32)), Discriminant::Success32);
    assert_eq!(classify(&success(RegWidth::Bits64)), Discriminant::Success64);
    assert!(classify(&success(RegWidth::Bits32)).is_success());
    assert!(classify(&success(RegWidth::Bits64)).is_success());
}

#[test]
fn classifies_known_error_codes() {
    let discriminant = classify(&error(StatusCode::Denied));
    assert_eq!(discriminant, Discriminant::Error(StatusCode::Denied));
    assert_eq!(discriminant.error_code(), Some(StatusCode::Denied));
    assert!(!discriminant.is_success());
}

#[test]
fn busy_is_flow_control_not_generic_error() {
    assert!(classify(&error(StatusCode::Busy)).is_busy());
    assert!(!classify(&error(StatusCode::Denied)).is_busy());
}

#[test]
fn unknown_status_register_is_malformed() {
    let mut regs = CallRegs::new(u64::from(AbiFunc::Error.id(RegWidth::Bits32)));
    regs.arg2 = 0x1234_5678;
    assert_eq!(classify(&regs), Discriminant::MalformedError(0x1234_5678));
}

#[test]
fn error_status_ignores_upper_register_half() {
    let mut regs = CallRegs::new(u64::from(AbiFunc::Error.id(RegWidth::Bits32)));
    regs.arg2 = 0xFFFF_FFFF_0000_0000 | StatusCode::Retry.to_reg();
    assert_eq!(classify(&regs), Discriminant::Error(StatusCode::Retry));
}

#[test]
fn interrupt_and_foreign_ids_classify_distinctly() {
    let interrupt = CallRegs::new(u64::from(AbiFunc::Interrupt.id(RegWidth::Bits32)));
    assert_eq!(classify(&interrupt), Discriminant::Interrupt);

    let foreign = CallRegs::new(0x1234_5678);
    assert_eq!(classify(&foreign), Discriminant::Other(0x1234_5678));
}

#[test]
fn delivery_indication_classifies_as_other() {
    let delivery = CallRegs::new(u64::from(AbiFunc::MsgSend.id(RegWidth::Bits32)));
    let id = u64::from(AbiFunc::MsgSend.id(RegWidth::Bits32));
    assert_eq!(classify(&delivery), Discriminant::Other(id));
}

#[test]
fn reserved_sweep_checks_only_trailing_slots() {
    let mut regs = success(RegWidth::Bits32);
    regs.arg2 = 0xCAFE;
    // Slot 2 is payload for a five-slot reserved tail, reserved for seven.
    assert!(reserved_slots_zero(&regs, 5));
    assert!(!reserved_slots_zero(&regs, 7));
}

#[test]
fn reserved_count_of_zero_always_passes() {
    let mut regs = success(RegWidth::Bits32);
    regs.arg7 = 0xBAD;
    assert!(reserved_slots_zero(&regs, 0));
}

#[test]
fn oversized_reserved_count_saturates() {
    // A count beyond the tuple covers the whole tuple including slot 0.
    let regs = success(RegWidth::Bits32);
    assert!(!reserved_slots_zero(&regs, REG_COUNT + 3));
    assert!(reserved_slots_zero(&CallRegs::default(), REG_COUNT + 3));
}

#[test]
fn validate_reports_both_facets_independently() {
    let mut regs = success(RegWidth::Bits32);
    regs.arg7 = 1;
    let outcome = validate(&regs, 7);
    assert!(outcome.discriminant.is_success());
    assert!(!outcome.reserved_ok);
}

proptest! {
    #[test]
    fn reserved_verdict_depends_only_on_trailing_slots(
        mut words in proptest::array::uniform8(any::<u64>()),
        reserved in 0usize..=REG_COUNT,
    ) {
        for slot in &mut words[REG_COUNT - reserved..] {
            *slot = 0;
        }
        prop_assert!(reserved_slots_zero(&CallRegs::from_array(words), reserved));
    }

    #[test]
    fn any_nonzero_trailing_slot_fails_the_sweep(
        mut words in proptest::array::uniform8(any::<u64>()),
        reserved in 1usize..=REG_COUNT,
        poison in 1u64..,
    ) {
        for slot in &mut words[REG_COUNT - reserved..] {
            *slot = 0;
        }
        words[REG_COUNT - reserved] = poison;
        prop_assert!(!reserved_slots_zero(&CallRegs::from_array(words), reserved));
    }
}
