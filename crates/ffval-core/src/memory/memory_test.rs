// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ffval_abi::{PAGE_SIZE_4K, Vaddr};

use super::{MemoryEnv, MockMemory};

const BASE: u64 = 0x4000_0000;

fn env() -> MockMemory {
    MockMemory::new(4 * PAGE_SIZE_4K, Vaddr::new(BASE))
}

#[test]
fn allocations_are_page_aligned_and_disjoint() {
    let mut mem = env();
    let a = mem.alloc(100).unwrap();
    let b = mem.alloc(PAGE_SIZE_4K + 1).unwrap();
    assert!(a.is_aligned(PAGE_SIZE_4K as u64));
    assert!(b.is_aligned(PAGE_SIZE_4K as u64));
    // 100 bytes still consume a whole page.
    assert_eq!(b.as_u64() - a.as_u64(), PAGE_SIZE_4K as u64);
}

#[test]
fn alloc_fails_on_exhaustion() {
    let mut mem = env();
    assert!(mem.alloc(4 * PAGE_SIZE_4K).is_some());
    assert!(mem.alloc(1).is_none());
}

#[test]
fn outstanding_tracks_alloc_free_balance() {
    let mut mem = env();
    let a = mem.alloc(PAGE_SIZE_4K).unwrap();
    let b = mem.alloc(PAGE_SIZE_4K).unwrap();
    assert_eq!(mem.outstanding(), 2);
    mem.free(a, PAGE_SIZE_4K);
    mem.free(b, PAGE_SIZE_4K);
    assert_eq!(mem.outstanding(), 0);
}

#[test]
fn translation_is_identity_within_bounds() {
    let mem = env();
    let inside = Vaddr::new(BASE + 0x123);
    assert_eq!(mem.translate(inside).unwrap().as_u64(), BASE + 0x123);
    assert!(mem.translate(Vaddr::new(BASE - 1)).is_none());
    assert!(mem.translate(Vaddr::new(BASE + 4 * PAGE_SIZE_4K as u64)).is_none());
}

#[test]
fn write_then_read_round_trips() {
    let mut mem = env();
    let va = mem.alloc(PAGE_SIZE_4K).unwrap();
    mem.write(va.add(8), b"payload");
    let mut out = [0u8; 7];
    mem.read(va.add(8), &mut out);
    assert_eq!(&out, b"payload");
}

#[test]
fn shared_handle_sees_the_same_bytes() {
    let mut mem = env();
    let shared = mem.share();
    let va = mem.alloc(PAGE_SIZE_4K).unwrap();
    mem.write(va, &[0xAB; 4]);
    let offset = (va.as_u64() - BASE) as usize;
    assert_eq!(shared.borrow()[offset..offset + 4], [0xAB; 4]);
}

#[test]
#[should_panic(expected = "beyond end of mock memory")]
fn out_of_bounds_access_panics() {
    let mem = env();
    let mut out = [0u8; 8];
    mem.read(Vaddr::new(BASE + 4 * PAGE_SIZE_4K as u64 - 4), &mut out);
}
