// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Tests for endpoint, handle, and version types.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

#[test]
fn endpoint_packing() {
    let sender = EndpointId::new(0x8001);
    let receiver = EndpointId::new(0x0002);
    let reg = EndpointId::pack(sender, receiver);
    assert_eq!(reg, 0x8001_0002);

    let (s, r) = EndpointId::unpack(reg);
    assert_eq!(s, sender);
    assert_eq!(r, receiver);
}

#[test]
fn endpoint_unpack_ignores_upper_word() {
    let (s, r) = EndpointId::unpack(0xFFFF_FFFF_8001_0002);
    assert_eq!(s.as_u16(), 0x8001);
    assert_eq!(r.as_u16(), 0x0002);
}

#[test]
fn handle_register_halves() {
    let handle = Handle::new(0xAAAA_BBBB_CCCC_DDDD);
    assert_eq!(handle.lo(), 0xCCCC_DDDD);
    assert_eq!(handle.hi(), 0xAAAA_BBBB);
    assert_eq!(Handle::from_parts(handle.lo(), handle.hi()), handle);
}

#[test]
fn handle_from_parts_masks_garbage() {
    // Halves arrive in 64-bit registers; upper halves must be ignored.
    let handle = Handle::from_parts(0x9999_0000_CCCC_DDDD, 0x9999_0000_AAAA_BBBB);
    assert_eq!(handle.as_u64(), 0xAAAA_BBBB_CCCC_DDDD);
}

#[test]
fn version_encoding() {
    let version = Version::new(1, 1);
    assert_eq!(version.to_reg(), 0x0001_0001);
    assert_eq!(Version::from_reg(0x0001_0001), version);

    let decoded = Version::from_reg(0x0002_0000);
    assert_eq!(decoded.major, 2);
    assert_eq!(decoded.minor, 0);
}

#[test]
fn version_ordering() {
    assert!(Version::new(1, 0) < Version::new(1, 1));
    assert!(Version::new(1, 9) < Version::new(2, 0));
}
