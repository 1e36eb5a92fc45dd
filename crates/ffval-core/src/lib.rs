// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! # ffval core
//!
//! Protocol core of the partition manager conformance suite. This crate
//! drives the register-based call interface of a hypervisor or secure
//! partition manager and checks observable results against the interface
//! contract:
//!
//! - [`conduit`]: the call shim - marshals the 8-register tuple across the
//!   hardware boundary, plus the host mock used by all tests
//! - [`memory`]: the external memory environment seam (alloc, translate,
//!   buffer copies)
//! - [`validator`]: result discriminant and reserved-field (MBZ) checks
//! - [`mailbox`]: send/receive buffer pair lifecycle
//! - [`messaging`]: indirect message transfer with bounded busy-retry
//! - [`transaction`]: donate/lend/share memory transaction state machine
//! - [`discovery`]: endpoint id, version, and feature queries
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` by default for running inside a bare-metal test
//! partition. The `std` feature is automatically enabled during testing to
//! allow use of standard library testing infrastructure and the host mocks.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod conduit;
pub mod discovery;
pub mod mailbox;
pub mod memory;
pub mod messaging;
pub mod transaction;
pub mod validator;

/// Crate version.
pub const VERSION: &str = match option_env!("FFVAL_VERSION") {
    Some(v) => v,
    None => "unknown",
};
