// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! # ffval scenarios
//!
//! End-to-end conformance scenarios, each reporting one aggregate
//! [`Verdict`]. Scenarios only consume the protocol core's public surface
//! and the two external seams (conduit and memory environment); a runner
//! sequences them and aggregates verdicts.
//!
//! - [`msg_send`]: registered buffer pair, two indirect transfers, full
//!   cleanup
//! - [`mem_sharing`]: one donate/lend/share lifecycle per kind and width

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod mem_sharing;
pub mod msg_send;
pub mod verdict;

pub use verdict::{FailPoint, Verdict};
