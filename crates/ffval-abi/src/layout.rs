// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Buffer and register layout constants.

/// Number of registers in the call/result tuple.
pub const REG_COUNT: usize = 8;

/// Size of one translation granule page used for communication buffers.
pub const PAGE_SIZE_4K: usize = 4096;

/// Largest message payload that fits a single-page send buffer.
pub const MAX_MSG_SIZE: usize = PAGE_SIZE_4K;
