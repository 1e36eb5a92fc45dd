// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Register-level ABI definitions for the partition manager call interface.
//!
//! This crate defines the bit-exact contract between the conformance core and
//! the partition manager under test:
//! - Function identifiers for every call, in both SMC32 and SMC64 encodings
//! - The fixed 8-register argument/result tuple
//! - Status codes returned in the error discriminant
//! - Newtypes for endpoints, transaction handles, versions, and addresses
//!
//! # Design Principles
//!
//! - **No dependencies**: Pure data types, 100% host-testable
//! - **Stable layout**: The register tuple uses `#[repr(C)]`
//! - **Width as a parameter**: A call is an operation plus a register width,
//!   never two distinct operations
//!
//! # Modules
//!
//! - [`function`]: Operations, register widths, and the function id table
//! - [`regs`]: The 8-word call/result register tuple
//! - [`status`]: Status codes carried in the error discriminant
//! - [`types`]: `EndpointId`, `Handle`, `Version`, `Vaddr`, `Paddr`
//! - [`layout`]: Buffer and page size constants

#![no_std]

pub mod function;
pub mod layout;
pub mod regs;
pub mod status;
pub mod types;

// Re-export commonly used types at crate root
pub use function::{AbiFunc, RegWidth};
pub use layout::{MAX_MSG_SIZE, PAGE_SIZE_4K, REG_COUNT};
pub use regs::CallRegs;
pub use status::StatusCode;
pub use types::{EndpointId, Handle, Paddr, Vaddr, Version};
