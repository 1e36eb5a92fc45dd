// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Core type definitions for endpoints, handles, versions, and addresses.
//!
//! These newtypes prevent accidentally mixing different ABI values at
//! compile time.

mod addr;
mod id;

#[cfg(test)]
mod id_test;

pub use addr::{Paddr, Vaddr};
pub use id::{EndpointId, Handle, Version};
