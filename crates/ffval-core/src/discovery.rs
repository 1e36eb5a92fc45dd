// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Interface discovery: version negotiation, endpoint id query, and
//! per-function feature probing.

use core::fmt;

use ffval_abi::{AbiFunc, CallRegs, EndpointId, RegWidth, StatusCode, Version};

use crate::conduit::{Conduit, invoke};
use crate::validator::{self, Discriminant};


/// Reserved trailing slots in an id-query result: the id occupies slot 2,
/// slot 1 is zero on success, slots 3..8 are reserved.
const ID_RESERVED_SLOTS: usize = 5;

/// Error during a discovery query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The query returned an error discriminant.
    Abi(StatusCode),
    /// The callee does not implement the versioned interface at all.
    Unsupported,
    /// A nonzero value was read in a reserved result slot.
    ReservedField,
    /// The result could not be classified as success or error.
    Malformed(u64),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abi(code) => write!(f, "discovery call failed: {code}"),
            Self::Unsupported => write!(f, "versioned interface not implemented"),
            Self::ReservedField => write!(f, "nonzero value in reserved result slot"),
            Self::Malformed(raw) => write!(f, "unclassifiable discovery result {raw:#x}"),
        }
    }
}

/// Negotiates the interface version.
///
/// The version call is special-cased on the wire: on success the agreed
/// version comes back *in slot 0* instead of a success discriminant.
/// An all-ones slot 0 is the legacy not-supported encoding and is
/// reported as [`DiscoveryError::Unsupported`].
pub fn version<C: Conduit>(
    conduit: &mut C,
    requested: Version,
) -> Result<Version, DiscoveryError> {
    let mut regs = CallRegs::default();
    regs.arg1 = requested.to_reg();
    let result = invoke(conduit, AbiFunc::Version, RegWidth::Bits32, regs);

    match validator::classify(&result) {
        Discriminant::Error(code) => Err(DiscoveryError::Abi(code)),
        Discriminant::MalformedError(raw) => Err(DiscoveryError::Malformed(raw)),
        _ => {
            let word = result.fid & 0xFFFF_FFFF;
            if word == StatusCode::NotSupported.to_reg() {
                return Err(DiscoveryError::Unsupported);
            }
            Ok(Version::from_reg(word))
        }
    }
}

/// Queries the caller's own endpoint id.
pub fn endpoint_id<C: Conduit>(conduit: &mut C) -> Result<EndpointId, DiscoveryError> {
    let result = invoke(conduit, AbiFunc::IdGet, RegWidth::Bits32, CallRegs::default());

    let outcome = validator::validate(&result, ID_RESERVED_SLOTS);
    match outcome.discriminant {
        discriminant if discriminant.is_success() => {
            if !outcome.reserved_ok {
                return Err(DiscoveryError::ReservedField);
            }
            Ok(EndpointId::new(result.arg2 as u16))
        }
        Discriminant::Error(code) => Err(DiscoveryError::Abi(code)),
        _ => Err(DiscoveryError::Malformed(result.fid)),
    }
}

/// Caches the caller's endpoint id across a session.
///
/// The id is immutable once assigned, so one successful query answers
/// every later lookup without reinvoking the callee.
#[derive(Debug, Default)]
pub struct EndpointCache {
    id: Option<EndpointId>,
}

impl EndpointCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { id: None }
    }

    /// Returns the cached id, querying the callee on first use.
    pub fn get<C: Conduit>(&mut self, conduit: &mut C) -> Result<EndpointId, DiscoveryError> {
        if let Some(id) = self.id {
            return Ok(id);
        }
        let id = endpoint_id(conduit)?;
        self.id = Some(id);
        Ok(id)
    }
}

/// Probes whether the callee implements `func` at `width`.
///
/// `Ok(false)` is the well-formed "not implemented" answer; hard errors
/// and malformed results are still reported as `Err`.
pub fn feature_supported<C: Conduit>(
    conduit: &mut C,
    func: AbiFunc,
    width: RegWidth,
) -> Result<bool, DiscoveryError> {
    let mut regs = CallRegs::default();
    regs.arg1 = u64::from(func.id(width));
    let result = invoke(conduit, AbiFunc::Features, RegWidth::Bits32, regs);

    match validator::classify(&result) {
        discriminant if discriminant.is_success() => Ok(true),
        Discriminant::Error(StatusCode::NotSupported) => Ok(false),
        Discriminant::Error(code) => Err(DiscoveryError::Abi(code)),
        Discriminant::MalformedError(raw) => Err(DiscoveryError::Malformed(raw)),
        _ => Err(DiscoveryError::Malformed(result.fid)),
    }
}
