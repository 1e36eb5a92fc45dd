// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Endpoint, handle, and version types.

use core::fmt;

/// A 16-bit id uniquely naming a partition or VM within the system.
///
/// Endpoint ids are assigned by the partition manager and obtained through
/// the id query call; they are immutable once obtained. Sender and
/// receiver pack into a single argument register for messaging calls.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct EndpointId(u16);

impl EndpointId {
    /// Creates a new endpoint id.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Packs sender and receiver ids into one argument register:
    /// sender in bits `[31:16]`, receiver in bits `[15:0]`.
    #[must_use]
    pub const fn pack(sender: Self, receiver: Self) -> u64 {
        ((sender.0 as u64) << 16) | receiver.0 as u64
    }

    /// Unpacks a `(sender, receiver)` pair from an argument register.
    #[must_use]
    pub const fn unpack(reg: u64) -> (Self, Self) {
        (Self((reg >> 16) as u16), Self(reg as u16))
    }
}

impl fmt::Debug for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointId({:#x})", self.0)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep:{:#x}", self.0)
    }
}

/// An opaque capability naming an in-progress memory transaction.
///
/// Handles are issued by the callee when a transaction starts and split
/// across two 32-bit register halves on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Creates a handle from its raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Reassembles a handle from its low and high register halves.
    #[must_use]
    pub const fn from_parts(lo: u64, hi: u64) -> Self {
        Self((lo & 0xFFFF_FFFF) | ((hi & 0xFFFF_FFFF) << 32))
    }

    /// Returns the raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Low 32 bits, as placed in the first handle register.
    #[inline]
    #[must_use]
    pub const fn lo(self) -> u64 {
        self.0 & 0xFFFF_FFFF
    }

    /// High 32 bits, as placed in the second handle register.
    #[inline]
    #[must_use]
    pub const fn hi(self) -> u64 {
        self.0 >> 32
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle:{:#x}", self.0)
    }
}

/// An interface version: major in bits `[30:16]`, minor in bits `[15:0]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Major revision; incompatible changes.
    pub major: u16,
    /// Minor revision; backwards-compatible changes.
    pub minor: u16,
}

impl Version {
    /// Creates a version from its parts.
    #[inline]
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Decodes a version from its packed register encoding.
    #[must_use]
    pub const fn from_reg(reg: u64) -> Self {
        Self {
            major: ((reg >> 16) & 0x7FFF) as u16,
            minor: reg as u16,
        }
    }

    /// Packs the version into its register encoding.
    #[must_use]
    pub const fn to_reg(self) -> u64 {
        (((self.major & 0x7FFF) as u64) << 16) | self.minor as u64
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({}.{})", self.major, self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}
