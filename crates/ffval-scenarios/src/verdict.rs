// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Scenario verdicts and point-of-failure tags.

use core::fmt;

/// Identifies where in a scenario the first error was observed.
///
/// Each scenario assigns its tags from a module-local table; the numeric
/// value is stable across runs so a failing step can be located without a
/// log trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailPoint(pub u32);

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point {}", self.0)
    }
}

/// Aggregate outcome of one scenario.
///
/// The first error encountered decides the verdict; cleanup failures never
/// overwrite an earlier failure tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every checked step conformed.
    Pass,
    /// A step failed; the tag names which one.
    Fail(FailPoint),
    /// A required operation is not implemented by the callee; the scenario
    /// cannot judge conformance and must not count as a failure.
    Skip,
}

impl Verdict {
    /// Whether the scenario conformed.
    #[must_use]
    pub const fn passed(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail(point) => write!(f, "fail at {point}"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Folds a step result into a running verdict, keeping the first failure.
pub(crate) fn record(verdict: &mut Verdict, step: Result<(), FailPoint>) {
    if let (Verdict::Pass, Err(point)) = (*verdict, step) {
        log::error!("scenario step failed at {point}");
        *verdict = Verdict::Fail(point);
    }
}
