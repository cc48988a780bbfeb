/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::error::Error;
use std::fmt;

/// Failure kinds surfaced by the engine. Internal invariant violations
/// (monitor misuse, duplicate referent connections) are not represented
/// here; those abort via assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApzError {
    /// A newer operation of the same kind preempted this one. Delivered
    /// through the operation's completion sink, never retried internally.
    Cancelled,
    /// An auxiliary object (surface, buffer) could not be constructed.
    OutOfResources,
    /// Out-of-range dimensions or a malformed argument. Never retried.
    InvalidArgument(&'static str),
    /// The compositor is paused or its surface is gone. The operation
    /// becomes a no-op and a later resume recovers cleanly.
    Transient,
}

impl fmt::Display for ApzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ApzError::Cancelled => write!(f, "operation cancelled by a newer request"),
            ApzError::OutOfResources => write!(f, "out of resources"),
            ApzError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            ApzError::Transient => write!(f, "compositor unavailable"),
        }
    }
}

impl Error for ApzError {
    fn description(&self) -> &str {
        match *self {
            ApzError::Cancelled => "cancelled",
            ApzError::OutOfResources => "out of resources",
            ApzError::InvalidArgument(..) => "invalid argument",
            ApzError::Transient => "transient",
        }
    }
}
