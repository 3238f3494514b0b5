//! Error taxonomy for nearest-facility lookups.

use std::fmt;

use thiserror::Error;

/// Which remote call of a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DefaultParameters,
    Solve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::DefaultParameters => write!(f, "default parameters"),
            Phase::Solve => write!(f, "solve"),
        }
    }
}

/// Coarse classification of [`ClosestFacilityError`] for callers that only branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RemoteUnavailable,
    NoRouteFound,
    MalformedResult,
    Superseded,
    EmptyRegistry,
}

/// Terminal failure of a single lookup. Nothing is retried.
#[derive(Debug, Error)]
pub enum ClosestFacilityError {
    /// The service could not be reached, timed out, or reported a failure.
    #[error("network analysis service unavailable during {phase}: {reason}")]
    RemoteUnavailable { phase: Phase, reason: String },

    /// The solve succeeded but no facility is reachable from the incident.
    #[error("no route found for incident {incident}")]
    NoRouteFound { incident: usize },

    /// A returned route could not be read, or the top-ranked one is missing or unusable.
    #[error("malformed result for incident {incident}: {reason}")]
    MalformedResult {
        /// The facility involved, when the service identified one.
        facility: Option<usize>,
        incident: usize,
        reason: String,
    },

    /// A newer incident replaced this lookup before it completed.
    #[error("lookup {request} superseded by a newer incident")]
    Superseded { request: u64 },

    #[error("facility registry is empty")]
    EmptyRegistry,
}

impl ClosestFacilityError {
    pub fn remote(phase: Phase, reason: impl Into<String>) -> Self {
        ClosestFacilityError::RemoteUnavailable {
            phase,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClosestFacilityError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            ClosestFacilityError::NoRouteFound { .. } => ErrorKind::NoRouteFound,
            ClosestFacilityError::MalformedResult { .. } => ErrorKind::MalformedResult,
            ClosestFacilityError::Superseded { .. } => ErrorKind::Superseded,
            ClosestFacilityError::EmptyRegistry => ErrorKind::EmptyRegistry,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClosestFacilityError>;
