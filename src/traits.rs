//! Core domain types and the seam to the remote network-analysis service.
//!
//! The service is closed-source and owns the routing itself; everything this
//! crate knows about it goes through [`NetworkAnalysisTask`], so tests and
//! alternative transports can stand in for the HTTP adapter.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Location;
use crate::parameters::{ClosestFacilityParameters, SolveResult};

/// A candidate service point. Its index in the registry is its identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    location: Location,
}

impl Facility {
    pub const fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

impl From<Location> for Facility {
    fn from(location: Location) -> Self {
        Facility::new(location)
    }
}

/// The query point a user dropped on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    location: Location,
}

impl Incident {
    pub const fn new(location: Location) -> Self {
        Self { location }
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

impl From<Location> for Incident {
    fn from(location: Location) -> Self {
        Incident::new(location)
    }
}

/// A remote closest-facility solver.
///
/// Both calls suspend and may fail independently. Implementations report
/// transport and service failures as
/// [`ClosestFacilityError::RemoteUnavailable`](crate::error::ClosestFacilityError::RemoteUnavailable).
pub trait NetworkAnalysisTask: Send + Sync {
    /// Fetches the service's default solve parameters.
    fn create_default_parameters(
        &self,
    ) -> impl Future<Output = Result<ClosestFacilityParameters>> + Send;

    /// Solves for the closest facilities of every incident in `parameters`.
    fn solve_closest_facility(
        &self,
        parameters: &ClosestFacilityParameters,
    ) -> impl Future<Output = Result<SolveResult>> + Send;
}
