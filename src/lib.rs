//! closest-facility
//!
//! Nearest-facility lookups against a hosted network-analysis service: one
//! incident, a fixed set of facilities, and the route to whichever facility
//! the service ranks closest.

pub mod arcgis;
pub mod client;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod parameters;
pub mod polyline;
pub mod registry;
pub mod traits;

pub use client::{LookupOutcome, LookupRequest, LookupTracker, NearestFacilityClient};
pub use error::{ClosestFacilityError, ErrorKind, Phase, Result};
pub use geometry::{Location, SpatialReference};
pub use registry::FacilityRegistry;
