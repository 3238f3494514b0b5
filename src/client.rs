//! Nearest-facility client: the two-phase lookup against a [`NetworkAnalysisTask`].
//!
//! A lookup fetches the service's default parameters, fills them with the
//! facilities and a single incident, solves, and takes the route to the
//! facility the service ranked first. Each call owns its parameters and
//! result, so concurrent lookups never observe each other's state.
//!
//! [`LookupTracker`] adds supersession on top: every accepted incident gets a
//! request id and a cancellation token, starting a new lookup cancels the
//! previous one, and completions for anything but the latest id are dropped.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClosestFacilityError, Phase, Result};
use crate::geometry::{Location, SpatialReference};
use crate::parameters::{Route, SolveResult};
use crate::traits::{Facility, Incident, NetworkAnalysisTask};

/// Upper bound on each remote call unless overridden.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(30);

/// Every lookup submits exactly one incident.
const INCIDENT_INDEX: usize = 0;

#[derive(Debug, Clone)]
pub struct NearestFacilityClient<T> {
    task: T,
    output_spatial_reference: Option<SpatialReference>,
    timeout: Option<Duration>,
}

impl<T: NetworkAnalysisTask> NearestFacilityClient<T> {
    pub fn new(task: T) -> Self {
        Self {
            task,
            output_spatial_reference: None,
            timeout: Some(DEFAULT_PHASE_TIMEOUT),
        }
    }

    /// Spatial reference for returned routes. Defaults to the incident's.
    pub fn with_output_spatial_reference(mut self, spatial_reference: SpatialReference) -> Self {
        self.output_spatial_reference = Some(spatial_reference);
        self
    }

    /// Per-phase timeout; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    /// Finds the route from `incident` to the facility the service ranks closest.
    pub async fn find_nearest_route(
        &self,
        incident: Location,
        facilities: &[Facility],
    ) -> Result<Route> {
        if facilities.is_empty() {
            return Err(ClosestFacilityError::EmptyRegistry);
        }

        let mut parameters = self
            .bounded(Phase::DefaultParameters, self.task.create_default_parameters())
            .await?;
        parameters.set_output_spatial_reference(
            self.output_spatial_reference
                .unwrap_or_else(|| incident.spatial_reference()),
        );
        parameters.add_facilities(facilities);
        parameters.add_incident(Incident::new(incident));

        let result = self
            .bounded(Phase::Solve, self.task.solve_closest_facility(&parameters))
            .await?;

        select_best_route(result, INCIDENT_INDEX)
    }

    /// Runs an accepted lookup until it completes or a newer incident cancels it.
    pub async fn run(&self, lookup: LookupRequest, facilities: &[Facility]) -> LookupOutcome {
        let LookupRequest {
            request,
            incident,
            token,
        } = lookup;

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(request, "lookup cancelled before completion");
                Err(ClosestFacilityError::Superseded { request })
            }
            result = self.find_nearest_route(incident, facilities) => result,
        };

        LookupOutcome {
            request,
            incident,
            result,
        }
    }

    async fn bounded<F, R>(&self, phase: Phase, call: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(%phase, ?limit, "remote call timed out");
                ClosestFacilityError::remote(phase, format!("timed out after {:?}", limit))
            })?,
            None => call.await,
        }
    }
}

/// Takes rank 0 for `incident` exactly as the service ordered it.
fn select_best_route(result: SolveResult, incident: usize) -> Result<Route> {
    let ranked = result.ranked_facilities(incident);
    debug!(incident, ranked = ranked.len(), "received ranked facilities");

    let Some(&facility) = ranked.first() else {
        return Err(ClosestFacilityError::NoRouteFound { incident });
    };

    let route = result
        .into_route(facility, incident)
        .ok_or_else(|| ClosestFacilityError::MalformedResult {
            facility: Some(facility),
            incident,
            reason: "route for top-ranked facility is missing".to_string(),
        })?;

    if route.geometry.is_empty() {
        return Err(ClosestFacilityError::MalformedResult {
            facility: Some(facility),
            incident,
            reason: "route geometry is empty".to_string(),
        });
    }

    info!(facility, incident, cost = ?route.cost, "selected closest facility");
    Ok(route)
}

/// An accepted incident waiting to be looked up.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub request: u64,
    pub incident: Location,
    token: CancellationToken,
}

impl LookupRequest {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// The result of one lookup, tagged with the request it answers.
#[derive(Debug)]
pub struct LookupOutcome {
    pub request: u64,
    pub incident: Location,
    pub result: Result<Route>,
}

/// Tracks the latest accepted incident. Owned by whoever owns the display.
#[derive(Debug, Default)]
pub struct LookupTracker {
    latest: u64,
    current: Option<CancellationToken>,
}

impl LookupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a new incident, cancelling any lookup still in flight.
    pub fn begin(&mut self, incident: Location) -> LookupRequest {
        if let Some(previous) = self.current.take() {
            if !previous.is_cancelled() {
                debug!(request = self.latest, "superseding in-flight lookup");
            }
            previous.cancel();
        }

        self.latest += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());

        LookupRequest {
            request: self.latest,
            incident,
            token,
        }
    }

    pub fn latest(&self) -> Option<u64> {
        (self.latest > 0).then_some(self.latest)
    }

    pub fn is_latest(&self, request: u64) -> bool {
        self.latest == request
    }

    /// Keeps the outcome only if it answers the latest request.
    pub fn accept(&mut self, outcome: LookupOutcome) -> Result<(Location, Route)> {
        if !self.is_latest(outcome.request) {
            debug!(
                request = outcome.request,
                latest = self.latest,
                "dropping stale lookup completion"
            );
            return Err(ClosestFacilityError::Superseded {
                request: outcome.request,
            });
        }
        self.current = None;
        outcome.result.map(|route| (outcome.incident, route))
    }
}
