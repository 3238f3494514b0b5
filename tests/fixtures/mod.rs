//! Test fixtures for closest-facility.
//!
//! Provides a scripted in-memory network-analysis service so lookups can be
//! exercised without the hosted one.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use closest_facility::error::{ClosestFacilityError, Phase, Result};
use closest_facility::geometry::Location;
use closest_facility::parameters::{ClosestFacilityParameters, Route, SolveResult};
use closest_facility::polyline::Polyline;
use closest_facility::traits::NetworkAnalysisTask;

/// What the scripted service answers to a solve.
#[derive(Debug, Clone)]
pub enum SolveBehavior {
    /// Ranks every facility by straight-line distance; routes are straight lines.
    Nearest,
    /// Uses this ranking verbatim, with straight-line routes for each entry.
    Ranked(Vec<usize>),
    /// Ranks a facility but returns no route for it.
    RankedWithoutRoute(usize),
    Empty,
    Fail(String),
    Hang,
}

pub struct ScriptedTask {
    pub fail_defaults: bool,
    pub solve: SolveBehavior,
    /// Simulated service latency, derived from the incident.
    pub latency: fn(&Location) -> Duration,
    default_calls: AtomicUsize,
    solve_calls: AtomicUsize,
    last_parameters: Mutex<Option<ClosestFacilityParameters>>,
}

fn no_latency(_: &Location) -> Duration {
    Duration::ZERO
}

impl ScriptedTask {
    pub fn new(solve: SolveBehavior) -> Self {
        Self {
            fail_defaults: false,
            solve,
            latency: no_latency,
            default_calls: AtomicUsize::new(0),
            solve_calls: AtomicUsize::new(0),
            last_parameters: Mutex::new(None),
        }
    }

    pub fn failing_defaults() -> Self {
        Self {
            fail_defaults: true,
            ..Self::new(SolveBehavior::Nearest)
        }
    }

    pub fn with_latency(mut self, latency: fn(&Location) -> Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn default_calls(&self) -> usize {
        self.default_calls.load(Ordering::SeqCst)
    }

    pub fn solve_calls(&self) -> usize {
        self.solve_calls.load(Ordering::SeqCst)
    }

    pub fn last_parameters(&self) -> Option<ClosestFacilityParameters> {
        self.last_parameters.lock().unwrap().clone()
    }
}

impl NetworkAnalysisTask for ScriptedTask {
    async fn create_default_parameters(&self) -> Result<ClosestFacilityParameters> {
        self.default_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_defaults {
            return Err(ClosestFacilityError::remote(
                Phase::DefaultParameters,
                "connection refused",
            ));
        }
        let mut parameters = ClosestFacilityParameters::default();
        parameters.impedance = Some("TravelTime".to_string());
        Ok(parameters)
    }

    async fn solve_closest_facility(
        &self,
        parameters: &ClosestFacilityParameters,
    ) -> Result<SolveResult> {
        self.solve_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_parameters.lock().unwrap() = Some(parameters.clone());

        let incident = parameters.incidents()[0].location();
        let latency = (self.latency)(&incident);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let straight = |facility: usize, rank: u32| {
            let target = parameters.facilities()[facility].location();
            Route {
                facility_index: facility,
                incident_index: 0,
                facility_rank: Some(rank),
                cost: Some(incident.distance_to(&target)),
                totals: BTreeMap::new(),
                geometry: Polyline::new(
                    vec![incident.coords(), target.coords()],
                    incident.spatial_reference(),
                ),
            }
        };

        match &self.solve {
            SolveBehavior::Nearest => {
                let mut order: Vec<usize> = (0..parameters.facilities().len()).collect();
                order.sort_by(|a, b| {
                    let da = incident.distance_to(&parameters.facilities()[*a].location());
                    let db = incident.distance_to(&parameters.facilities()[*b].location());
                    da.total_cmp(&db)
                });
                Ok(SolveResult::from_routes(
                    order
                        .into_iter()
                        .enumerate()
                        .map(|(rank, facility)| straight(facility, rank as u32 + 1))
                        .collect(),
                ))
            }
            SolveBehavior::Ranked(order) => {
                let mut result = SolveResult::new();
                for (rank, facility) in order.iter().enumerate() {
                    result.insert_route(straight(*facility, rank as u32 + 1));
                }
                result.set_ranked_facilities(0, order.clone());
                Ok(result)
            }
            SolveBehavior::RankedWithoutRoute(facility) => {
                let mut result = SolveResult::new();
                result.set_ranked_facilities(0, vec![*facility]);
                Ok(result)
            }
            SolveBehavior::Empty => Ok(SolveResult::new()),
            SolveBehavior::Fail(reason) => Err(ClosestFacilityError::remote(Phase::Solve, reason.clone())),
            SolveBehavior::Hang => std::future::pending::<Result<SolveResult>>().await,
        }
    }
}

/// Asserts two locations are within `tolerance` map units.
pub fn assert_near(actual: Location, expected: Location, tolerance: f64) {
    let distance = actual.distance_to(&expected);
    assert!(
        distance <= tolerance,
        "expected {:?} within {} of {:?}, was {}",
        actual.coords(),
        tolerance,
        expected.coords(),
        distance
    );
}
