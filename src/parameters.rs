//! Solve parameters and results exchanged with the network-analysis service.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::SpatialReference;
use crate::polyline::Polyline;
use crate::traits::{Facility, Incident};

/// Whether travel is measured from the incident to the facility or back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelDirection {
    #[default]
    ToFacility,
    FromFacility,
}

impl TravelDirection {
    pub fn as_esri(self) -> &'static str {
        match self {
            TravelDirection::ToFacility => "esriNATravelDirectionToFacility",
            TravelDirection::FromFacility => "esriNATravelDirectionFromFacility",
        }
    }

    pub fn from_esri(value: &str) -> Option<Self> {
        match value {
            "esriNATravelDirectionToFacility" => Some(TravelDirection::ToFacility),
            "esriNATravelDirectionFromFacility" => Some(TravelDirection::FromFacility),
            _ => None,
        }
    }
}

/// Parameters for one closest-facility solve.
///
/// Obtained from the service's defaults, then populated with the output
/// spatial reference, the facilities and the incident. Built fresh per lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestFacilityParameters {
    /// Network attribute used as cost, e.g. `TravelTime`.
    pub impedance: Option<String>,
    pub default_target_facility_count: u32,
    pub travel_direction: TravelDirection,
    pub default_cutoff: Option<f64>,
    pub accumulate_attribute_names: Vec<String>,
    pub restrict_u_turns: Option<String>,
    pub use_hierarchy: Option<bool>,
    output_spatial_reference: Option<SpatialReference>,
    facilities: Vec<Facility>,
    incidents: Vec<Incident>,
}

impl Default for ClosestFacilityParameters {
    fn default() -> Self {
        Self {
            impedance: None,
            default_target_facility_count: 1,
            travel_direction: TravelDirection::ToFacility,
            default_cutoff: None,
            accumulate_attribute_names: Vec::new(),
            restrict_u_turns: None,
            use_hierarchy: None,
            output_spatial_reference: None,
            facilities: Vec::new(),
            incidents: Vec::new(),
        }
    }
}

impl ClosestFacilityParameters {
    pub fn set_output_spatial_reference(&mut self, spatial_reference: SpatialReference) {
        self.output_spatial_reference = Some(spatial_reference);
    }

    pub fn output_spatial_reference(&self) -> Option<SpatialReference> {
        self.output_spatial_reference
    }

    /// Appends facilities, keeping their order. Order defines facility indices.
    pub fn add_facilities(&mut self, facilities: &[Facility]) {
        self.facilities.extend_from_slice(facilities);
    }

    pub fn add_incident(&mut self, incident: Incident) {
        self.incidents.push(incident);
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }
}

/// Path and cost from one incident to one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub facility_index: usize,
    pub incident_index: usize,
    /// 1-based rank assigned by the service, when reported.
    pub facility_rank: Option<u32>,
    /// Cost in the impedance attribute's units.
    pub cost: Option<f64>,
    /// All accumulated totals, keyed by attribute name without the `Total_` prefix.
    pub totals: BTreeMap<String, f64>,
    pub geometry: Polyline,
}

/// Ranked facilities per incident and the routes behind them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveResult {
    ranked: BTreeMap<usize, Vec<usize>>,
    routes: HashMap<(usize, usize), Route>,
}

impl SolveResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the ranked lists from routes in the order the service returned them.
    ///
    /// Routes carrying a service rank are ordered by it; the sort is stable so
    /// ties and unranked routes keep their response order.
    pub fn from_routes(routes: Vec<Route>) -> Self {
        let mut result = SolveResult::new();
        let mut ranked: BTreeMap<usize, Vec<(u32, usize)>> = BTreeMap::new();
        for route in routes {
            ranked
                .entry(route.incident_index)
                .or_default()
                .push((route.facility_rank.unwrap_or(u32::MAX), route.facility_index));
            result.insert_route(route);
        }
        for (incident, mut entries) in ranked {
            entries.sort_by_key(|(rank, _)| *rank);
            result.ranked.insert(
                incident,
                entries.into_iter().map(|(_, facility)| facility).collect(),
            );
        }
        result
    }

    pub fn set_ranked_facilities(&mut self, incident: usize, facilities: Vec<usize>) {
        self.ranked.insert(incident, facilities);
    }

    pub fn insert_route(&mut self, route: Route) {
        self.routes
            .insert((route.facility_index, route.incident_index), route);
    }

    /// Facility indices for `incident` by increasing cost. Empty when nothing is reachable.
    pub fn ranked_facilities(&self, incident: usize) -> &[usize] {
        self.ranked
            .get(&incident)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn route(&self, facility: usize, incident: usize) -> Option<&Route> {
        self.routes.get(&(facility, incident))
    }

    pub fn into_route(mut self, facility: usize, incident: usize) -> Option<Route> {
        self.routes.remove(&(facility, incident))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }
}
