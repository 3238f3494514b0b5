//! ArcGIS REST adapter for a NAServer closest-facility layer.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{ClosestFacilityError, Phase, Result};
use crate::geometry::{Location, SpatialReference};
use crate::parameters::{ClosestFacilityParameters, Route, SolveResult, TravelDirection};
use crate::polyline::Polyline;
use crate::traits::NetworkAnalysisTask;

#[derive(Debug, Clone)]
pub struct ArcGisConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub output_spatial_reference: SpatialReference,
}

impl Default for ArcGisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sampleserver6.arcgisonline.com/arcgis/rest/services/NetworkAnalysis/SanDiego/NAServer/ClosestFacility".to_string(),
            timeout_secs: 10,
            output_spatial_reference: SpatialReference::WEB_MERCATOR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArcGisClosestFacilityTask {
    config: ArcGisConfig,
    client: reqwest::Client,
}

impl ArcGisClosestFacilityTask {
    pub fn new(config: ArcGisConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ArcGisConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

impl NetworkAnalysisTask for ArcGisClosestFacilityTask {
    async fn create_default_parameters(&self) -> Result<ClosestFacilityParameters> {
        let phase = Phase::DefaultParameters;
        debug!(url = self.base_url(), "fetching closest facility layer description");

        let body = self
            .client
            .get(self.base_url())
            .query(&[("f", "json")])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| ClosestFacilityError::remote(phase, err.to_string()))?
            .json::<LayerDescription>()
            .await
            .map_err(|err| ClosestFacilityError::remote(phase, format!("malformed response: {}", err)))?;

        let mut parameters = body.into_parameters()?;
        parameters.set_output_spatial_reference(self.config.output_spatial_reference);
        Ok(parameters)
    }

    async fn solve_closest_facility(
        &self,
        parameters: &ClosestFacilityParameters,
    ) -> Result<SolveResult> {
        let phase = Phase::Solve;
        let url = format!("{}/solveClosestFacility", self.base_url());
        let form = solve_form(parameters);
        debug!(
            url = %url,
            facilities = parameters.facilities().len(),
            incidents = parameters.incidents().len(),
            "submitting closest facility solve"
        );

        let body = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| ClosestFacilityError::remote(phase, err.to_string()))?
            .json::<SolveResponse>()
            .await
            .map_err(|err| ClosestFacilityError::remote(phase, format!("malformed response: {}", err)))?;

        body.into_result(parameters)
    }
}

/// Form fields for `solveClosestFacility`.
fn solve_form(parameters: &ClosestFacilityParameters) -> Vec<(&'static str, String)> {
    let out_sr = parameters.output_spatial_reference().unwrap_or_default();
    let mut form = vec![
        ("f", "json".to_string()),
        (
            "facilities",
            point_features(parameters.facilities().iter().map(|f| f.location())).to_string(),
        ),
        (
            "incidents",
            point_features(parameters.incidents().iter().map(|i| i.location())).to_string(),
        ),
        ("outSR", out_sr.wkid.to_string()),
        ("returnCFRoutes", "true".to_string()),
        ("returnFacilities", "false".to_string()),
        ("returnIncidents", "false".to_string()),
        ("outputLines", "esriNAOutputLineTrueShape".to_string()),
        (
            "defaultTargetFacilityCount",
            parameters.default_target_facility_count.to_string(),
        ),
        ("travelDirection", parameters.travel_direction.as_esri().to_string()),
    ];

    if let Some(impedance) = &parameters.impedance {
        form.push(("impedanceAttributeName", impedance.clone()));
    }
    if let Some(cutoff) = parameters.default_cutoff {
        form.push(("defaultCutoff", cutoff.to_string()));
    }
    if !parameters.accumulate_attribute_names.is_empty() {
        form.push((
            "accumulateAttributeNames",
            parameters.accumulate_attribute_names.join(","),
        ));
    }
    if let Some(policy) = &parameters.restrict_u_turns {
        form.push(("restrictUTurns", policy.clone()));
    }
    if let Some(use_hierarchy) = parameters.use_hierarchy {
        form.push(("useHierarchy", use_hierarchy.to_string()));
    }

    form
}

fn point_features(locations: impl Iterator<Item = Location>) -> Value {
    let features: Vec<Value> = locations
        .map(|location| {
            json!({
                "geometry": {
                    "x": location.x(),
                    "y": location.y(),
                    "spatialReference": { "wkid": location.spatial_reference().wkid },
                }
            })
        })
        .collect();
    json!({ "features": features })
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

impl ServiceError {
    fn into_error(self, phase: Phase) -> ClosestFacilityError {
        let mut reason = match self.code {
            Some(code) => format!("service error {}: {}", code, self.message),
            None => format!("service error: {}", self.message),
        };
        if !self.details.is_empty() {
            reason.push_str(&format!(" ({})", self.details.join("; ")));
        }
        ClosestFacilityError::remote(phase, reason)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerDescription {
    impedance: Option<String>,
    default_target_facility_count: Option<u32>,
    travel_direction: Option<String>,
    default_cutoff_value: Option<f64>,
    #[serde(default)]
    accumulate_attribute_names: Vec<String>,
    #[serde(rename = "restrictUTurns")]
    restrict_u_turns: Option<String>,
    use_hierarchy: Option<bool>,
    error: Option<ServiceError>,
}

impl LayerDescription {
    fn into_parameters(self) -> Result<ClosestFacilityParameters> {
        if let Some(error) = self.error {
            return Err(error.into_error(Phase::DefaultParameters));
        }

        let mut parameters = ClosestFacilityParameters::default();
        parameters.impedance = self.impedance;
        if let Some(count) = self.default_target_facility_count {
            parameters.default_target_facility_count = count.max(1);
        }
        if let Some(direction) = self.travel_direction.as_deref() {
            match TravelDirection::from_esri(direction) {
                Some(direction) => parameters.travel_direction = direction,
                None => warn!(direction, "unknown travel direction, using default"),
            }
        }
        parameters.default_cutoff = self.default_cutoff_value;
        parameters.accumulate_attribute_names = self.accumulate_attribute_names;
        parameters.restrict_u_turns = self.restrict_u_turns;
        parameters.use_hierarchy = self.use_hierarchy;
        Ok(parameters)
    }
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    routes: Option<RouteFeatureSet>,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteFeatureSet {
    spatial_reference: Option<SpatialReference>,
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    #[serde(default)]
    attributes: Map<String, Value>,
    geometry: Option<PathGeometry>,
}

#[derive(Debug, Deserialize)]
struct PathGeometry {
    #[serde(default)]
    paths: Vec<Vec<Vec<f64>>>,
}

impl SolveResponse {
    fn into_result(self, parameters: &ClosestFacilityParameters) -> Result<SolveResult> {
        if let Some(error) = self.error {
            return Err(error.into_error(Phase::Solve));
        }

        let Some(routes) = self.routes else {
            return Ok(SolveResult::new());
        };
        let spatial_reference = routes
            .spatial_reference
            .or(parameters.output_spatial_reference())
            .unwrap_or_default();

        let mut decoded = Vec::with_capacity(routes.features.len());
        for feature in routes.features {
            let incident = object_index(feature.attributes.get("IncidentID")).unwrap_or(0);
            match feature.into_route(spatial_reference, parameters.impedance.as_deref()) {
                Some(route) => decoded.push(route),
                None => {
                    warn!(incident, "route feature without facility/incident ids");
                    return Err(ClosestFacilityError::MalformedResult {
                        facility: None,
                        incident,
                        reason: "route feature is missing FacilityID or IncidentID".to_string(),
                    });
                }
            }
        }
        debug!(routes = decoded.len(), "decoded closest facility routes");

        Ok(SolveResult::from_routes(decoded))
    }
}

impl RouteFeature {
    fn into_route(self, spatial_reference: SpatialReference, impedance: Option<&str>) -> Option<Route> {
        let facility_index = object_index(self.attributes.get("FacilityID"))?;
        let incident_index = object_index(self.attributes.get("IncidentID"))?;
        let facility_rank = self
            .attributes
            .get("FacilityRank")
            .and_then(Value::as_u64)
            .and_then(|rank| u32::try_from(rank).ok());

        let totals: BTreeMap<String, f64> = self
            .attributes
            .iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix("Total_")?;
                Some((name.to_string(), value.as_f64()?))
            })
            .collect();
        let cost = impedance.and_then(|name| totals.get(name).copied());

        let paths = self
            .geometry
            .map(|geometry| {
                geometry
                    .paths
                    .into_iter()
                    .map(|path| {
                        path.into_iter()
                            .filter(|vertex| vertex.len() >= 2)
                            .map(|vertex| [vertex[0], vertex[1]])
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Route {
            facility_index,
            incident_index,
            facility_rank,
            cost,
            totals,
            geometry: Polyline::from_paths(paths, spatial_reference),
        })
    }
}

/// Converts a 1-based object id attribute to a 0-based index.
fn object_index(value: Option<&Value>) -> Option<usize> {
    let id = value?.as_u64()?;
    usize::try_from(id).ok()?.checked_sub(1)
}
