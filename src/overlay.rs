//! Display wiring: renderable graphics produced from lookups.
//!
//! Nothing here draws. A [`GraphicsOverlay`] is plain geometry tagged with a
//! caller-supplied style, and [`ClosestFacilitySession`] is the single owner
//! that mutates it. Lookups run elsewhere and hand their [`LookupOutcome`]
//! back through [`ClosestFacilitySession::complete`].

use tracing::{debug, warn};

use crate::client::{LookupOutcome, LookupRequest, LookupTracker};
use crate::error::Result;
use crate::geometry::Location;
use crate::polyline::Polyline;
use crate::registry::FacilityRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicGeometry {
    Point(Location),
    Path(Polyline),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicRole {
    Facility,
    Incident,
    Route,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graphic<S> {
    pub role: GraphicRole,
    pub geometry: GraphicGeometry,
    pub style: S,
}

/// Ordered graphics, drawn back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsOverlay<S> {
    graphics: Vec<Graphic<S>>,
}

impl<S> Default for GraphicsOverlay<S> {
    fn default() -> Self {
        Self {
            graphics: Vec::new(),
        }
    }
}

impl<S> GraphicsOverlay<S> {
    pub fn push(&mut self, graphic: Graphic<S>) {
        self.graphics.push(graphic);
    }

    pub fn graphics(&self) -> &[Graphic<S>] {
        &self.graphics
    }

    pub fn with_role(&self, role: GraphicRole) -> impl Iterator<Item = &Graphic<S>> {
        self.graphics.iter().filter(move |graphic| graphic.role == role)
    }
}

/// Styles for the three kinds of graphics.
#[derive(Debug, Clone)]
pub struct Styles<S> {
    pub facility: S,
    pub incident: S,
    pub route: S,
}

/// Owns the registry, the overlay and the latest-lookup tracking for one map.
#[derive(Debug)]
pub struct ClosestFacilitySession<S> {
    registry: FacilityRegistry,
    tracker: LookupTracker,
    overlay: GraphicsOverlay<S>,
    styles: Styles<S>,
}

impl<S: Clone> ClosestFacilitySession<S> {
    /// Creates the session and places one marker per facility.
    pub fn new(registry: FacilityRegistry, styles: Styles<S>) -> Self {
        let mut overlay = GraphicsOverlay::default();
        for facility in registry.all() {
            overlay.push(Graphic {
                role: GraphicRole::Facility,
                geometry: GraphicGeometry::Point(facility.location()),
                style: styles.facility.clone(),
            });
        }

        Self {
            registry,
            tracker: LookupTracker::new(),
            overlay,
            styles,
        }
    }

    pub fn registry(&self) -> &FacilityRegistry {
        &self.registry
    }

    pub fn overlay(&self) -> &GraphicsOverlay<S> {
        &self.overlay
    }

    pub fn latest_request(&self) -> Option<u64> {
        self.tracker.latest()
    }

    /// Accepts a clicked location as the new incident, superseding any pending lookup.
    pub fn place_incident(&mut self, location: Location) -> LookupRequest {
        let lookup = self.tracker.begin(location);
        debug!(request = lookup.request, x = location.x(), y = location.y(), "incident placed");
        lookup
    }

    /// Applies a finished lookup. Only a successful, still-latest lookup
    /// adds graphics: the incident marker and its route, together.
    pub fn complete(&mut self, outcome: LookupOutcome) -> Result<()> {
        let request = outcome.request;
        let (incident, route) = self.tracker.accept(outcome).inspect_err(|err| {
            warn!(request, error = %err, "closest facility lookup failed");
        })?;

        self.overlay.push(Graphic {
            role: GraphicRole::Incident,
            geometry: GraphicGeometry::Point(incident),
            style: self.styles.incident.clone(),
        });
        self.overlay.push(Graphic {
            role: GraphicRole::Route,
            geometry: GraphicGeometry::Path(route.geometry),
            style: self.styles.route.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::{ClosestFacilityError, ErrorKind};
    use crate::geometry::SpatialReference;
    use crate::parameters::Route;

    fn styles() -> Styles<&'static str> {
        Styles {
            facility: "hospital",
            incident: "black-cross",
            route: "blue-line",
        }
    }

    fn outcome(lookup: &LookupRequest, result: Result<Route>) -> LookupOutcome {
        LookupOutcome {
            request: lookup.request,
            incident: lookup.incident,
            result,
        }
    }

    fn route() -> Route {
        Route {
            facility_index: 0,
            incident_index: 0,
            facility_rank: Some(1),
            cost: None,
            totals: BTreeMap::new(),
            geometry: Polyline::new(vec![(1.0, 0.0), (0.0, 0.0)], SpatialReference::WEB_MERCATOR),
        }
    }

    #[test]
    fn test_new_places_facility_markers() {
        let session = ClosestFacilitySession::new(FacilityRegistry::san_diego(), styles());
        assert_eq!(session.overlay().graphics().len(), 7);
        assert!(session
            .overlay()
            .graphics()
            .iter()
            .all(|g| g.role == GraphicRole::Facility && g.style == "hospital"));
    }

    #[test]
    fn test_success_adds_incident_and_route() {
        let registry = FacilityRegistry::new(&[Location::web_mercator(0.0, 0.0)]);
        let mut session = ClosestFacilitySession::new(registry, styles());
        let lookup = session.place_incident(Location::web_mercator(1.0, 0.0));

        session.complete(outcome(&lookup, Ok(route()))).unwrap();

        assert_eq!(session.overlay().graphics().len(), 3);
        let routes: Vec<_> = session.overlay().with_role(GraphicRole::Route).collect();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].style, "blue-line");
        let incidents: Vec<_> = session.overlay().with_role(GraphicRole::Incident).collect();
        assert_eq!(
            incidents[0].geometry,
            GraphicGeometry::Point(Location::web_mercator(1.0, 0.0))
        );
    }

    #[test]
    fn test_failure_leaves_overlay_untouched() {
        let registry = FacilityRegistry::new(&[Location::web_mercator(0.0, 0.0)]);
        let mut session = ClosestFacilitySession::new(registry, styles());
        let before = session.overlay().clone();
        let lookup = session.place_incident(Location::web_mercator(1.0, 0.0));

        let err = session
            .complete(outcome(&lookup, Err(ClosestFacilityError::NoRouteFound { incident: 0 })))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoRouteFound);
        assert_eq!(session.overlay(), &before);
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let registry = FacilityRegistry::new(&[Location::web_mercator(0.0, 0.0)]);
        let mut session = ClosestFacilitySession::new(registry, styles());
        let first = session.place_incident(Location::web_mercator(1.0, 0.0));
        let second = session.place_incident(Location::web_mercator(2.0, 0.0));
        assert!(first.is_cancelled());

        let err = session.complete(outcome(&first, Ok(route()))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Superseded);
        assert_eq!(session.overlay().graphics().len(), 1);

        session.complete(outcome(&second, Ok(route()))).unwrap();
        assert_eq!(session.overlay().graphics().len(), 3);
        assert_eq!(session.latest_request(), Some(second.request));
    }
}
