//! Facility registry: the fixed set of service points for a region.

use crate::geometry::Location;
use crate::traits::Facility;

// ============================================================================
// San Diego hospitals (Web Mercator)
// ============================================================================

pub const SAN_DIEGO_FACILITIES: &[Location] = &[
    Location::web_mercator(-1.3042129900625112E7, 3860127.9479775648),
    Location::web_mercator(-1.3042193400557665E7, 3862448.873041752),
    Location::web_mercator(-1.3046882875518233E7, 3862704.9896770366),
    Location::web_mercator(-1.3040539754780494E7, 3862924.5938606677),
    Location::web_mercator(-1.3042571225655518E7, 3858981.773018156),
    Location::web_mercator(-1.3039784633928463E7, 3856692.5980474586),
    Location::web_mercator(-1.3049023883956768E7, 3861993.789732541),
];

/// Ordered facility set. The position of a facility is the index the
/// service uses in ranked lists and route lookups, so it never reorders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityRegistry {
    facilities: Vec<Facility>,
}

impl FacilityRegistry {
    pub fn new(points: &[Location]) -> Self {
        let mut registry = Self::default();
        registry.initialize(points);
        registry
    }

    pub fn san_diego() -> Self {
        Self::new(SAN_DIEGO_FACILITIES)
    }

    /// Replaces any existing facilities. An empty set is accepted here; lookups reject it.
    pub fn initialize(&mut self, points: &[Location]) {
        self.facilities = points.iter().copied().map(Facility::new).collect();
    }

    pub fn all(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn get(&self, index: usize) -> Option<&Facility> {
        self.facilities.get(index)
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
