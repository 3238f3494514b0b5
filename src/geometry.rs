//! Locations in a fixed projected spatial reference.

use serde::{Deserialize, Serialize};

/// Well-known id of a spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    /// Web Mercator (auxiliary sphere).
    pub const WEB_MERCATOR: SpatialReference = SpatialReference { wkid: 3857 };

    pub const fn new(wkid: u32) -> Self {
        Self { wkid }
    }
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self::WEB_MERCATOR
    }
}

/// An immutable x/y point tagged with its spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    x: f64,
    y: f64,
    spatial_reference: SpatialReference,
}

impl Location {
    pub const fn new(x: f64, y: f64, spatial_reference: SpatialReference) -> Self {
        Self {
            x,
            y,
            spatial_reference,
        }
    }

    pub const fn web_mercator(x: f64, y: f64) -> Self {
        Self::new(x, y, SpatialReference::WEB_MERCATOR)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        self.spatial_reference
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Planar distance in map units. Only meaningful within one spatial reference.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}
