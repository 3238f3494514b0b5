//! Polyline representation for route geometries.
//!
//! Routes come back from the network-analysis service as one or more paths of
//! `[x, y]` pairs. They are flattened into a single decoded coordinate
//! sequence at the boundary so the rest of the crate never sees the wire shape.

use serde::{Deserialize, Serialize};

use crate::geometry::{Location, SpatialReference};

/// A route path as an ordered sequence of projected coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
    spatial_reference: SpatialReference,
}

impl Polyline {
    /// Creates a new Polyline from decoded `(x, y)` points.
    pub fn new(points: Vec<(f64, f64)>, spatial_reference: SpatialReference) -> Self {
        Self {
            points,
            spatial_reference,
        }
    }

    /// Joins multi-part paths end to end, dropping a vertex repeated at a part boundary.
    pub fn from_paths(paths: Vec<Vec<[f64; 2]>>, spatial_reference: SpatialReference) -> Self {
        let mut points: Vec<(f64, f64)> = Vec::new();
        for path in paths {
            for [x, y] in path {
                if points.last() != Some(&(x, y)) {
                    points.push((x, y));
                }
            }
        }
        Self::new(points, spatial_reference)
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        self.spatial_reference
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<Location> {
        self.points
            .first()
            .map(|&(x, y)| Location::new(x, y, self.spatial_reference))
    }

    pub fn end(&self) -> Option<Location> {
        self.points
            .last()
            .map(|&(x, y)| Location::new(x, y, self.spatial_reference))
    }

    /// Planar length in map units.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| {
                let dx = pair[1].0 - pair[0].0;
                let dy = pair[1].1 - pair[0].1;
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_points() {
        let points = vec![(1.0, 0.0), (0.5, 0.0), (0.0, 0.0)];
        let polyline = Polyline::new(points.clone(), SpatialReference::WEB_MERCATOR);
        assert_eq!(polyline.points(), &points[..]);
        assert_eq!(polyline.into_points(), points);
    }

    #[test]
    fn test_from_paths_joins_parts() {
        let paths = vec![
            vec![[0.0, 0.0], [1.0, 0.0]],
            vec![[1.0, 0.0], [1.0, 1.0]],
        ];
        let polyline = Polyline::from_paths(paths, SpatialReference::WEB_MERCATOR);
        assert_eq!(polyline.points(), &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!((polyline.length() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_endpoints() {
        let polyline = Polyline::new(vec![(1.0, 0.0), (0.0, 0.0)], SpatialReference::new(102100));
        let start = polyline.start().unwrap();
        let end = polyline.end().unwrap();
        assert_eq!(start.coords(), (1.0, 0.0));
        assert_eq!(end.coords(), (0.0, 0.0));
        assert_eq!(end.spatial_reference().wkid, 102100);
    }

    #[test]
    fn test_empty_polyline() {
        let polyline = Polyline::from_paths(vec![], SpatialReference::WEB_MERCATOR);
        assert!(polyline.is_empty());
        assert!(polyline.start().is_none());
        assert_eq!(polyline.length(), 0.0);
    }
}
