/// Point cloud coordinate bounds tracking and dataset metadata
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::constants::BOUNDS_CHUNK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Combine two partial bounds
    pub fn merge(mut self, other: Self) -> Self {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
        self
    }

    /// Bounds of column-wise coordinates, reduced over parallel chunks.
    pub fn from_columns(x: &[f64], y: &[f64], z: &[f64]) -> Self {
        x.par_chunks(BOUNDS_CHUNK_SIZE)
            .zip(y.par_chunks(BOUNDS_CHUNK_SIZE))
            .zip(z.par_chunks(BOUNDS_CHUNK_SIZE))
            .map(|((xs, ys), zs)| {
                let mut local_bounds = PointCloudBounds::new();
                for ((&x, &y), &z) in xs.iter().zip(ys).zip(zs) {
                    local_bounds.update(x, y, z);
                }
                local_bounds
            })
            .reduce(PointCloudBounds::new, PointCloudBounds::merge)
    }

    pub fn range(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.min_x, self.max_x),
            Axis::Y => (self.min_y, self.max_y),
            Axis::Z => (self.min_z, self.max_z),
        }
    }

    pub fn span(&self, axis: Axis) -> f64 {
        let (min, max) = self.range(axis);
        max - min
    }
}

/// Metadata contract shared with every reader of the preprocessed dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialBounds {
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    pub z_range: [f64; 2],
    pub variables: Vec<String>,
    pub num_points: usize,
}

impl SpatialBounds {
    pub fn new(bounds: &PointCloudBounds, variables: Vec<String>, num_points: usize) -> Self {
        Self {
            x_range: [bounds.min_x, bounds.max_x],
            y_range: [bounds.min_y, bounds.max_y],
            z_range: [bounds.min_z, bounds.max_z],
            variables,
            num_points,
        }
    }

    /// Sentinel returned while no dataset is loaded
    pub fn empty() -> Self {
        Self {
            x_range: [0.0, 0.0],
            y_range: [0.0, 0.0],
            z_range: [0.0, 0.0],
            variables: Vec::new(),
            num_points: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    pub fn range(&self, axis: Axis) -> (f64, f64) {
        let [min, max] = match axis {
            Axis::X => self.x_range,
            Axis::Y => self.y_range,
            Axis::Z => self.z_range,
        };
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_bounds_match_sequential() {
        let n = BOUNDS_CHUNK_SIZE * 3 + 17;
        let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let y: Vec<f64> = (0..n).map(|i| i as f64 - 5.0).collect();
        let z: Vec<f64> = (0..n).map(|i| -(i as f64) * 0.5).collect();

        let mut expected = PointCloudBounds::new();
        for i in 0..n {
            expected.update(x[i], y[i], z[i]);
        }

        assert_eq!(PointCloudBounds::from_columns(&x, &y, &z), expected);
        assert_eq!(expected.range(Axis::Y), (-5.0, (n - 1) as f64 - 5.0));
    }

    #[test]
    fn single_point_bounds_have_zero_span() {
        let mut bounds = PointCloudBounds::new();
        assert_eq!(bounds.range(Axis::X), (f64::INFINITY, f64::NEG_INFINITY));
        bounds.update(1.0, 2.0, 3.0);
        assert_eq!(bounds.range(Axis::Z), (3.0, 3.0));
        for axis in Axis::ALL {
            assert_eq!(bounds.span(axis), 0.0);
        }
    }

    #[test]
    fn spatial_bounds_serialize_as_ranges() {
        let mut bounds = PointCloudBounds::new();
        bounds.update(0.0, -1.0, 2.0);
        bounds.update(4.0, 1.0, 3.0);
        let meta = SpatialBounds::new(&bounds, vec!["T".into()], 2);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["x_range"], serde_json::json!([0.0, 4.0]));
        assert_eq!(json["num_points"], 2);
        assert_eq!(meta.range(Axis::Z), (2.0, 3.0));
        assert!(SpatialBounds::empty().is_empty());
    }
}
