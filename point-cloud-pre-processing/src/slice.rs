/// Planar slices resampled onto regular grids
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::axis::{PlaneFamily, linspace};
use crate::bounds::PointCloudBounds;
use crate::cache::ArtifactKey;
use crate::config::PreprocessConfig;
use crate::error::{PreprocessError, Result};
use crate::point_cloud::PointCloud;
use crate::triangulation::{GridStencil, Triangulation};

/// One resampled cross section. Grids are row-major with rows along
/// `axis_v` and columns along `axis_u`; NaN marks nodes without an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub plane: PlaneFamily,
    pub index: usize,
    pub fixed_value: f64,
    /// Samples of the first free axis (grid columns).
    pub axis_u: Vec<f64>,
    /// Samples of the second free axis (grid rows).
    pub axis_v: Vec<f64>,
    /// (rows, columns)
    pub grid_shape: (usize, usize),
    /// Points that fell inside the slice window.
    pub point_count: usize,
    pub grids: IndexMap<String, Vec<f64>>,
}

impl Slice {
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::Slice(self.plane, self.index)
    }

    pub fn grid(&self, variable: &str) -> Option<&[f64]> {
        self.grids.get(variable).map(Vec::as_slice)
    }

    pub fn value(&self, variable: &str, row: usize, col: usize) -> Option<f64> {
        let (rows, cols) = self.grid_shape;
        if row >= rows || col >= cols {
            return None;
        }
        self.grid(variable).map(|grid| grid[row * cols + col])
    }

    /// Sub-grid of `variable` whose axis samples fall inside the inclusive
    /// ranges. Empty ranges give an empty window.
    pub fn crop(
        &self,
        u_range: (f64, f64),
        v_range: (f64, f64),
        variable: &str,
    ) -> Result<GridWindow> {
        let grid = self
            .grid(variable)
            .ok_or_else(|| PreprocessError::UnknownVariable(variable.to_string()))?;

        let inclusive = |axis: &[f64], (lo, hi): (f64, f64)| {
            let start = axis.partition_point(|&s| s < lo);
            let end = axis.partition_point(|&s| s <= hi).max(start);
            start..end
        };
        let cols = inclusive(&self.axis_u, u_range);
        let rows = inclusive(&self.axis_v, v_range);

        let width = self.grid_shape.1;
        let values: Vec<f64> = rows
            .clone()
            .flat_map(|r| grid[r * width + cols.start..r * width + cols.end].iter().copied())
            .collect();

        Ok(GridWindow {
            axis_u: self.axis_u[cols].to_vec(),
            axis_v: self.axis_v[rows].to_vec(),
            values,
        })
    }
}

/// Rectangular window of a single slice variable.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWindow {
    pub axis_u: Vec<f64>,
    pub axis_v: Vec<f64>,
    pub values: Vec<f64>,
}

/// A grid node located in slice coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPeak {
    pub u: f64,
    pub v: f64,
    pub value: f64,
}

impl GridWindow {
    pub fn shape(&self) -> (usize, usize) {
        (self.axis_v.len(), self.axis_u.len())
    }

    /// NaN-ignoring (max, min), first occurrence in row-major order.
    /// `None` when the window has no finite value.
    pub fn extrema(&self) -> Option<(GridPeak, GridPeak)> {
        let mut max: Option<(usize, f64)> = None;
        let mut min: Option<(usize, f64)> = None;
        for (i, &value) in self.values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            if max.is_none_or(|(_, m)| value > m) {
                max = Some((i, value));
            }
            if min.is_none_or(|(_, m)| value < m) {
                min = Some((i, value));
            }
        }

        let cols = self.axis_u.len();
        let peak = |(i, value): (usize, f64)| GridPeak {
            u: self.axis_u[i % cols],
            v: self.axis_v[i / cols],
            value,
        };
        Some((peak(max?), peak(min?)))
    }
}

/// Builds slices of one dataset for every plane family.
pub struct SliceInterpolator<'a> {
    cloud: &'a PointCloud,
    bounds: PointCloudBounds,
    config: &'a PreprocessConfig,
}

impl<'a> SliceInterpolator<'a> {
    pub fn new(cloud: &'a PointCloud, bounds: PointCloudBounds, config: &'a PreprocessConfig) -> Self {
        Self {
            cloud,
            bounds,
            config,
        }
    }

    /// Fixed-axis value of every slice of `plane`.
    pub fn slice_positions(&self, plane: PlaneFamily) -> Vec<f64> {
        let (min, max) = self.bounds.range(plane.fixed_axis());
        linspace(min, max, self.config.slice_count)
    }

    /// Indices of the points inside the window of slice `index`.
    pub fn select_window(&self, plane: PlaneFamily, index: usize) -> Option<(f64, Vec<usize>)> {
        let fixed_value = *self.slice_positions(plane).get(index)?;
        let tolerance = self.bounds.span(plane.fixed_axis()) * self.config.slice_tolerance;

        let selected = self
            .cloud
            .coordinates(plane.fixed_axis())
            .iter()
            .enumerate()
            .filter(|(_, c)| (*c - fixed_value).abs() < tolerance)
            .map(|(i, _)| i)
            .collect();
        Some((fixed_value, selected))
    }

    /// Resample slice `index` of `plane`, or `None` when the window holds
    /// too few points or the index is out of range.
    pub fn interpolate(&self, plane: PlaneFamily, index: usize) -> Option<Slice> {
        let (fixed_value, selected) = self.select_window(plane, index)?;
        if selected.len() < self.config.min_slice_points {
            debug!(
                plane = %plane,
                index,
                points = selected.len(),
                "slice window below point threshold, skipped"
            );
            return None;
        }

        let (u_axis, v_axis) = plane.free_axes();
        let (u_min, u_max) = self.bounds.range(u_axis);
        let (v_min, v_max) = self.bounds.range(v_axis);
        let axis_u = linspace(u_min, u_max, self.config.grid_size);
        let axis_v = linspace(v_min, v_max, self.config.grid_size);

        let us = self.cloud.coordinates(u_axis);
        let vs = self.cloud.coordinates(v_axis);
        let planar: Vec<[f64; 2]> = selected.iter().map(|&i| [us[i], vs[i]]).collect();

        let triangulation = Triangulation::new(&planar);
        let stencil = GridStencil::build(&planar, &triangulation, &axis_u, &axis_v);

        let variables: Vec<(&str, &[f64])> = self.cloud.variables().collect();
        let grids: Vec<(String, Vec<f64>)> = variables
            .par_iter()
            .map(|(name, column)| {
                let local: Vec<f64> = selected.iter().map(|&i| column[i]).collect();
                (name.to_string(), stencil.interpolate(&local))
            })
            .collect();

        debug!(
            plane = %plane,
            index,
            fixed_value,
            points = selected.len(),
            triangles = triangulation.triangles().len(),
            covered = stencil.covered_nodes(),
            "slice interpolated"
        );

        Some(Slice {
            plane,
            index,
            fixed_value,
            grid_shape: stencil.shape(),
            axis_u,
            axis_v,
            point_count: selected.len(),
            grids: grids.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Regular lattice on the unit cube carrying `v = x + 2y + 3z`.
    fn lattice(n: usize) -> PointCloud {
        let mut columns: Vec<(String, Vec<f64>)> = ["x", "y", "z", "v"]
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        let step = 1.0 / (n - 1) as f64;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let (x, y, z) = (i as f64 * step, j as f64 * step, k as f64 * step);
                    columns[0].1.push(x);
                    columns[1].1.push(y);
                    columns[2].1.push(z);
                    columns[3].1.push(x + 2.0 * y + 3.0 * z);
                }
            }
        }
        PointCloud::from_columns(columns).unwrap()
    }

    fn config(slices: usize, grid: usize) -> PreprocessConfig {
        PreprocessConfig {
            slice_count: slices,
            grid_size: grid,
            ..Default::default()
        }
    }

    #[test]
    fn lattice_slices_reproduce_linear_field() {
        let cloud = lattice(11);
        let config = config(11, 21);
        let interpolator = SliceInterpolator::new(&cloud, cloud.bounds(), &config);

        let slice = interpolator.interpolate(PlaneFamily::XZ, 4).unwrap();
        assert_eq!(slice.grid_shape, (21, 21));
        assert_eq!(slice.point_count, 121);
        assert!((slice.fixed_value - 0.4).abs() < 1e-12);

        let grid = slice.grid("v").unwrap();
        assert_eq!(grid.len(), 21 * 21);
        for (r, &z) in slice.axis_v.iter().enumerate() {
            for (c, &x) in slice.axis_u.iter().enumerate() {
                let expected = x + 2.0 * slice.fixed_value + 3.0 * z;
                assert!((grid[r * 21 + c] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn sparse_window_produces_no_slice() {
        let cloud = lattice(3);
        let config = config(5, 8);
        let interpolator = SliceInterpolator::new(&cloud, cloud.bounds(), &config);

        // Positions 0.25 and 0.75 fall between lattice layers.
        assert!(interpolator.interpolate(PlaneFamily::XY, 1).is_none());
        // A full layer has 9 points, still below the threshold of 10.
        assert!(interpolator.interpolate(PlaneFamily::XY, 0).is_none());
        assert!(interpolator.interpolate(PlaneFamily::XY, 5).is_none());
    }

    #[test]
    fn collinear_window_is_all_nan() {
        // Twenty points on the line y = x at z = 0, and one far point for z span.
        let n = 20;
        let mut x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut y = x.clone();
        let mut z = vec![0.0; n];
        x.push(0.0);
        y.push(5.0);
        z.push(10.0);
        let columns = vec![
            ("x".to_string(), x),
            ("y".to_string(), y),
            ("z".to_string(), z),
            ("t".to_string(), vec![1.0; n + 1]),
        ];
        let cloud = PointCloud::from_columns(columns).unwrap();
        let config = config(3, 10);
        let interpolator = SliceInterpolator::new(&cloud, cloud.bounds(), &config);

        let slice = interpolator.interpolate(PlaneFamily::XY, 0).unwrap();
        assert_eq!(slice.point_count, n);
        assert!(slice.grid("t").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn crop_and_extrema() {
        let cloud = lattice(11);
        let config = config(11, 11);
        let interpolator = SliceInterpolator::new(&cloud, cloud.bounds(), &config);
        let slice = interpolator.interpolate(PlaneFamily::XY, 10).unwrap();

        let window = slice.crop((0.15, 0.55), (-0.05, 0.35), "v").unwrap();
        assert_eq!(window.shape(), (4, 4));
        assert!((window.axis_u[0] - 0.2).abs() < 1e-12);
        assert!((window.axis_u[3] - 0.5).abs() < 1e-12);

        let (max, min) = window.extrema().unwrap();
        assert!((max.u - 0.5).abs() < 1e-12);
        assert!((max.v - 0.3).abs() < 1e-12);
        assert!((max.value - (0.5 + 0.6 + 3.0)).abs() < 1e-9);
        assert!((min.u - 0.2).abs() < 1e-12);
        assert!((min.v - 0.0).abs() < 1e-12);

        assert!(slice.crop((2.0, 3.0), (0.0, 1.0), "v").unwrap().extrema().is_none());
        assert!(matches!(
            slice.crop((0.0, 1.0), (0.0, 1.0), "missing"),
            Err(PreprocessError::UnknownVariable(_))
        ));
    }
}
