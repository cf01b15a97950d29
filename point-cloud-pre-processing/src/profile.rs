/// Axis-aligned line profiles by direct moving-window binning
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::axis::{Axis, linspace};
use crate::bounds::PointCloudBounds;
use crate::cache::ArtifactKey;
use crate::config::PreprocessConfig;
use crate::error::{PreprocessError, Result};
use crate::point_cloud::PointCloud;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProfile {
    pub axis: Axis,
    pub positions: Vec<f64>,
    /// Half-width of the window around each position.
    pub bin_width: f64,
    /// Bin means per variable, NaN for bins without a finite value.
    pub values: IndexMap<String, Vec<f64>>,
}

impl LineProfile {
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::Profile(self.axis)
    }

    pub fn values(&self, variable: &str) -> Option<&[f64]> {
        self.values.get(variable).map(Vec::as_slice)
    }

    /// `(position, value)` pairs inside the inclusive range, empty bins dropped.
    pub fn series(&self, variable: &str, (lo, hi): (f64, f64)) -> Result<Vec<(f64, f64)>> {
        let values = self
            .values(variable)
            .ok_or_else(|| PreprocessError::UnknownVariable(variable.to_string()))?;

        Ok(self
            .positions
            .iter()
            .zip(values)
            .filter(|&(&p, v)| p >= lo && p <= hi && !v.is_nan())
            .map(|(&p, &v)| (p, v))
            .collect())
    }
}

pub struct LineProfiler<'a> {
    cloud: &'a PointCloud,
    bounds: PointCloudBounds,
    config: &'a PreprocessConfig,
}

impl<'a> LineProfiler<'a> {
    pub fn new(cloud: &'a PointCloud, bounds: PointCloudBounds, config: &'a PreprocessConfig) -> Self {
        Self {
            cloud,
            bounds,
            config,
        }
    }

    pub fn profile(&self, axis: Axis) -> LineProfile {
        let (min, max) = self.bounds.range(axis);
        let positions = linspace(min, max, self.config.grid_size);
        let bin_width = match positions.as_slice() {
            [first, second, ..] => (second - first) * self.config.bin_width_factor,
            _ => 0.0,
        };

        // Sort once so each bin is a contiguous candidate range.
        let coordinates = self.cloud.coordinates(axis);
        let mut order: Vec<usize> = (0..coordinates.len()).collect();
        order.sort_by(|&a, &b| coordinates[a].total_cmp(&coordinates[b]));
        let sorted: Vec<f64> = order.iter().map(|&i| coordinates[i]).collect();

        let margin = bin_width * 1e-9;
        let bins: Vec<Vec<usize>> = positions
            .iter()
            .map(|&position| {
                let start = sorted.partition_point(|&c| c < position - bin_width - margin);
                let end = sorted.partition_point(|&c| c <= position + bin_width + margin);
                (start..end)
                    .filter(|&k| (sorted[k] - position).abs() < bin_width)
                    .collect()
            })
            .collect();

        let variables: Vec<(&str, &[f64])> = self.cloud.variables().collect();
        let values: Vec<(String, Vec<f64>)> = variables
            .par_iter()
            .map(|(name, column)| {
                let means = bins
                    .iter()
                    .map(|members| nan_mean(members.iter().map(|&k| column[order[k]])))
                    .collect();
                (name.to_string(), means)
            })
            .collect();

        debug!(
            axis = %axis,
            bin_width,
            positions = positions.len(),
            empty_bins = bins.iter().filter(|b| b.is_empty()).count(),
            "line profile computed"
        );

        LineProfile {
            axis,
            positions,
            bin_width,
            values: values.into_iter().collect(),
        }
    }
}

/// Mean of the non-NaN values, NaN when there are none.
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
