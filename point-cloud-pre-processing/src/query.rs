/// Read-side helpers over raw points and processed artifacts
use crate::axis::Axis;
use crate::error::{PreprocessError, Result};
use crate::point_cloud::PointCloud;

/// Slice index selected by a normalised slider position in `[0, 1]`.
pub fn slice_index_for_fraction(fraction: f64, slice_count: usize) -> usize {
    if slice_count == 0 {
        return 0;
    }
    let last = slice_count - 1;
    if fraction.is_nan() {
        return 0;
    }
    ((fraction.clamp(0.0, 1.0) * last as f64).floor() as usize).min(last)
}

/// Axis-aligned box with optional inclusive limits per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxFilter {
    pub x: Option<(f64, f64)>,
    pub y: Option<(f64, f64)>,
    pub z: Option<(f64, f64)>,
}

impl BoxFilter {
    pub fn with(mut self, axis: Axis, range: (f64, f64)) -> Self {
        match axis {
            Axis::X => self.x = Some(range),
            Axis::Y => self.y = Some(range),
            Axis::Z => self.z = Some(range),
        }
        self
    }

    pub fn range(&self, axis: Axis) -> Option<(f64, f64)> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        [(self.x, x), (self.y, y), (self.z, z)]
            .iter()
            .all(|&(range, v)| range.is_none_or(|(lo, hi)| v >= lo && v <= hi))
    }

    /// Indices of the cloud points inside the box.
    pub fn select(&self, cloud: &PointCloud) -> Vec<usize> {
        let (xs, ys, zs) = (
            cloud.coordinates(Axis::X),
            cloud.coordinates(Axis::Y),
            cloud.coordinates(Axis::Z),
        );
        (0..cloud.len())
            .filter(|&i| self.contains(xs[i], ys[i], zs[i]))
            .collect()
    }
}

/// Descriptive statistics of one variable over a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    /// Points inside the region with a non-NaN value.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation; NaN below two values.
    pub std_dev: f64,
}

impl RegionStats {
    /// Statistics of `variable` over the points inside `region`.
    /// NaN values are ignored; an empty region yields `None`.
    pub fn compute(cloud: &PointCloud, variable: &str, region: &BoxFilter) -> Result<Option<Self>> {
        let values = cloud
            .variable(variable)
            .ok_or_else(|| PreprocessError::UnknownVariable(variable.to_string()))?;

        let selected: Vec<f64> = region
            .select(cloud)
            .into_iter()
            .map(|i| values[i])
            .filter(|v| !v.is_nan())
            .collect();
        Ok(Self::from_values(&selected))
    }

    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count: values.len(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_maps_to_truncated_index() {
        assert_eq!(slice_index_for_fraction(0.0, 15), 0);
        assert_eq!(slice_index_for_fraction(0.5, 15), 7);
        assert_eq!(slice_index_for_fraction(0.99, 15), 13);
        assert_eq!(slice_index_for_fraction(1.0, 15), 14);
        assert_eq!(slice_index_for_fraction(3.0, 15), 14);
        assert_eq!(slice_index_for_fraction(-1.0, 15), 0);
        assert_eq!(slice_index_for_fraction(0.7, 1), 0);
    }

    #[test]
    fn region_statistics_use_sample_deviation() {
        let cloud = PointCloud::from_columns(vec![
            ("x".to_string(), vec![0.0, 1.0, 2.0, 3.0, 4.0]),
            ("y".to_string(), vec![0.0; 5]),
            ("z".to_string(), vec![0.0; 5]),
            ("T".to_string(), vec![2.0, 4.0, f64::NAN, 6.0, 100.0]),
        ])
        .unwrap();

        let region = BoxFilter::default().with(Axis::X, (0.0, 3.0));
        assert_eq!(region.select(&cloud), vec![0, 1, 2, 3]);

        let stats = RegionStats::compute(&cloud, "T", &region).unwrap().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.mean, 4.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);

        let single = BoxFilter::default().with(Axis::X, (4.0, 4.0));
        let stats = RegionStats::compute(&cloud, "T", &single).unwrap().unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.std_dev.is_nan());

        let outside = BoxFilter::default().with(Axis::Y, (1.0, 2.0));
        assert!(RegionStats::compute(&cloud, "T", &outside).unwrap().is_none());
        assert!(RegionStats::compute(&cloud, "P", &outside).is_err());
    }
}
