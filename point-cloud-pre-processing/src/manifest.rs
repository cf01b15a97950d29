/// Persisted dataset metadata linking bounds, configuration and artifacts.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::axis::Axis;
use crate::bounds::SpatialBounds;
use crate::cache::ArtifactKey;
use crate::config::PreprocessConfig;

/// Metadata record written beside the artifacts of one processed dataset.
/// The bounds fields are flattened so readers see the plain
/// `x_range`/`y_range`/`z_range`/`variables`/`num_points` contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(flatten)]
    pub bounds: SpatialBounds,
    /// Processing options the artifacts were produced with.
    pub config: PreprocessConfig,
    /// Content hash of the source cloud.
    pub fingerprint: u64,
}

impl DatasetMetadata {
    pub fn new(bounds: SpatialBounds, config: PreprocessConfig, fingerprint: u64) -> Self {
        Self {
            bounds,
            config,
            fingerprint,
        }
    }
}

/// Outcome counters of one preprocessing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingReport {
    pub slices_written: usize,
    pub slices_skipped: usize,
    pub profiles_written: usize,
    /// Keys of every artifact written, in generation order.
    pub artifacts: Vec<ArtifactKey>,
}

/// Logs the dataset and run summary for verification.
pub fn log_summary(metadata: &DatasetMetadata, report: &ProcessingReport) {
    let bounds = &metadata.bounds;
    info!(
        points = bounds.num_points,
        variables = bounds.variables.len(),
        "Dataset summary"
    );
    for axis in Axis::ALL {
        let (min, max) = bounds.range(axis);
        info!(axis = %axis, min = format!("{min:.4}"), max = format!("{max:.4}"), "Bounds");
    }
    info!(
        slices = report.slices_written,
        skipped = report.slices_skipped,
        profiles = report.profiles_written,
        grid = metadata.config.grid_size,
        "Artifacts written"
    );
}
