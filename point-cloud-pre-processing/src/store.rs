/// Current dataset and its processing state
use tracing::{debug, info};

use crate::bounds::SpatialBounds;
use crate::point_cloud::PointCloud;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Empty,
    /// A dataset is loaded but its artifacts are not (all) persisted yet.
    Pending,
    Processed,
}

/// Result of handing a dataset to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    /// Same content as the processed dataset; nothing changed.
    Unchanged,
    /// The dataset replaced whatever was loaded and awaits processing.
    Replaced,
}

struct LoadedDataset {
    cloud: PointCloud,
    variables: Vec<String>,
    bounds: SpatialBounds,
    fingerprint: u64,
}

/// Owns the scattered dataset, its derived bounds and the
/// `Empty → Pending → Processed` state machine.
pub struct PointCloudStore {
    dataset: Option<LoadedDataset>,
    status: StoreStatus,
}

impl Default for PointCloudStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudStore {
    pub fn new() -> Self {
        Self {
            dataset: None,
            status: StoreStatus::Empty,
        }
    }

    /// Load `cloud`. Reloading content identical to the processed dataset is
    /// a no-op; anything else replaces the dataset and resets to `Pending`.
    pub fn load(&mut self, cloud: PointCloud) -> LoadTransition {
        let fingerprint = cloud.fingerprint();
        if let Some(current) = &self.dataset {
            if self.status == StoreStatus::Processed && current.fingerprint == fingerprint {
                debug!(fingerprint, "dataset unchanged, keeping processed state");
                return LoadTransition::Unchanged;
            }
        }

        let variables = cloud.variable_names();
        let bounds = SpatialBounds::new(&cloud.bounds(), variables.clone(), cloud.len());
        info!(
            points = cloud.len(),
            variables = variables.len(),
            "Dataset loaded"
        );

        self.dataset = Some(LoadedDataset {
            cloud,
            variables,
            bounds,
            fingerprint,
        });
        self.status = StoreStatus::Pending;
        LoadTransition::Replaced
    }

    /// `Pending → Processed`. Has no effect in any other state.
    pub fn mark_processed(&mut self) {
        if self.status == StoreStatus::Pending {
            self.status = StoreStatus::Processed;
        }
    }

    pub fn status(&self) -> StoreStatus {
        self.status
    }

    /// Bounds of the loaded dataset, or the empty sentinel.
    pub fn bounds(&self) -> SpatialBounds {
        self.dataset
            .as_ref()
            .map(|d| d.bounds.clone())
            .unwrap_or_else(SpatialBounds::empty)
    }

    pub fn variables(&self) -> &[String] {
        self.dataset
            .as_ref()
            .map(|d| d.variables.as_slice())
            .unwrap_or_default()
    }

    pub fn cloud(&self) -> Option<&PointCloud> {
        self.dataset.as_ref().map(|d| &d.cloud)
    }

    pub fn fingerprint(&self) -> Option<u64> {
        self.dataset.as_ref().map(|d| d.fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(value: f64) -> PointCloud {
        PointCloud::from_columns(vec![
            ("x".to_string(), vec![0.0, 1.0]),
            ("y".to_string(), vec![0.0, 2.0]),
            ("z".to_string(), vec![0.0, 3.0]),
            ("T".to_string(), vec![value, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_store_reports_sentinel() {
        let store = PointCloudStore::new();
        assert_eq!(store.status(), StoreStatus::Empty);
        assert!(store.bounds().is_empty());
        assert!(store.variables().is_empty());
        assert!(store.cloud().is_none());
    }

    #[test]
    fn identical_reload_after_processing_is_unchanged() {
        let mut store = PointCloudStore::new();
        assert_eq!(store.load(cloud(0.0)), LoadTransition::Replaced);
        assert_eq!(store.status(), StoreStatus::Pending);

        // Not yet processed: the same data is accepted again.
        assert_eq!(store.load(cloud(0.0)), LoadTransition::Replaced);

        store.mark_processed();
        assert_eq!(store.load(cloud(0.0)), LoadTransition::Unchanged);
        assert_eq!(store.status(), StoreStatus::Processed);

        assert_eq!(store.load(cloud(5.0)), LoadTransition::Replaced);
        assert_eq!(store.status(), StoreStatus::Pending);
    }

    #[test]
    fn bounds_and_variables_follow_dataset() {
        let mut store = PointCloudStore::new();
        store.load(cloud(0.0));

        let bounds = store.bounds();
        assert_eq!(bounds.x_range, [0.0, 1.0]);
        assert_eq!(bounds.z_range, [0.0, 3.0]);
        assert_eq!(bounds.num_points, 2);
        assert_eq!(store.variables(), &["T".to_string()]);
    }

    #[test]
    fn mark_processed_requires_pending() {
        let mut store = PointCloudStore::new();
        store.mark_processed();
        assert_eq!(store.status(), StoreStatus::Empty);
    }
}
