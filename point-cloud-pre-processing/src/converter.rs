/// Main point cloud converter orchestrating slicing, profiling and persistence.
use std::sync::Arc;
use tracing::{info, warn};

use crate::axis::{Axis, PlaneFamily};
use crate::bounds::SpatialBounds;
use crate::cache::{ArtifactCache, ArtifactKey};
use crate::config::PreprocessConfig;
use crate::error::{PreprocessError, Result};
use crate::manifest::{DatasetMetadata, ProcessingReport, log_summary};
use crate::point_cloud::PointCloud;
use crate::profile::{LineProfile, LineProfiler};
use crate::progress::progress_bar;
use crate::query::{BoxFilter, RegionStats};
use crate::slice::{Slice, SliceInterpolator};
use crate::store::{LoadTransition, PointCloudStore, StoreStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Artifacts for this exact dataset and configuration already exist.
    AlreadyProcessed,
    Processed(ProcessingReport),
}

/// Owns the store and the artifact cache. The only writer of the cache.
pub struct PointCloudConverter<C: ArtifactCache> {
    config: PreprocessConfig,
    store: PointCloudStore,
    cache: C,
}

impl<C: ArtifactCache> PointCloudConverter<C> {
    pub fn new(config: PreprocessConfig, cache: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: PointCloudStore::new(),
            cache,
        })
    }

    /// Load a dataset and, unless it is already processed, generate and
    /// persist every slice and profile before returning.
    ///
    /// On failure the cache is cleared and the store stays pending, so a
    /// later load of the same data recomputes from scratch.
    pub fn load(&mut self, cloud: PointCloud) -> Result<LoadOutcome> {
        if self.store.load(cloud) == LoadTransition::Unchanged {
            info!("Dataset already processed, skipping");
            return Ok(LoadOutcome::AlreadyProcessed);
        }

        if self.persisted_run_matches()? {
            info!("Cached artifacts match dataset and configuration, reusing");
            self.store.mark_processed();
            return Ok(LoadOutcome::AlreadyProcessed);
        }

        match self.process() {
            Ok(report) => {
                self.store.mark_processed();
                Ok(LoadOutcome::Processed(report))
            }
            Err(err) => {
                warn!(error = %err, "Processing failed, clearing artifacts");
                if let Err(clear_err) = self.cache.clear() {
                    warn!(error = %clear_err, "Failed to clear artifacts after error");
                }
                Err(err)
            }
        }
    }

    /// True when the cache already holds a complete run for the loaded
    /// dataset under the current configuration.
    fn persisted_run_matches(&self) -> Result<bool> {
        let Some(fingerprint) = self.store.fingerprint() else {
            return Ok(false);
        };
        Ok(self.cache.metadata()?.is_some_and(|metadata| {
            metadata.fingerprint == fingerprint
                && metadata.config == self.config
                && metadata.bounds == self.store.bounds()
        }))
    }

    fn process(&mut self) -> Result<ProcessingReport> {
        let cloud = self.store.cloud().ok_or(PreprocessError::EmptyPointCloud)?;
        let bounds = cloud.bounds();
        let config = &self.config;

        info!(
            points = cloud.len(),
            variables = self.store.variables().len(),
            slices_per_plane = config.slice_count,
            grid = config.grid_size,
            "Preprocessing dataset"
        );

        // Artifacts of a previous dataset must never survive a reload.
        self.cache.clear()?;

        let mut report = ProcessingReport::default();
        let interpolator = SliceInterpolator::new(cloud, bounds, config);

        let total_slices = PlaneFamily::ALL.len() * config.slice_count;
        let pb = progress_bar(total_slices as u64, "Interpolating slices");
        for plane in PlaneFamily::ALL {
            for index in 0..config.slice_count {
                match interpolator.interpolate(plane, index) {
                    Some(slice) => {
                        let key = slice.key();
                        self.cache.put(key, slice.into())?;
                        report.artifacts.push(key);
                        report.slices_written += 1;
                    }
                    None => report.slices_skipped += 1,
                }
                pb.inc(1);
            }
        }
        pb.finish_with_message("Slices interpolated");

        let profiler = LineProfiler::new(cloud, bounds, config);
        for axis in Axis::ALL {
            let profile = profiler.profile(axis);
            let key = profile.key();
            self.cache.put(key, profile.into())?;
            report.artifacts.push(key);
            report.profiles_written += 1;
        }

        // Written last: its presence marks a complete run.
        let metadata = DatasetMetadata::new(self.store.bounds(), *config, cloud.fingerprint());
        self.cache.put_metadata(&metadata)?;

        log_summary(&metadata, &report);
        Ok(report)
    }

    pub fn status(&self) -> StoreStatus {
        self.store.status()
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Bounds of the loaded dataset, or the empty sentinel.
    pub fn bounds(&self) -> SpatialBounds {
        self.store.bounds()
    }

    pub fn variables(&self) -> &[String] {
        self.store.variables()
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn metadata(&self) -> Result<Option<DatasetMetadata>> {
        self.cache.metadata()
    }

    pub fn slice(&self, plane: PlaneFamily, index: usize) -> Result<Option<Arc<Slice>>> {
        self.cache.slice(plane, index)
    }

    pub fn profile(&self, axis: Axis) -> Result<Option<Arc<LineProfile>>> {
        self.cache.profile(axis)
    }

    pub fn artifact_keys(&self) -> Result<Vec<ArtifactKey>> {
        self.cache.keys()
    }

    /// Raw points inside `region`, for scatter views. `None` when no
    /// dataset is loaded.
    pub fn points_in_box(&self, region: &BoxFilter) -> Option<PointCloud> {
        let cloud = self.store.cloud()?;
        let indices = region.select(cloud);
        Some(cloud.select(&indices))
    }

    /// Statistics of `variable` over the raw points inside `region`.
    pub fn region_stats(&self, variable: &str, region: &BoxFilter) -> Result<Option<RegionStats>> {
        match self.store.cloud() {
            Some(cloud) => RegionStats::compute(cloud, variable, region),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Artifact, MemoryCache};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Memory cache whose `put` can be made to fail.
    struct FlakyCache {
        inner: MemoryCache,
        fail: Rc<Cell<bool>>,
    }

    impl ArtifactCache for FlakyCache {
        fn put_metadata(&mut self, metadata: &DatasetMetadata) -> Result<()> {
            self.inner.put_metadata(metadata)
        }

        fn metadata(&self) -> Result<Option<DatasetMetadata>> {
            self.inner.metadata()
        }

        fn put(&mut self, key: ArtifactKey, artifact: Artifact) -> Result<()> {
            if self.fail.get() && matches!(key, ArtifactKey::Profile(_)) {
                return Err(PreprocessError::io(
                    "flaky",
                    std::io::Error::other("disk full"),
                ));
            }
            self.inner.put(key, artifact)
        }

        fn get(&self, key: ArtifactKey) -> Result<Option<Artifact>> {
            self.inner.get(key)
        }

        fn keys(&self) -> Result<Vec<ArtifactKey>> {
            self.inner.keys()
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    fn cube(n: usize, offset: f64) -> PointCloud {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        let mut t = Vec::new();
        let step = 1.0 / (n - 1) as f64;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    x.push(i as f64 * step);
                    y.push(j as f64 * step);
                    z.push(k as f64 * step);
                    t.push(offset + i as f64);
                }
            }
        }
        PointCloud::from_columns(vec![
            ("x".to_string(), x),
            ("y".to_string(), y),
            ("z".to_string(), z),
            ("t".to_string(), t),
        ])
        .unwrap()
    }

    fn small_config() -> PreprocessConfig {
        PreprocessConfig {
            slice_count: 5,
            grid_size: 9,
            ..Default::default()
        }
    }

    #[test]
    fn load_generates_all_artifacts_once() {
        let mut converter = PointCloudConverter::new(small_config(), MemoryCache::new()).unwrap();
        assert_eq!(converter.status(), StoreStatus::Empty);

        let LoadOutcome::Processed(report) = converter.load(cube(5, 0.0)).unwrap() else {
            panic!("expected processing");
        };
        assert_eq!(report.slices_written, 15);
        assert_eq!(report.profiles_written, 3);
        assert_eq!(converter.status(), StoreStatus::Processed);
        assert_eq!(converter.artifact_keys().unwrap().len(), 18);

        let slice = converter.slice(PlaneFamily::XY, 2).unwrap().unwrap();
        assert_eq!(slice.grid_shape, (9, 9));
        assert!(converter.metadata().unwrap().is_some());

        assert_eq!(
            converter.load(cube(5, 0.0)).unwrap(),
            LoadOutcome::AlreadyProcessed
        );
    }

    #[test]
    fn failed_run_clears_cache_and_retries() {
        let fail = Rc::new(Cell::new(true));
        let cache = FlakyCache {
            inner: MemoryCache::new(),
            fail: Rc::clone(&fail),
        };
        let mut converter = PointCloudConverter::new(small_config(), cache).unwrap();

        assert!(converter.load(cube(5, 0.0)).is_err());
        assert_eq!(converter.status(), StoreStatus::Pending);
        assert!(converter.artifact_keys().unwrap().is_empty());
        assert!(converter.metadata().unwrap().is_none());

        fail.set(false);
        assert!(matches!(
            converter.load(cube(5, 0.0)).unwrap(),
            LoadOutcome::Processed(_)
        ));
        assert_eq!(converter.status(), StoreStatus::Processed);
    }

    #[test]
    fn new_dataset_replaces_every_artifact() {
        let mut converter = PointCloudConverter::new(small_config(), MemoryCache::new()).unwrap();
        converter.load(cube(5, 0.0)).unwrap();
        converter.load(cube(5, 100.0)).unwrap();

        let profile = converter.profile(Axis::X).unwrap().unwrap();
        let t = profile.values("t").unwrap();
        assert!(t.iter().all(|v| *v >= 100.0));
    }

    #[test]
    fn raw_point_queries() {
        let mut converter = PointCloudConverter::new(small_config(), MemoryCache::new()).unwrap();
        let region = BoxFilter::default().with(Axis::X, (0.0, 0.3));
        assert!(converter.points_in_box(&region).is_none());

        converter.load(cube(5, 0.0)).unwrap();
        // x in {0, 0.25}: two layers of 25 points.
        let points = converter.points_in_box(&region).unwrap();
        assert_eq!(points.len(), 50);

        let stats = converter.region_stats("t", &region).unwrap().unwrap();
        assert_eq!(stats.count, 50);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.mean, 0.5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PreprocessConfig {
            grid_size: 0,
            ..Default::default()
        };
        assert!(PointCloudConverter::new(config, MemoryCache::new()).is_err());
    }
}
