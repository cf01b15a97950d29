//! Spatial preprocessing of scattered CFD point clouds.
//!
//! A loaded [`PointCloud`] is cut into regularly gridded slices along three
//! orthogonal plane families and reduced to one line profile per axis. The
//! [`PointCloudConverter`] computes everything once per dataset and persists
//! it through an [`ArtifactCache`], so readers only ever look artifacts up.

pub mod axis;
pub mod bounds;
pub mod cache;
pub mod config;
pub mod constants;
pub mod converter;
pub mod csv_reader;
pub mod dds_writer;
pub mod error;
pub mod laz;
pub mod logging;
pub mod manifest;
pub mod point_cloud;
pub mod profile;
pub mod progress;
pub mod query;
pub mod slice;
pub mod spatial_layout;
pub mod store;
pub mod triangulation;

use std::path::Path;

pub use axis::{Axis, PlaneFamily};
pub use bounds::SpatialBounds;
pub use cache::{Artifact, ArtifactCache, ArtifactKey, DiskCache, MemoryCache};
pub use config::PreprocessConfig;
pub use converter::{LoadOutcome, PointCloudConverter};
pub use error::{PreprocessError, Result};
pub use manifest::{DatasetMetadata, ProcessingReport};
pub use point_cloud::{Point, PointCloud};
pub use profile::LineProfile;
pub use query::{BoxFilter, RegionStats, slice_index_for_fraction};
pub use slice::{GridWindow, Slice};
pub use store::StoreStatus;

/// Read a point cloud, choosing the reader by file extension
/// (`.csv`, `.las` or `.laz`).
pub fn read_point_cloud(path: &Path) -> Result<PointCloud> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => csv_reader::read_csv(path),
        Some("las") | Some("laz") => laz::read_las(path),
        _ => Err(PreprocessError::UnsupportedFormat(path.to_path_buf())),
    }
}
