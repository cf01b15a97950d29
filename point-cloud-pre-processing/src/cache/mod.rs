//! Artifact storage for processed slices and profiles.
//!
//! Every artifact lives under a typed [`ArtifactKey`]. A missing key is a
//! normal state meaning "not computed" or "too few points", never an error.

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::axis::{Axis, PlaneFamily};
use crate::constants::ARTIFACT_EXTENSION;
use crate::error::Result;
use crate::manifest::DatasetMetadata;
use crate::profile::LineProfile;
use crate::slice::Slice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKey {
    Slice(PlaneFamily, usize),
    Profile(Axis),
}

impl ArtifactKey {
    /// File name used by disk backends, e.g. `XY_slice_3.bin` or `line_X.bin`.
    pub fn file_name(&self) -> String {
        match self {
            ArtifactKey::Slice(plane, index) => {
                format!("{plane}_slice_{index}.{ARTIFACT_EXTENSION}")
            }
            ArtifactKey::Profile(axis) => format!("line_{axis}.{ARTIFACT_EXTENSION}"),
        }
    }

    /// Inverse of [`ArtifactKey::file_name`].
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
        if let Some(axis) = stem.strip_prefix("line_") {
            return axis.parse().ok().map(ArtifactKey::Profile);
        }
        let (plane, index) = stem.split_once("_slice_")?;
        Some(ArtifactKey::Slice(plane.parse().ok()?, index.parse().ok()?))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKey::Slice(plane, index) => write!(f, "{plane} slice {index}"),
            ArtifactKey::Profile(axis) => write!(f, "{axis} profile"),
        }
    }
}

/// Immutable processed artifact. Cloning shares the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Artifact {
    Slice(Arc<Slice>),
    Profile(Arc<LineProfile>),
}

impl Artifact {
    pub fn key(&self) -> ArtifactKey {
        match self {
            Artifact::Slice(slice) => slice.key(),
            Artifact::Profile(profile) => profile.key(),
        }
    }
}

impl From<Slice> for Artifact {
    fn from(slice: Slice) -> Self {
        Artifact::Slice(Arc::new(slice))
    }
}

impl From<LineProfile> for Artifact {
    fn from(profile: LineProfile) -> Self {
        Artifact::Profile(Arc::new(profile))
    }
}

/// Keyed store of dataset metadata and artifacts.
pub trait ArtifactCache {
    fn put_metadata(&mut self, metadata: &DatasetMetadata) -> Result<()>;

    fn metadata(&self) -> Result<Option<DatasetMetadata>>;

    /// Store `artifact` under `key`, replacing any previous artifact. The key
    /// must be the artifact's own key.
    fn put(&mut self, key: ArtifactKey, artifact: Artifact) -> Result<()>;

    fn get(&self, key: ArtifactKey) -> Result<Option<Artifact>>;

    /// Keys currently present, sorted.
    fn keys(&self) -> Result<Vec<ArtifactKey>>;

    /// Remove the metadata and every artifact.
    fn clear(&mut self) -> Result<()>;

    fn slice(&self, plane: PlaneFamily, index: usize) -> Result<Option<Arc<Slice>>> {
        Ok(match self.get(ArtifactKey::Slice(plane, index))? {
            Some(Artifact::Slice(slice)) => Some(slice),
            _ => None,
        })
    }

    fn profile(&self, axis: Axis) -> Result<Option<Arc<LineProfile>>> {
        Ok(match self.get(ArtifactKey::Profile(axis))? {
            Some(Artifact::Profile(profile)) => Some(profile),
            _ => None,
        })
    }
}

/// Reject artifacts stored under a key other than their own.
pub(crate) fn check_key(key: ArtifactKey, artifact: &Artifact) -> Result<()> {
    let actual = artifact.key();
    if actual != key {
        return Err(crate::error::PreprocessError::KeyMismatch { key, actual });
    }
    Ok(())
}
