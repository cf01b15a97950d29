use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Artifact, ArtifactCache, ArtifactKey, check_key};
use crate::constants::{ARTIFACT_COMPRESSION_LEVEL, METADATA_FILE};
use crate::error::{PreprocessError, Result};
use crate::manifest::DatasetMetadata;

/// Directory-backed artifact store: `metadata.json` plus one
/// bincode + zstd file per key. Writes land in a hidden temporary file and
/// are published by rename, so a reader sees either the old or the new file.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (and create if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PreprocessError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, key: ArtifactKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn write_atomic(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(file_name);
        let staging = self.dir.join(format!(".{file_name}.tmp"));
        fs::write(&staging, bytes).map_err(|e| PreprocessError::io(&staging, e))?;
        fs::rename(&staging, &target).map_err(|e| PreprocessError::io(&target, e))
    }

    /// Read a file, mapping "not found" to `None`.
    fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PreprocessError::io(path, e)),
        }
    }
}

impl ArtifactCache for DiskCache {
    fn put_metadata(&mut self, metadata: &DatasetMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        self.write_atomic(METADATA_FILE, json.as_bytes())
    }

    fn metadata(&self) -> Result<Option<DatasetMetadata>> {
        match self.read_optional(&self.dir.join(METADATA_FILE))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: ArtifactKey, artifact: Artifact) -> Result<()> {
        check_key(key, &artifact)?;

        let serialized = bincode::serialize(&artifact)?;
        let compressed = zstd::encode_all(&serialized[..], ARTIFACT_COMPRESSION_LEVEL)
            .map_err(|e| PreprocessError::io(self.path_of(key), e))?;
        debug!(
            key = %key,
            bytes = serialized.len(),
            compressed_bytes = compressed.len(),
            "Artifact encoded"
        );

        self.write_atomic(&key.file_name(), &compressed)
    }

    fn get(&self, key: ArtifactKey) -> Result<Option<Artifact>> {
        let path = self.path_of(key);
        let Some(compressed) = self.read_optional(&path)? else {
            return Ok(None);
        };
        let serialized =
            zstd::decode_all(&compressed[..]).map_err(|e| PreprocessError::io(&path, e))?;
        let artifact: Artifact = bincode::deserialize(&serialized)?;
        check_key(key, &artifact)?;
        Ok(Some(artifact))
    }

    fn keys(&self) -> Result<Vec<ArtifactKey>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| PreprocessError::io(&self.dir, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PreprocessError::io(&self.dir, e))?;
            if let Some(key) = entry.file_name().to_str().and_then(ArtifactKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes the metadata, every artifact and any stale staging file.
    /// Unrelated files in the directory are left alone.
    fn clear(&mut self) -> Result<()> {
        let entries = fs::read_dir(&self.dir).map_err(|e| PreprocessError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PreprocessError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let ours = name == METADATA_FILE
                || ArtifactKey::from_file_name(name).is_some()
                || (name.starts_with('.') && name.ends_with(".tmp"));
            if ours {
                let path = entry.path();
                fs::remove_file(&path).map_err(|e| PreprocessError::io(&path, e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Axis, PlaneFamily};
    use crate::bounds::{PointCloudBounds, SpatialBounds};
    use crate::config::PreprocessConfig;
    use crate::slice::Slice;

    fn slice(index: usize) -> Slice {
        Slice {
            plane: PlaneFamily::YZ,
            index,
            fixed_value: 0.5,
            axis_u: vec![0.0, 1.0],
            axis_v: vec![0.0, 1.0],
            grid_shape: (2, 2),
            point_count: 12,
            grids: [("t".to_string(), vec![1.0, f64::NAN, 3.0, 4.0])]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn artifacts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DiskCache::open(dir.path()).unwrap();
        let key = ArtifactKey::Slice(PlaneFamily::YZ, 2);
        cache.put(key, slice(2).into()).unwrap();

        assert!(dir.path().join("YZ_slice_2.bin").exists());
        assert!(!dir.path().join(".YZ_slice_2.bin.tmp").exists());

        let reopened = DiskCache::open(dir.path()).unwrap();
        let loaded = reopened.slice(PlaneFamily::YZ, 2).unwrap().unwrap();
        assert_eq!(loaded.grid_shape, (2, 2));
        assert_eq!(loaded.grid("t").unwrap()[3], 4.0);
        assert!(loaded.grid("t").unwrap()[1].is_nan());
        assert_eq!(reopened.keys().unwrap(), vec![key]);
        assert!(reopened.slice(PlaneFamily::YZ, 3).unwrap().is_none());
    }

    #[test]
    fn metadata_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DiskCache::open(dir.path()).unwrap();
        assert!(cache.metadata().unwrap().is_none());

        let mut bounds = PointCloudBounds::new();
        bounds.update(-1.0, 0.0, 1.0);
        let metadata = DatasetMetadata::new(
            SpatialBounds::new(&bounds, vec!["T".into()], 1),
            PreprocessConfig::default(),
            7,
        );
        cache.put_metadata(&metadata).unwrap();

        let text = fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(text.contains("\"x_range\""));
        assert!(text.contains('\n'));
        assert_eq!(cache.metadata().unwrap(), Some(metadata));
    }

    #[test]
    fn metadata_floats_reload_bit_exact() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let dir = tempfile::tempdir().unwrap();
        let mut cache = DiskCache::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..200 {
            let mut bounds = PointCloudBounds::new();
            for _ in 0..2 {
                bounds.update(rng.r#gen::<f64>(), rng.r#gen::<f64>() * 1e3, -rng.r#gen::<f64>());
            }
            let config = PreprocessConfig {
                slice_tolerance: rng.r#gen::<f64>(),
                ..Default::default()
            };
            let metadata = DatasetMetadata::new(
                SpatialBounds::new(&bounds, vec!["T".into()], 2),
                config,
                rng.r#gen::<u64>(),
            );

            cache.put_metadata(&metadata).unwrap();
            assert_eq!(cache.metadata().unwrap(), Some(metadata));
        }
    }

    #[test]
    fn clear_removes_only_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DiskCache::open(dir.path()).unwrap();
        cache.put(ArtifactKey::Slice(PlaneFamily::YZ, 0), slice(0).into()).unwrap();
        fs::write(dir.path().join(".line_X.bin.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        cache.clear().unwrap();
        assert!(cache.keys().unwrap().is_empty());
        assert!(!dir.path().join(".line_X.bin.tmp").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(cache.profile(Axis::X).unwrap().is_none());
    }
}
