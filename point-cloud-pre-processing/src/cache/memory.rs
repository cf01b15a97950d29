use std::collections::HashMap;

use super::{Artifact, ArtifactCache, ArtifactKey, check_key};
use crate::error::Result;
use crate::manifest::DatasetMetadata;

/// In-process artifact store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    metadata: Option<DatasetMetadata>,
    artifacts: HashMap<ArtifactKey, Artifact>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactCache for MemoryCache {
    fn put_metadata(&mut self, metadata: &DatasetMetadata) -> Result<()> {
        self.metadata = Some(metadata.clone());
        Ok(())
    }

    fn metadata(&self) -> Result<Option<DatasetMetadata>> {
        Ok(self.metadata.clone())
    }

    fn put(&mut self, key: ArtifactKey, artifact: Artifact) -> Result<()> {
        check_key(key, &artifact)?;
        self.artifacts.insert(key, artifact);
        Ok(())
    }

    fn get(&self, key: ArtifactKey) -> Result<Option<Artifact>> {
        Ok(self.artifacts.get(&key).cloned())
    }

    fn keys(&self) -> Result<Vec<ArtifactKey>> {
        let mut keys: Vec<ArtifactKey> = self.artifacts.keys().copied().collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&mut self) -> Result<()> {
        self.metadata = None;
        self.artifacts.clear();
        Ok(())
    }
}
