/// JSON-file backed case store
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::case::{Case, CaseStatus, NewCase, validate_metrics};
use crate::error::{RegistryError, Result};
use crate::summary::CaseSummary;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    cases: Vec<Case>,
}

pub struct CaseRegistry {
    path: PathBuf,
    document: Document,
}

impl CaseRegistry {
    /// Open the registry at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(RegistryError::io(&path, e)),
        };
        debug!(path = %path.display(), cases = document.cases.len(), "Case registry opened");
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `document` and only then make it the in-memory state, so a
    /// failed write leaves the registry as it was.
    fn commit(&mut self, document: Document) -> Result<()> {
        self.save(&document)?;
        self.document = document;
        Ok(())
    }

    fn save(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cases.json".to_string());
        let staging = self.path.with_file_name(format!(".{file_name}.tmp"));

        let json = serde_json::to_string_pretty(document)?;
        fs::write(&staging, json).map_err(|e| RegistryError::io(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| RegistryError::io(&self.path, e))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.document.cases.iter().position(|c| c.name == name)
    }

    /// Copy of the document with the named case changed by `edit`.
    fn edited(&self, name: &str, edit: impl FnOnce(&mut Case)) -> Result<Document> {
        let index = self
            .position(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let mut document = self.document.clone();
        edit(&mut document.cases[index]);
        Ok(document)
    }

    pub fn create(&mut self, new_case: NewCase) -> Result<&Case> {
        if self.position(&new_case.name).is_some() {
            return Err(RegistryError::DuplicateName(new_case.name));
        }
        let case = new_case.into_case(Utc::now())?;

        let mut document = self.document.clone();
        document.cases.push(case);
        self.commit(document)?;
        let last = &self.document.cases[self.document.cases.len() - 1];
        info!(name = %last.name, status = %last.status, "Case created");
        Ok(last)
    }

    /// All cases, newest first. Cases sharing a timestamp list the later
    /// created one first.
    pub fn list(&self) -> Vec<&Case> {
        let mut cases: Vec<(usize, &Case)> = self.document.cases.iter().enumerate().collect();
        cases.sort_by(|(ia, a), (ib, b)| (b.timestamp, ib).cmp(&(a.timestamp, ia)));
        cases.into_iter().map(|(_, case)| case).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Case> {
        self.document.cases.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.document.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.cases.is_empty()
    }

    pub fn update_status(&mut self, name: &str, status: CaseStatus) -> Result<()> {
        let document = self.edited(name, |case| case.status = status)?;
        self.commit(document)?;
        info!(name, status = %status, "Case status updated");
        Ok(())
    }

    /// Store measured metrics and mark the case completed.
    pub fn record_metrics(&mut self, name: &str, metrics: IndexMap<String, f64>) -> Result<()> {
        let metrics = validate_metrics(metrics)?;
        let document = self.edited(name, |case| {
            case.set_metrics(metrics);
            case.status = CaseStatus::Completed;
        })?;
        self.commit(document)?;
        info!(name, "Case metrics recorded");
        Ok(())
    }

    /// Remove a case. Returns false when no such case existed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let Some(index) = self.position(name) else {
            return Ok(false);
        };
        let mut document = self.document.clone();
        document.cases.remove(index);
        self.commit(document)?;
        info!(name, "Case deleted");
        Ok(true)
    }

    /// The named cases that exist, in the requested order.
    pub fn compare(&self, names: &[&str]) -> Vec<&Case> {
        names.iter().filter_map(|name| self.get(name)).collect()
    }

    /// `(min, max)` of every design parameter over all cases, schema order.
    pub fn parameter_bounds(&self) -> IndexMap<String, (f64, f64)> {
        let mut bounds: IndexMap<String, (f64, f64)> = IndexMap::new();
        for case in &self.document.cases {
            for (name, &value) in &case.design_parameters {
                bounds
                    .entry(name.clone())
                    .and_modify(|(min, max)| {
                        *min = min.min(value);
                        *max = max.max(value);
                    })
                    .or_insert((value, value));
            }
        }
        bounds
    }

    /// Counts and best completed cases, optionally restricted to cases whose
    /// timestamp lies within the inclusive `range`.
    pub fn summary(&self, range: Option<(DateTime<Utc>, DateTime<Utc>)>) -> CaseSummary {
        let cases: Vec<&Case> = self
            .document
            .cases
            .iter()
            .filter(|case| {
                range.is_none_or(|(from, to)| case.timestamp >= from && case.timestamp <= to)
            })
            .collect();
        CaseSummary::from_cases(&cases)
    }

    /// Write one case to a standalone JSON file.
    pub fn export_case(&self, name: &str, path: &Path) -> Result<()> {
        let case = self
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let json = serde_json::to_string_pretty(&case.exported())?;
        fs::write(path, json).map_err(|e| RegistryError::io(path, e))?;
        info!(name, path = %path.display(), "Case exported");
        Ok(())
    }

    /// Import an exported case under `<name>_imported_<YYYYmmdd_HHMMSS>`.
    /// Returns the new name.
    pub fn import_case(&mut self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| RegistryError::io(path, e))?;
        let mut new_case: NewCase = serde_json::from_slice(&bytes)?;
        new_case.name = format!(
            "{}_imported_{}",
            new_case.name,
            Utc::now().format("%Y%m%d_%H%M%S")
        );

        let name = self.create(new_case)?.name.clone();
        info!(name = %name, path = %path.display(), "Case imported");
        Ok(name)
    }
}
