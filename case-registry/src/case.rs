/// Case records and their validation against the shared schema
use chrono::{DateTime, Utc};
use constants::case_schema::{DESIGN_PARAMETERS, get_design_parameter, get_performance_metric};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Planned,
    Running,
    Completed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaseStatus::Planned => "planned",
            CaseStatus::Running => "running",
            CaseStatus::Completed => "completed",
        })
    }
}

impl FromStr for CaseStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "planned" => Ok(CaseStatus::Planned),
            "running" => Ok(CaseStatus::Running),
            "completed" => Ok(CaseStatus::Completed),
            _ => Err(RegistryError::InvalidStatus(s.to_string())),
        }
    }
}

/// A stored simulation case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub status: CaseStatus,
    /// Every schema design parameter, in schema order.
    pub design_parameters: IndexMap<String, f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    performance_metrics: IndexMap<String, f64>,
}

impl Case {
    /// Performance metrics, reported only while the case is completed.
    pub fn metrics(&self) -> Option<&IndexMap<String, f64>> {
        (self.status == CaseStatus::Completed).then_some(&self.performance_metrics)
    }

    pub fn design_parameter(&self, name: &str) -> Option<f64> {
        self.design_parameters.get(name).copied()
    }

    pub(crate) fn set_metrics(&mut self, metrics: IndexMap<String, f64>) {
        self.performance_metrics = metrics;
    }

    /// Copy suitable for export: metrics dropped unless completed.
    pub(crate) fn exported(&self) -> NewCase {
        NewCase {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            design_parameters: self.design_parameters.clone(),
            performance_metrics: self.metrics().cloned().unwrap_or_default(),
        }
    }
}

/// Input for creating a case. Missing design parameters take their schema
/// defaults; metrics are kept only for completed cases.
///
/// Built in code the status defaults to planned. Case files that omit it are
/// records of finished runs and deserialize as completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCase {
    pub name: String,
    pub description: String,
    #[serde(default = "file_status")]
    pub status: CaseStatus,
    pub design_parameters: IndexMap<String, f64>,
    pub performance_metrics: IndexMap<String, f64>,
}

impl NewCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: CaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.design_parameters.insert(name.into(), value);
        self
    }

    pub fn metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.performance_metrics.insert(name.into(), value);
        self
    }

    /// Validate names and build the stored record.
    pub(crate) fn into_case(self, timestamp: DateTime<Utc>) -> Result<Case> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let design_parameters = complete_design_parameters(&self.design_parameters)?;
        let performance_metrics = if self.status == CaseStatus::Completed {
            validate_metrics(self.performance_metrics)?
        } else {
            IndexMap::new()
        };

        Ok(Case {
            name: self.name,
            timestamp,
            description: self.description,
            status: self.status,
            design_parameters,
            performance_metrics,
        })
    }
}

fn file_status() -> CaseStatus {
    CaseStatus::Completed
}

/// All schema parameters in schema order, given values first, defaults for the rest.
fn complete_design_parameters(given: &IndexMap<String, f64>) -> Result<IndexMap<String, f64>> {
    if let Some(unknown) = given.keys().find(|name| get_design_parameter(name).is_none()) {
        return Err(RegistryError::UnknownParameter(unknown.clone()));
    }
    check_finite(given)?;

    Ok(DESIGN_PARAMETERS
        .iter()
        .filter_map(|info| {
            let value = given.get(info.name).copied().or(info.default)?;
            Some((info.name.to_string(), value))
        })
        .collect())
}

pub(crate) fn validate_metrics(metrics: IndexMap<String, f64>) -> Result<IndexMap<String, f64>> {
    if let Some(unknown) = metrics.keys().find(|name| get_performance_metric(name).is_none()) {
        return Err(RegistryError::UnknownMetric(unknown.clone()));
    }
    check_finite(&metrics)?;
    Ok(metrics)
}

/// JSON has no NaN or infinity; such values would not survive a reload.
fn check_finite(values: &IndexMap<String, f64>) -> Result<()> {
    match values.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, &value)) => Err(RegistryError::NonFiniteValue {
            name: name.clone(),
            value,
        }),
        None => Ok(()),
    }
}
