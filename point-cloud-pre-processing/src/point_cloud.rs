/// Column-wise scattered point cloud with a fixed set of scalar variables
use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::axis::Axis;
use crate::bounds::PointCloudBounds;
use crate::error::{PreprocessError, Result};

/// A single scattered sample, used when building a cloud point by point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub values: IndexMap<String, f64>,
}

/// Validated point cloud. Coordinates are finite, every variable column has
/// one value per point and the variable order is the input column order.
#[derive(Debug, Clone)]
pub struct PointCloud {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    variables: IndexMap<String, Vec<f64>>,
}

impl PointCloud {
    /// Build from named columns. `x`, `y` and `z` are required; every other
    /// column becomes a variable.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut named: IndexMap<String, Vec<f64>> = IndexMap::with_capacity(columns.len());
        for (name, values) in columns {
            if named.contains_key(&name) {
                return Err(PreprocessError::DuplicateColumn(name));
            }
            named.insert(name, values);
        }

        let mut take = |axis: Axis| {
            named
                .shift_remove(axis.column())
                .ok_or(PreprocessError::MissingColumn(axis.column()))
        };
        let x = take(Axis::X)?;
        let y = take(Axis::Y)?;
        let z = take(Axis::Z)?;

        let cloud = Self {
            x,
            y,
            z,
            variables: named,
        };
        cloud.validate()?;
        Ok(cloud)
    }

    /// Build from individual points. Every point must carry the variable
    /// keys of the first point, in any order.
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(PreprocessError::EmptyPointCloud);
        };
        let names: Vec<String> = first.values.keys().cloned().collect();

        let n = points.len();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        let mut variables: IndexMap<String, Vec<f64>> = names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(n)))
            .collect();

        for (row, point) in points.into_iter().enumerate() {
            let consistent = point.values.len() == names.len()
                && names.iter().all(|name| point.values.contains_key(name));
            if !consistent {
                return Err(PreprocessError::InconsistentVariables {
                    row,
                    expected: names,
                    found: point.values.keys().cloned().collect(),
                });
            }

            x.push(point.x);
            y.push(point.y);
            z.push(point.z);
            for (name, column) in variables.iter_mut() {
                column.push(point.values[name]);
            }
        }

        let cloud = Self { x, y, z, variables };
        cloud.validate()?;
        Ok(cloud)
    }

    fn validate(&self) -> Result<()> {
        let n = self.x.len();
        if n == 0 {
            return Err(PreprocessError::EmptyPointCloud);
        }

        let coordinates = [(Axis::Y, &self.y), (Axis::Z, &self.z)];
        for (axis, column) in coordinates {
            if column.len() != n {
                return Err(PreprocessError::RaggedColumn {
                    column: axis.column().to_string(),
                    expected: n,
                    actual: column.len(),
                });
            }
        }
        for (name, column) in &self.variables {
            if column.len() != n {
                return Err(PreprocessError::RaggedColumn {
                    column: name.clone(),
                    expected: n,
                    actual: column.len(),
                });
            }
        }

        for axis in Axis::ALL {
            if let Some(row) = self.coordinates(axis).iter().position(|v| !v.is_finite()) {
                return Err(PreprocessError::NonFiniteCoordinate {
                    row,
                    axis: axis.column(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn coordinates(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn variable(&self, name: &str) -> Option<&[f64]> {
        self.variables.get(name).map(Vec::as_slice)
    }

    /// Variables in column order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.variables
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn bounds(&self) -> PointCloudBounds {
        PointCloudBounds::from_columns(&self.x, &self.y, &self.z)
    }

    /// Cloud made of the points at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> PointCloud {
        let pick = |column: &[f64]| indices.iter().map(|&i| column[i]).collect::<Vec<_>>();
        PointCloud {
            x: pick(&self.x),
            y: pick(&self.y),
            z: pick(&self.z),
            variables: self
                .variables
                .iter()
                .map(|(name, values)| (name.clone(), pick(values)))
                .collect(),
        }
    }

    /// Content hash over column names and value bit patterns. Identical
    /// datasets hash identically even when they carry NaN values.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.len().hash(&mut hasher);
        for axis in Axis::ALL {
            axis.column().hash(&mut hasher);
            hash_values(self.coordinates(axis), &mut hasher);
        }
        for (name, values) in &self.variables {
            name.hash(&mut hasher);
            hash_values(values, &mut hasher);
        }
        hasher.finish()
    }
}

fn hash_values(values: &[f64], hasher: &mut impl Hasher) {
    for value in values {
        value.to_bits().hash(hasher);
    }
}
