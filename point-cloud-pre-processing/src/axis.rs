/// Principal axes, orthogonal plane families and uniform sampling
use constants::processing::COORDINATE_COLUMNS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Column name of this coordinate in input tables.
    pub fn column(self) -> &'static str {
        COORDINATE_COLUMNS[self as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{other}', expected X, Y or Z")),
        }
    }
}

/// Orthogonal slicing orientation, named after its two free axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlaneFamily {
    /// Constant-Z cross sections.
    XY,
    /// Constant-X cross sections.
    YZ,
    /// Constant-Y cross sections.
    XZ,
}

impl PlaneFamily {
    pub const ALL: [PlaneFamily; 3] = [PlaneFamily::XY, PlaneFamily::YZ, PlaneFamily::XZ];

    pub fn fixed_axis(self) -> Axis {
        match self {
            PlaneFamily::XY => Axis::Z,
            PlaneFamily::YZ => Axis::X,
            PlaneFamily::XZ => Axis::Y,
        }
    }

    /// Free axes as (grid columns, grid rows).
    pub fn free_axes(self) -> (Axis, Axis) {
        match self {
            PlaneFamily::XY => (Axis::X, Axis::Y),
            PlaneFamily::YZ => (Axis::Y, Axis::Z),
            PlaneFamily::XZ => (Axis::X, Axis::Z),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaneFamily::XY => "XY",
            PlaneFamily::YZ => "YZ",
            PlaneFamily::XZ => "XZ",
        }
    }
}

impl fmt::Display for PlaneFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlaneFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "XY" => Ok(PlaneFamily::XY),
            "YZ" => Ok(PlaneFamily::YZ),
            "XZ" => Ok(PlaneFamily::XZ),
            other => Err(format!("unknown plane '{other}', expected XY, YZ or XZ")),
        }
    }
}

/// `count` evenly spaced samples from `start` to `end`, both ends included.
/// The last sample is exactly `end`.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            let mut samples: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            samples[count - 1] = end;
            samples
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_spans_both_ends() {
        let samples = linspace(-1.0, 3.0, 5);
        assert_eq!(samples, vec![-1.0, 0.0, 1.0, 2.0, 3.0]);

        let samples = linspace(0.1, 0.7, 400);
        assert_eq!(samples.len(), 400);
        assert_eq!(samples[0], 0.1);
        assert_eq!(samples[399], 0.7);
        assert!(samples.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linspace_small_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }

    #[test]
    fn plane_axes_are_orthogonal() {
        for plane in PlaneFamily::ALL {
            let (u, v) = plane.free_axes();
            let fixed = plane.fixed_axis();
            assert_ne!(u, v);
            assert_ne!(u, fixed);
            assert_ne!(v, fixed);
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("xz".parse::<PlaneFamily>().unwrap(), PlaneFamily::XZ);
        assert_eq!("z".parse::<Axis>().unwrap(), Axis::Z);
        assert!("W".parse::<Axis>().is_err());
    }
}
