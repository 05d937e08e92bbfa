// src/physics/fitting/mod.rs
pub mod least_squares;
pub mod plot;
pub mod stepwise;
pub mod terms;

pub use stepwise::{fit_surface, AxisFit, FitReport, SurfaceFit};
pub use terms::{parse_terms, Axis, Term};

use crate::error::{FlpzError, Result};

/// Scattered (x, y, z) samples, one entry per row of the input table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScatterData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

fn min_max(v: &[f64]) -> (f64, f64) {
    v.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}

fn scale_column(v: &[f64], name: &str) -> Result<Vec<f64>> {
    let (lo, hi) = min_max(v);
    let range = hi - lo;
    if !(range > 0.0) {
        return Err(FlpzError::MalformedInput(format!(
            "column {} has zero range, cannot scale to [0, 1]",
            name
        )));
    }
    Ok(v.iter().map(|x| (x - lo) / range).collect())
}

impl ScatterData {
    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Every column mapped linearly onto [0, 1].
    pub fn min_max_scaled(&self) -> Result<ScatterData> {
        Ok(ScatterData {
            x: scale_column(&self.x, "x")?,
            y: scale_column(&self.y, "y")?,
            z: scale_column(&self.z, "z")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_scaled() {
        let data = ScatterData {
            x: vec![-1.0, 0.0, 1.0],
            y: vec![10.0, 20.0, 30.0],
            z: vec![5.0, 5.5, 7.0],
        };
        let s = data.min_max_scaled().unwrap();
        assert_eq!(s.x, vec![0.0, 0.5, 1.0]);
        assert_eq!(s.y, vec![0.0, 0.5, 1.0]);
        assert_eq!(s.z, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_constant_column_is_rejected() {
        let data = ScatterData {
            x: vec![0.0, 1.0],
            y: vec![2.0, 2.0],
            z: vec![0.0, 1.0],
        };
        assert!(matches!(data.min_max_scaled(), Err(FlpzError::MalformedInput(_))));
    }
}
