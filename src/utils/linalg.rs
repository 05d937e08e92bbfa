// src/utils/linalg.rs

use crate::error::{FlpzError, Result};
use crate::model::Lattice;
use nalgebra::{Matrix3, Vector3};

/// Below this normalized volume a basis is treated as singular.
pub const SINGULAR_EPS: f64 = 1e-8;

fn to_matrix(lattice: Lattice) -> Matrix3<f64> {
  Matrix3::from_row_slice(&[
    lattice[0][0],
    lattice[0][1],
    lattice[0][2],
    lattice[1][0],
    lattice[1][1],
    lattice[1][2],
    lattice[2][0],
    lattice[2][1],
    lattice[2][2],
  ])
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Arguments
/// * `frac` - Fractional coordinates [x, y, z], any range
/// * `lattice` - Lattice vectors as row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]]
///
/// # Formula
/// ```text
/// Cartesian = Fractional · Lattice  (= Lattice^T × Fractional)
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: Lattice) -> [f64; 3] {
  let cart_vec = to_matrix(lattice).transpose() * Vector3::from(frac);
  [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Convert Cartesian coordinates to fractional using lattice matrix
///
/// Returns None if the lattice is singular.
///
/// # Formula
/// ```text
/// Fractional = Cartesian · Lattice^-1  (= (Lattice^T)^-1 × Cartesian)
/// ```
pub fn cart_to_frac(cart: [f64; 3], lattice: Lattice) -> Option<[f64; 3]> {
  let inv_lat = to_matrix(lattice).transpose().try_inverse()?;
  let frac_vec = inv_lat * Vector3::from(cart);
  Some([frac_vec.x, frac_vec.y, frac_vec.z])
}

pub fn determinant(lattice: Lattice) -> f64 {
  to_matrix(lattice).determinant()
}

/// Rejects singular bases. The determinant is compared against the product
/// of the vector lengths so the check does not depend on the length unit.
pub fn check_lattice(lattice: Lattice, which: &str) -> Result<f64> {
  let det = determinant(lattice);
  let lengths: f64 = lattice.iter().map(|v| norm(*v)).product();

  if !det.is_finite() || lengths == 0.0 || (det / lengths).abs() < SINGULAR_EPS {
    return Err(FlpzError::InvalidLattice {
      which: which.to_string(),
      det,
    });
  }
  Ok(det)
}

/// Multiplies lattice row i by `factors[i]` (ABINIT `acell` scaling).
pub fn scale_rows(lattice: Lattice, factors: [f64; 3]) -> Lattice {
  let mut out = lattice;
  for (row, f) in out.iter_mut().zip(factors) {
    for x in row.iter_mut() {
      *x *= f;
    }
  }
  out
}

pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
  [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn norm(a: [f64; 3]) -> f64 {
  (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

    let frac = [0.5, 0.5, 0.5];
    let cart = frac_to_cart(frac, lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
  }

  #[test]
  fn test_row_vector_convention() {
    // Rows are the lattice vectors: frac [1,0,0] must give the first row.
    let lattice = [[0.0, 7.0, 0.0], [0.0, 0.0, 7.0], [7.0, 0.0, 0.0]];

    assert_eq!(frac_to_cart([1.0, 0.0, 0.0], lattice), [0.0, 7.0, 0.0]);
    assert_eq!(frac_to_cart([0.0, 0.0, 1.0], lattice), [7.0, 0.0, 0.0]);

    let cart = frac_to_cart([0.5, 0.0, 0.5], lattice);
    assert!((cart[0] - 3.5).abs() < 1e-12);
    assert!((cart[1] - 3.5).abs() < 1e-12);
    assert!(cart[2].abs() < 1e-12);
  }

  #[test]
  fn test_round_trip_triclinic() {
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.3, -0.7, 5.0]];

    let frac_orig = [0.333, -0.667, 1.25];
    let cart = frac_to_cart(frac_orig, lattice);
    let frac_back = cart_to_frac(cart, lattice).unwrap();

    for k in 0..3 {
      assert!((frac_back[k] - frac_orig[k]).abs() < 1e-10);
    }
  }

  #[test]
  fn test_singular_lattice_rejected() {
    let flat = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    assert!(cart_to_frac([1.0, 1.0, 1.0], flat).is_none());
    assert!(matches!(
      check_lattice(flat, "origin"),
      Err(FlpzError::InvalidLattice { .. })
    ));

    let zero_row = [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    assert!(check_lattice(zero_row, "target").is_err());
  }

  #[test]
  fn test_check_lattice_is_scale_free() {
    // A tiny but perfectly valid cell must not be flagged singular.
    let tiny = [[1e-3, 0.0, 0.0], [0.0, 1e-3, 0.0], [0.0, 0.0, 1e-3]];
    let det = check_lattice(tiny, "origin").unwrap();
    assert!((det - 1e-9).abs() < 1e-20);
  }

  #[test]
  fn test_scale_rows() {
    let rprim = [[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let scaled = scale_rows(rprim, [2.0, 3.0, 4.0]);
    assert_eq!(scaled, [[2.0, 0.0, 0.0], [1.5, 3.0, 0.0], [0.0, 0.0, 4.0]]);
  }
}
