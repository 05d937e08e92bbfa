use log::debug;
use nalgebra::Matrix3;
use num_complex::Complex;

use crate::model::Lattice;

/// Tolerances for matching a permutation matrix: |a - b| <= ATOL + RTOL * |b|
const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

pub const ORTHOGONALITY_TOL: f64 = 1e-8;

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Row permutations of the identity, row i has its one at column PERMS[k][i].
const PERMS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// If |m| is (close to) a permutation matrix, reorder rows so each row's
/// nonzero component sits on the diagonal. Anything else is returned as is.
pub fn rearrange_rows(m: Lattice) -> Lattice {
    for perm in PERMS {
        let fits = (0..3).all(|i| {
            (0..3).all(|j| {
                let target = if perm[i] == j { 1.0 } else { 0.0 };
                is_close(m[i][j].abs(), target)
            })
        });

        if fits {
            let mut out = [[0.0; 3]; 3];
            for (i, &col) in perm.iter().enumerate() {
                out[col] = m[i];
            }
            if perm != [0, 1, 2] {
                debug!("rprim rows reordered by {:?}", perm);
            }
            return out;
        }
    }
    m
}

/// True when every pair of rows has a dot product within `tol` of zero.
pub fn has_orthogonal_rows(m: Lattice, tol: f64) -> bool {
    for i in 0..3 {
        for j in (i + 1)..3 {
            let d: f64 = (0..3).map(|k| m[i][k] * m[j][k]).sum();
            if d.abs() > tol {
                return false;
            }
        }
    }
    true
}

fn round10(x: f64) -> f64 {
    let r = (x * 1e10).round() / 1e10;
    // keep "-0.0000000000" out of the printed output
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Diagonal matrix of the (real parts of the) eigenvalues of `m`.
pub fn diagonalize(m: Lattice) -> Lattice {
    let is_diagonal = (0..3).all(|i| (0..3).all(|j| i == j || m[i][j] == 0.0));

    let eigenvalues: [f64; 3] = if is_diagonal {
        [m[0][0], m[1][1], m[2][2]]
    } else {
        let mat = Matrix3::from_row_slice(&[
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        ]);
        let ev = mat.complex_eigenvalues();
        let values: Vec<Complex<f64>> = ev.iter().copied().collect();
        if values.iter().any(|c| c.im.abs() > ATOL) {
            debug!("rprim has complex eigenvalues {:?}, keeping real parts", values);
        }
        [values[0].re, values[1].re, values[2].re]
    };

    let mut d = [[0.0; 3]; 3];
    for i in 0..3 {
        d[i][i] = round10(eigenvalues[i]);
    }
    d
}

/// Rearrange, then diagonalize when the rows are mutually orthogonal.
pub fn canonicalize(m: Lattice) -> Lattice {
    let rearranged = rearrange_rows(m);
    if has_orthogonal_rows(rearranged, ORTHOGONALITY_TOL) {
        diagonalize(rearranged)
    } else {
        rearranged
    }
}

pub fn format_matrix(m: Lattice) -> String {
    m.iter()
        .map(|row| {
            row.iter()
                .map(|x| format!("{:.10}", x))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cyclic_permutation_lands_on_diagonal() {
        let m = [[0.0, 7.0, 0.0], [0.0, 0.0, 7.0], [7.0, 0.0, 0.0]];
        // |m| is not a permutation matrix (entries are 7), so nothing moves.
        assert_eq!(rearrange_rows(m), m);

        let unit = [[0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]];
        let r = rearrange_rows(unit);
        assert_eq!(r, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]]);
    }

    #[test]
    fn test_swap_permutation() {
        let m = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(rearrange_rows(m), [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_orthogonality() {
        let ortho = [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]];
        assert!(has_orthogonal_rows(ortho, ORTHOGONALITY_TOL));

        let hex = [[1.0, 0.0, 0.0], [-0.5, 0.8660254037844386, 0.0], [0.0, 0.0, 1.0]];
        assert!(!has_orthogonal_rows(hex, ORTHOGONALITY_TOL));
    }

    #[test]
    fn test_canonicalize_scaled_permutation() {
        let m = [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(canonicalize(m), [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_canonicalize_non_orthogonal_is_untouched() {
        let hex = [[1.0, 0.0, 0.0], [-0.5, 0.8660254037844386, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(canonicalize(hex), hex);
    }

    #[test]
    fn test_diagonalize_symmetric_orthogonal_rows() {
        // Reflection across x = y, rows orthogonal: eigenvalues 1, -1, 1.
        let m = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let d = diagonalize(m);
        let mut diag = [d[0][0], d[1][1], d[2][2]];
        diag.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(diag[0], -1.0, epsilon = 1e-9);
        assert_relative_eq!(diag[1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(diag[2], 1.0, epsilon = 1e-9);
        assert_eq!(d[0][1], 0.0);
    }

    #[test]
    fn test_format_matrix() {
        let out = format_matrix([[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.5]]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "0.0000000000 0.0000000000 3.5000000000");
    }
}
