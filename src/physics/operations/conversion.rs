use std::str::FromStr;

use crate::error::{FlpzError, Result};
use crate::model::Lattice;
use crate::utils::linalg::{cart_to_frac, check_lattice, frac_to_cart, scale_rows};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordMode {
    /// Cartesian in, reduced out.
    Xred,
    /// Reduced in, Cartesian out.
    Xcart,
}

impl FromStr for CoordMode {
    type Err = FlpzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "xred" => Ok(CoordMode::Xred),
            "xcart" => Ok(CoordMode::Xcart),
            other => Err(FlpzError::MalformedInput(format!(
                "invalid mode '{}', use 'xred' or 'xcart'",
                other
            ))),
        }
    }
}

/// Reduced coordinates of Cartesian positions, for `rprim` rows scaled by `acell`.
pub fn to_reduced(xcart: &[[f64; 3]], rprim: Lattice, acell: [f64; 3]) -> Result<Vec<[f64; 3]>> {
    let lattice = scale_rows(rprim, acell);
    check_lattice(lattice, "scaled rprim")?;

    xcart
        .iter()
        .map(|&c| {
            cart_to_frac(c, lattice).ok_or_else(|| FlpzError::InvalidLattice {
                which: "scaled rprim".to_string(),
                det: 0.0,
            })
        })
        .collect()
}

/// Cartesian coordinates of reduced positions, for `rprim` rows scaled by `acell`.
pub fn to_cartesian(xred: &[[f64; 3]], rprim: Lattice, acell: [f64; 3]) -> Result<Vec<[f64; 3]>> {
    let lattice = scale_rows(rprim, acell);
    check_lattice(lattice, "scaled rprim")?;
    Ok(xred.iter().map(|&r| frac_to_cart(r, lattice)).collect())
}

/// Row convention throughout: `cart = red · (rprim scaled by acell)`, rows
/// being the primitive vectors. For a non-symmetric `rprim` this differs from
/// the older ABINIT helper scripts, which multiplied by the columns instead
/// (`cart = scaled · red`); transpose `rprim` to reproduce their numbers.
pub fn convert(
    mode: CoordMode,
    coords: &[[f64; 3]],
    rprim: Lattice,
    acell: [f64; 3],
) -> Result<Vec<[f64; 3]>> {
    match mode {
        CoordMode::Xred => to_reduced(coords, rprim, acell),
        CoordMode::Xcart => to_cartesian(coords, rprim, acell),
    }
}

// --- Parsing helpers for the flat, whitespace-separated argument style ---

pub fn parse_numbers(text: &str, what: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                FlpzError::MalformedInput(format!("{}: '{}' is not a number", what, s))
            })
        })
        .collect()
}

/// Nine numbers, row-major.
pub fn parse_rprim(text: &str) -> Result<Lattice> {
    let v = parse_numbers(text, "rprim")?;
    if v.len() != 9 {
        return Err(FlpzError::MalformedInput(format!(
            "rprim needs 9 numbers, got {}",
            v.len()
        )));
    }
    Ok([[v[0], v[1], v[2]], [v[3], v[4], v[5]], [v[6], v[7], v[8]]])
}

/// `3 * natom` numbers, one atom per consecutive triple.
pub fn parse_coords(text: &str, natom: usize) -> Result<Vec<[f64; 3]>> {
    let v = parse_numbers(text, "coordinates")?;
    if v.len() != 3 * natom {
        return Err(FlpzError::MalformedInput(format!(
            "expected {} coordinates for {} atoms, got {}",
            3 * natom,
            natom,
            v.len()
        )));
    }
    Ok(v.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// One row per atom, `{:.10}` values in a 30-wide field.
pub fn format_rows(rows: &[[f64; 3]]) -> String {
    rows.iter()
        .map(|r| {
            let line = r
                .iter()
                .map(|x| format!("{:.10}", x))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{:<30}", line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HEX: Lattice = [[1.0, 0.0, 0.0], [-0.5, 0.8660254037844386, 0.0], [0.0, 0.0, 1.0]];

    #[test]
    fn test_acell_scaling() {
        let xred = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.5]];
        let xcart = to_cartesian(&xred, HEX, [3.0, 3.0, 5.0]).unwrap();

        assert_relative_eq!(xcart[0][0], 3.0);
        assert_relative_eq!(xcart[1][0], -1.5);
        assert_relative_eq!(xcart[1][1], 3.0 * 0.8660254037844386);
        assert_relative_eq!(xcart[2][2], 2.5);
    }

    #[test]
    fn test_round_trip() {
        let rprim = [[0.9, 0.1, 0.0], [0.2, 1.1, -0.3], [0.0, 0.4, 1.3]];
        let acell = [5.1, 6.2, 7.3];
        let xcart = vec![[0.1, 2.0, -3.0], [4.4, 0.0, 1.0], [-1.0, -2.0, 9.5]];

        let xred = to_reduced(&xcart, rprim, acell).unwrap();
        let back = to_cartesian(&xred, rprim, acell).unwrap();

        for (a, b) in xcart.iter().zip(&back) {
            for k in 0..3 {
                assert_relative_eq!(a[k], b[k], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_non_symmetric_rprim_uses_rows() {
        // xred (0, 1, 0) picks row 1; multiplying by columns would give (0, 1, 0).
        let rprim = [[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let out = convert(CoordMode::Xcart, &[[0.0, 1.0, 0.0]], rprim, [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out[0], [0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_singular_rprim() {
        let flat = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let err = to_reduced(&[[1.0, 1.0, 1.0]], flat, [1.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, FlpzError::InvalidLattice { .. }));
    }

    #[test]
    fn test_parsers() {
        let rprim = parse_rprim("1 0 0  0 1 0  0 0 1").unwrap();
        assert_eq!(rprim[1], [0.0, 1.0, 0.0]);
        assert!(parse_rprim("1 0 0 0 1 0 0 0").is_err());
        assert!(parse_rprim("1 0 0 0 1 0 0 0 x").is_err());

        let coords = parse_coords("0 0 0 0.5 0.5 0.5", 2).unwrap();
        assert_eq!(coords[1], [0.5, 0.5, 0.5]);
        assert!(parse_coords("0 0 0 0.5 0.5", 2).is_err());

        assert_eq!("XRED".parse::<CoordMode>().unwrap(), CoordMode::Xred);
        assert!("polar".parse::<CoordMode>().is_err());
    }

    #[test]
    fn test_format_rows() {
        let out = format_rows(&[[0.5, 0.0, -0.25]]);
        assert_eq!(out.trim_end(), "0.5000000000 0.0000000000 -0.2500000000");
        assert!(out.len() >= 30);
    }
}
