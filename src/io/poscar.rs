// src/io/poscar.rs

use std::fs;
use std::path::Path;

use crate::error::{FlpzError, Result};
use crate::model::{Atom, Cell};
use crate::utils::linalg::cart_to_frac;

fn bad(msg: &str) -> FlpzError {
    FlpzError::MalformedInput(format!("POSCAR: {}", msg))
}

fn parse_triple(line: &str, what: &str) -> Result<[f64; 3]> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(bad(&format!("invalid {} line '{}'", what, line.trim())));
    }
    let mut v = [0.0; 3];
    for k in 0..3 {
        v[k] = parts[k]
            .parse::<f64>()
            .map_err(|_| bad(&format!("invalid number '{}' in {} line", parts[k], what)))?;
    }
    Ok(v)
}

pub fn parse(path: &Path) -> Result<Cell> {
    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

/// VASP 5 (with element line) or VASP 4 (counts only, elements become "X").
/// Positions are returned fractional, whatever the file mode.
pub fn parse_str(text: &str) -> Result<Cell> {
    let mut lines = text.lines();

    let comment = lines.next().ok_or_else(|| bad("empty file"))?.trim().to_string();

    // Scale
    let scale_line = lines.next().ok_or_else(|| bad("unexpected EOF"))?;
    let scale: f64 = scale_line
        .trim()
        .parse()
        .map_err(|_| bad("invalid scale"))?;

    // Lattice
    let mut lattice = [[0.0; 3]; 3];
    for row in lattice.iter_mut() {
        let line = lines.next().ok_or_else(|| bad("missing lattice"))?;
        let v = parse_triple(line, "lattice")?;
        *row = [v[0] * scale, v[1] * scale, v[2] * scale];
    }

    // Elements & Counts
    let line6 = lines.next().ok_or_else(|| bad("missing elements"))?;
    let starts_alpha = line6
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic());
    let (element_names, counts_line): (Vec<String>, &str) = if starts_alpha {
        let counts = lines.next().ok_or_else(|| bad("missing counts"))?;
        (line6.split_whitespace().map(str::to_string).collect(), counts)
    } else {
        (Vec::new(), line6)
    };

    let counts: Vec<usize> = counts_line
        .split_whitespace()
        .map(|x| x.parse().map_err(|_| bad("invalid atom count")))
        .collect::<Result<_>>()?;

    // Mode (optional "Selective dynamics" first)
    let mut mode_line = lines.next().ok_or_else(|| bad("missing mode"))?;
    if mode_line.trim().to_lowercase().starts_with('s') {
        mode_line = lines.next().ok_or_else(|| bad("missing mode"))?;
    }
    let mode = mode_line.trim().to_lowercase();
    let is_direct = !(mode.starts_with('c') || mode.starts_with('k'));

    // Atoms
    let mut atoms = Vec::new();
    for (elem_idx, &count) in counts.iter().enumerate() {
        let elem_name = element_names
            .get(elem_idx)
            .cloned()
            .unwrap_or_else(|| "X".to_string());
        for _ in 0..count {
            let line = lines.next().ok_or_else(|| bad("missing atom position"))?;
            let mut p = parse_triple(line, "position")?;

            if !is_direct {
                let cart = [p[0] * scale, p[1] * scale, p[2] * scale];
                p = cart_to_frac(cart, lattice).ok_or_else(|| FlpzError::InvalidLattice {
                    which: "POSCAR".to_string(),
                    det: 0.0,
                })?;
            }

            atoms.push(Atom {
                element: elem_name.clone(),
                position: p,
            });
        }
    }

    let mut cell = Cell::new(lattice, atoms);
    cell.label = comment;
    Ok(cell)
}
