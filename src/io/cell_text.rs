// src/io/cell_text.rs
//
// Plain whitespace format:
//
//   # comment
//   0 7 0          <- three lattice rows
//   0 0 7
//   7 0 0
//   Ca 0 0 0       <- atoms, fractional, label optional
//   0.5 0.5 0.5

use crate::error::{FlpzError, Result};
use crate::model::{Atom, Cell};

fn numbers(fields: &[&str], line_no: usize) -> Result<[f64; 3]> {
    if fields.len() != 3 {
        return Err(FlpzError::MalformedInput(format!(
            "line {}: expected 3 numbers, got {}",
            line_no,
            fields.len()
        )));
    }
    let mut v = [0.0; 3];
    for (slot, f) in v.iter_mut().zip(fields) {
        *slot = f.parse().map_err(|_| {
            FlpzError::MalformedInput(format!("line {}: '{}' is not a number", line_no, f))
        })?;
    }
    Ok(v)
}

pub fn parse_str(text: &str) -> Result<Cell> {
    let mut rows = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.split('#').next().unwrap_or("").trim()))
        .filter(|(_, l)| !l.is_empty());

    let mut lattice = [[0.0; 3]; 3];
    for row in lattice.iter_mut() {
        let (n, line) = rows.next().ok_or_else(|| {
            FlpzError::MalformedInput("cell needs three lattice rows".to_string())
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        *row = numbers(&fields, n)?;
    }

    let mut atoms = Vec::new();
    for (n, line) in rows {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let labelled = fields
            .first()
            .is_some_and(|f| f.chars().next().is_some_and(|c| c.is_alphabetic()));

        let atom = if labelled {
            Atom::new(fields[0], numbers(&fields[1..], n)?)
        } else {
            Atom::new("X", numbers(&fields, n)?)
        };
        atoms.push(atom);
    }

    Ok(Cell::new(lattice, atoms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_and_bare_rows() {
        let cell = parse_str(
            "# origin
             0 7 0
             0 0 7
             7 0 0
             Ca 0 0 0   # A site
             0.5 0.5 0.5
            ",
        )
        .unwrap();
        assert_eq!(cell.lattice[0], [0.0, 7.0, 0.0]);
        assert_eq!(cell.atoms.len(), 2);
        assert_eq!(cell.atoms[0].element, "Ca");
        assert_eq!(cell.atoms[1].element, "X");
        assert_eq!(cell.atoms[1].position, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_wrong_dimensionality() {
        let err = parse_str("1 0 0\n0 1 0\n0 0 1\nCa 0 0\n").unwrap_err();
        assert!(err.to_string().contains("line 4"));

        assert!(parse_str("1 0 0 0\n0 1 0\n0 0 1\n").is_err());
        assert!(parse_str("1 0 0\n0 1 0\n").is_err());
    }

    #[test]
    fn test_scientific_notation_is_not_a_label() {
        let cell = parse_str("1 0 0\n0 1 0\n0 0 1\n-1e-3 0 0\n").unwrap();
        assert_eq!(cell.atoms[0].element, "X");
    }
}
