use serde::{Deserialize, Serialize};

use crate::error::{FlpzError, Result};
use crate::utils::linalg;

/// Lattice vectors as rows: [a_vec, b_vec, c_vec], in Angstrom.
pub type Lattice = [[f64; 3]; 3];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    // Fractional, in the basis of the owning cell. Not wrapped into [0, 1).
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: &str, position: [f64; 3]) -> Self {
        Self {
            element: element.to_string(),
            position,
        }
    }
}

/// An ordered atom set bound to its lattice. The order of `atoms` is the
/// index identity reported by the mapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub lattice: Lattice,
    pub atoms: Vec<Atom>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

impl Cell {
    pub fn new(lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Self {
            lattice,
            atoms,
            label: String::new(),
        }
    }

    /// Checks the invariants every operation on a cell relies on:
    /// a non-singular basis and at least one atom.
    pub fn validate(&self, which: &str) -> Result<()> {
        linalg::check_lattice(self.lattice, which)?;
        if self.atoms.is_empty() {
            return Err(FlpzError::EmptyInput(format!("{} cell", which)));
        }
        Ok(())
    }

    pub fn cartesian_positions(&self) -> Vec<[f64; 3]> {
        self.atoms
            .iter()
            .map(|a| linalg::frac_to_cart(a.position, self.lattice))
            .collect()
    }

    /// Element symbols in order of first appearance, with counts.
    pub fn composition(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for atom in &self.atoms {
            match counts.iter_mut().find(|(el, _)| *el == atom.element) {
                Some((_, n)) => *n += 1,
                None => counts.push((atom.element.clone(), 1)),
            }
        }
        counts
    }

    pub fn formula(&self) -> String {
        self.composition()
            .iter()
            .map(|(el, n)| format!("{}{}", el, n))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
