//! Cell-to-cell atom mapping and the small lattice utilities around it:
//! coordinate conversion, lattice canonicalization, vector angles and
//! stepwise polynomial surface fitting.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod physics;
pub mod utils;

pub use error::{FlpzError, Result};
pub use model::{Atom, Cell, Lattice};
pub use physics::operations::mapping::{
    map_atoms, map_atoms_observed, AtomMatch, MapOptions, MappingResult, MatchEvent, MatchPolicy,
};
