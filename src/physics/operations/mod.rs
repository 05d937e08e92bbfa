pub mod conversion;
pub mod mapping;
pub mod rprim;
pub mod supercell;
