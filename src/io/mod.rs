// src/io/mod.rs
pub mod cell_text;
pub mod columns;
pub mod poscar;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use log::debug;

use crate::config::MapJob;
use crate::error::Result;
use crate::model::Cell;

/// Picks the parser from the file name: JSON, POSCAR/CONTCAR/.vasp, else plain text.
pub fn load_cell(path: &Path) -> Result<Cell> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let cell = if name.ends_with(".json") {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)?
    } else if name.contains("poscar") || name.contains("contcar") || name.ends_with(".vasp") {
        poscar::parse(path)?
    } else {
        cell_text::parse_str(&fs::read_to_string(path)?)?
    };

    debug!("Loaded {} atoms from {}", cell.atoms.len(), path.display());
    Ok(cell)
}

pub fn load_job(path: &Path) -> Result<MapJob> {
    let reader = BufReader::new(File::open(path)?);
    let job: MapJob = serde_json::from_reader(reader)?;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlpzError;

    fn scratch(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("flpz-io-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn test_dispatch_by_name() {
        let text = scratch("origin.cell", "1 0 0\n0 1 0\n0 0 1\nNa 0 0 0\n");
        assert_eq!(load_cell(&text).unwrap().atoms[0].element, "Na");

        let json = scratch(
            "origin.json",
            r#"{"lattice": [[1,0,0],[0,1,0],[0,0,1]], "atoms": [{"element": "Cl", "position": [0.5,0.5,0.5]}]}"#,
        );
        assert_eq!(load_cell(&json).unwrap().atoms[0].element, "Cl");

        let poscar = scratch("POSCAR", "x\n1\n1 0 0\n0 1 0\n0 0 1\nK\n1\nDirect\n0 0 0\n");
        assert_eq!(load_cell(&poscar).unwrap().atoms[0].element, "K");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_cell(Path::new("/nonexistent/flpz/cell.txt")).unwrap_err();
        assert!(matches!(err, FlpzError::Io(_)));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let p = scratch("broken.json", "{\"lattice\": [[1,0,0]]}");
        assert!(matches!(load_cell(&p), Err(FlpzError::MalformedInput(_))));
    }
}
