// src/io/columns.rs

use std::fs;
use std::path::Path;

use crate::error::{FlpzError, Result};
use crate::physics::fitting::ScatterData;

pub fn load_scatter(path: &Path) -> Result<ScatterData> {
    let text = fs::read_to_string(path)?;
    parse_scatter(&text)
}

/// First three numeric columns of every non-comment row become x, y, z.
pub fn parse_scatter(text: &str) -> Result<ScatterData> {
    let mut data = ScatterData::default();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let values: Vec<f64> = line
            .split_whitespace()
            .map(|s| {
                s.parse::<f64>().map_err(|_| {
                    FlpzError::MalformedInput(format!("line {}: '{}' is not a number", i + 1, s))
                })
            })
            .collect::<Result<_>>()?;

        if values.len() < 3 {
            return Err(FlpzError::MalformedInput(format!(
                "line {}: need at least 3 columns, got {}",
                i + 1,
                values.len()
            )));
        }
        data.x.push(values[0]);
        data.y.push(values[1]);
        data.z.push(values[2]);
    }

    if data.is_empty() {
        return Err(FlpzError::EmptyInput("fit data file".to_string()));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scatter() {
        let data = parse_scatter("# x y z\n0 0 1.5\n1 0 2.5 7.0\n\n0 1 3\n").unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.z, vec![1.5, 2.5, 3.0]);
    }

    #[test]
    fn test_short_row() {
        assert!(parse_scatter("0 0\n").is_err());
        assert!(parse_scatter("# only comments\n").is_err());
    }
}
