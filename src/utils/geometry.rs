// src/utils/geometry.rs

use crate::error::{FlpzError, Result};

/// Angle between two vectors of any (equal) dimension, in degrees.
pub fn angle_between(v1: &[f64], v2: &[f64]) -> Result<f64> {
    if v1.len() != v2.len() {
        return Err(FlpzError::MalformedInput(format!(
            "vectors have different dimensions ({} and {})",
            v1.len(),
            v2.len()
        )));
    }
    if v1.is_empty() {
        return Err(FlpzError::MalformedInput("empty vector".to_string()));
    }

    let u1 = normalize(v1)?;
    let u2 = normalize(v2)?;
    Ok(dot(&u1, &u2).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Parses `[1, 0, 0]` (JSON array literal) or plain `1 0 0` / `1,0,0`.
pub fn parse_vector(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<f64>>(trimmed).map_err(|e| {
            FlpzError::MalformedInput(format!("unable to parse vector {}: {}", trimmed, e))
        });
    }

    trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                FlpzError::MalformedInput(format!("unable to parse vector {}", trimmed))
            })
        })
        .collect()
}

// --- Internal Math Helpers ---

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(a: &[f64]) -> Result<Vec<f64>> {
    let l = dot(a, a).sqrt();
    if l == 0.0 || !l.is_finite() {
        return Err(FlpzError::MalformedInput(
            "angle is undefined for a zero-length vector".to_string(),
        ));
    }
    Ok(a.iter().map(|x| x / l).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_right_angle() {
        let a = angle_between(&[1.0, 0.0, 0.0], &[0.0, 2.0, 0.0]).unwrap();
        assert_relative_eq!(a, 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_and_antiparallel() {
        let same = angle_between(&[1.0, 1.0, 1.0], &[3.0, 3.0, 3.0]).unwrap();
        assert!(same.abs() < 1e-5);

        let opposite = angle_between(&[1.0, 2.0], &[-2.0, -4.0]).unwrap();
        assert_relative_eq!(opposite, 180.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_vector_is_an_error() {
        assert!(angle_between(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(angle_between(&[1.0, 0.0], &[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_parse_vector_forms() {
        assert_eq!(parse_vector("[1, 0, 0.5]").unwrap(), vec![1.0, 0.0, 0.5]);
        assert_eq!(parse_vector("1 0 0.5").unwrap(), vec![1.0, 0.0, 0.5]);
        assert_eq!(parse_vector(" 1,0, 0.5 ").unwrap(), vec![1.0, 0.0, 0.5]);
        assert!(parse_vector("[1, 0,").is_err());
        assert!(parse_vector("1 zero 0").is_err());
    }
}
