use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::error::{FlpzError, Result};

/// A monomial x^x_pow * y^y_pow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    pub x_pow: u32,
    pub y_pow: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

impl Term {
    pub fn x(p: u32) -> Self {
        Self { x_pow: p, y_pow: 0 }
    }

    pub fn y(p: u32) -> Self {
        Self { x_pow: 0, y_pow: p }
    }

    pub fn xy(px: u32, py: u32) -> Self {
        Self { x_pow: px, y_pow: py }
    }

    pub fn is_coupled(&self) -> bool {
        self.x_pow > 0 && self.y_pow > 0
    }

    /// The single-axis power, if this term depends on `axis` alone.
    pub fn power_along(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::X if self.x_pow > 0 && self.y_pow == 0 => Some(self.x_pow),
            Axis::Y if self.y_pow > 0 && self.x_pow == 0 => Some(self.y_pow),
            _ => None,
        }
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        x.powi(self.x_pow as i32) * y.powi(self.y_pow as i32)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.x_pow, self.y_pow) {
            (0, 0) => write!(f, "1"),
            (px, 0) => write!(f, "x^{}", px),
            (0, py) => write!(f, "y^{}", py),
            (px, py) => write!(f, "x^{}y^{}", px, py),
        }
    }
}

fn parse_factor(s: &str, var: char) -> Option<u32> {
    let rest = s.strip_prefix(var)?;
    if rest.is_empty() {
        return Some(1);
    }
    rest.strip_prefix('^')?.parse().ok()
}

impl FromStr for Term {
    type Err = FlpzError;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim().to_lowercase();
        let bad = || FlpzError::MalformedInput(format!("cannot parse polynomial term '{}'", s));

        if t == "1" {
            return Ok(Term::xy(0, 0));
        }

        let term = match t.find('y') {
            Some(0) => Term::y(parse_factor(&t, 'y').ok_or_else(bad)?),
            Some(idx) => Term::xy(
                parse_factor(&t[..idx], 'x').ok_or_else(bad)?,
                parse_factor(&t[idx..], 'y').ok_or_else(bad)?,
            ),
            None => Term::x(parse_factor(&t, 'x').ok_or_else(bad)?),
        };

        if term.x_pow == 0 && term.y_pow == 0 {
            return Err(bad());
        }
        Ok(term)
    }
}

pub fn parse_terms(text: &str) -> Result<Vec<Term>> {
    let terms: Vec<Term> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_>>()?;
    if terms.is_empty() {
        return Err(FlpzError::MalformedInput("no polynomial terms given".to_string()));
    }
    Ok(terms)
}

/// Splits into (x-only, y-only, coupled). Constant terms are dropped: every
/// single-axis fit already carries its own constant.
pub fn partition(terms: &[Term]) -> (Vec<Term>, Vec<Term>, Vec<Term>) {
    let mut x_terms = Vec::new();
    let mut y_terms = Vec::new();
    let mut coupled = Vec::new();

    for &t in terms {
        if t.is_coupled() {
            coupled.push(t);
        } else if t.power_along(Axis::X).is_some() {
            x_terms.push(t);
        } else if t.power_along(Axis::Y).is_some() {
            y_terms.push(t);
        } else {
            warn!("Ignoring constant term '{}'", t);
        }
    }
    (x_terms, y_terms, coupled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("x^2".parse::<Term>().unwrap(), Term::x(2));
        assert_eq!("y^4".parse::<Term>().unwrap(), Term::y(4));
        assert_eq!("x^2y^2".parse::<Term>().unwrap(), Term::xy(2, 2));
        assert_eq!("X^4Y^1".parse::<Term>().unwrap(), Term::xy(4, 1));
        assert_eq!("x".parse::<Term>().unwrap(), Term::x(1));
        assert_eq!("1".parse::<Term>().unwrap(), Term::xy(0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["z^2", "x^", "x^a", "x2", "y^2x^2", "x^0", ""] {
            assert!(bad.parse::<Term>().is_err(), "accepted '{}'", bad);
        }
        assert!(parse_terms("   ").is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for t in [Term::x(2), Term::y(6), Term::xy(2, 4)] {
            assert_eq!(t.to_string().parse::<Term>().unwrap(), t);
        }
    }

    #[test]
    fn test_partition() {
        let terms = parse_terms("x^2 y^2 x^4 y^4 x^2y^2 1").unwrap();
        let (xs, ys, coupled) = partition(&terms);
        assert_eq!(xs, vec![Term::x(2), Term::x(4)]);
        assert_eq!(ys, vec![Term::y(2), Term::y(4)]);
        assert_eq!(coupled, vec![Term::xy(2, 2)]);
    }

    #[test]
    fn test_eval() {
        assert_eq!(Term::xy(2, 1).eval(3.0, 2.0), 18.0);
        assert_eq!(Term::y(3).power_along(Axis::Y), Some(3));
        assert_eq!(Term::y(3).power_along(Axis::X), None);
    }
}
