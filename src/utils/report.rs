// src/utils/report.rs

use crate::model::Cell;
use crate::physics::fitting::{AxisFit, FitReport};
use crate::physics::operations::mapping::{AtomMatch, MappingResult, MatchEvent};

/// Scientific notation with a signed two-digit exponent: `1.234560e+00`.
pub fn sci(x: f64) -> String {
    let s = format!("{:.6e}", x);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let e: i32 = exp.parse().unwrap_or(0);
            let sign = if e < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, e.abs())
        }
        None => s,
    }
}

/// `z = c1t1 + c2t2 + ...`
pub fn format_equation(coefficients: &[f64], terms: &[String]) -> String {
    let body = coefficients
        .iter()
        .zip(terms)
        .map(|(c, t)| format!("{}{}", sci(*c), t))
        .collect::<Vec<_>>()
        .join(" + ");
    format!("z = {}", body)
}

/// Header lines for a cell (used before a mapping run)
pub fn cell_summary(cell: &Cell, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}: {} ({} atoms)\n", name, cell.formula(), cell.atoms.len()));
    for v in &cell.lattice {
        out.push_str(&format!("  {:>10.5} {:>10.5} {:>10.5}\n", v[0], v[1], v[2]));
    }
    out
}

/// One line per hit, 1-based on both sides.
pub fn match_trace(event: &MatchEvent) -> String {
    format!(
        "atom type {} matches in supercell atom {}",
        event.origin_index + 1,
        event.target_index + 1
    )
}

/// Plain array view: 1-based mapping (0 = unmatched) and displacement rows.
pub fn legacy_arrays(result: &MappingResult) -> String {
    let mapping = result
        .legacy_mapping()
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = format!("Mapping:\n[{}]\n\noutDiff:\n", mapping);
    for d in result.displacements() {
        out.push_str(&format!("[{:>12.8} {:>12.8} {:>12.8}]\n", d[0], d[1], d[2]));
    }
    out
}

/// Per-atom table. Unmatched atoms are spelled out instead of showing zeros.
pub fn mapping_table(result: &MappingResult, target: &Cell) -> String {
    let mut out = String::new();
    out.push_str("--------------------------------------------------------------------------\n");
    out.push_str(&format!(
        "{:<7} {:<7} {:<7} {:<7} {:<12} {:<26} {:<8}\n",
        "Target", "Element", "Origin", "Element", "Shift", "Displacement (Å)", "Dist"
    ));
    out.push_str("--------------------------------------------------------------------------\n");

    for (i, m) in result.matches.iter().enumerate() {
        let t_el = target.atoms.get(i).map_or("?", |a| a.element.as_str());
        match m {
            AtomMatch::Matched {
                origin_index,
                element,
                shift,
                displacement,
                distance,
                candidates,
            } => {
                let flag = if *candidates > 1 {
                    format!("  ({} candidates)", candidates)
                } else {
                    String::new()
                };
                out.push_str(&format!(
                    "{:<7} {:<7} {:<7} {:<7} {:<12} {:>8.4} {:>8.4} {:>8.4} {:<8.5}{}\n",
                    i + 1,
                    t_el,
                    origin_index + 1,
                    element,
                    format!("[{},{},{}]", shift[0], shift[1], shift[2]),
                    displacement[0],
                    displacement[1],
                    displacement[2],
                    distance,
                    flag
                ));
            }
            AtomMatch::Unmatched => {
                out.push_str(&format!("{:<7} {:<7} unmatched\n", i + 1, t_el));
            }
        }
    }

    let unmatched = result.unmatched().len();
    if unmatched > 0 {
        out.push_str(&format!("{} target atom(s) without a match.\n", unmatched));
    }
    out
}

fn axis_summary(fit: &AxisFit) -> String {
    let mut out = String::new();
    let label = fit.axis.label();
    for (i, step) in fit.steps.iter().enumerate() {
        let last = step.powers.last().copied().unwrap_or(0);
        out.push_str(&format!("2D Step {}: Fitting terms up to {}^{}\n", i + 1, label, last));
        out.push_str(&format!("MSE: {}\n", sci(step.mse)));
        out.push_str(&format!("R-squared: {:.6}\n\n", step.r2));
    }
    out
}

pub fn fit_summary(report: &FitReport) -> String {
    let mut out = String::new();
    out.push_str(&axis_summary(&report.x_fit));
    out.push_str(&axis_summary(&report.y_fit));

    let s = &report.surface;
    let terms: Vec<String> = s.terms.iter().map(|t| t.to_string()).collect();
    out.push_str("Final best fit:\n");
    out.push_str(&format!("Terms: {}\n", terms.join(", ")));
    out.push_str(&format!("{}\n", format_equation(&s.coefficients, &terms)));
    out.push_str(&format!("MSE: {}\n", sci(s.mse)));
    out.push_str(&format!("R-squared: {:.6}\n", s.r2));
    out
}
