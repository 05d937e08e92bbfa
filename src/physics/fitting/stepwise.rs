use log::{debug, info};

use crate::error::{FlpzError, Result};
use crate::physics::fitting::least_squares::{metrics, solve_columns};
use crate::physics::fitting::terms::{partition, Axis, Term};
use crate::physics::fitting::ScatterData;

/// Tolerances for the constant-axis filter
const FILTER_ATOL: f64 = 1e-6;
const FILTER_RTOL: f64 = 1e-5;

/// One stage of a stepwise single-axis fit: the first `powers.len()` powers
/// plus a constant.
#[derive(Clone, Debug)]
pub struct AxisStep {
    pub powers: Vec<u32>,
    pub coefficients: Vec<f64>,
    pub constant: f64,
    pub mse: f64,
    pub r2: f64,
}

impl AxisStep {
    pub fn eval(&self, t: f64) -> f64 {
        self.powers
            .iter()
            .zip(&self.coefficients)
            .map(|(&p, c)| c * t.powi(p as i32))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Clone, Debug)]
pub struct AxisFit {
    pub axis: Axis,
    /// Filtered samples used for this axis.
    pub coords: Vec<f64>,
    pub values: Vec<f64>,
    pub steps: Vec<AxisStep>,
}

impl AxisFit {
    pub fn final_step(&self) -> Option<&AxisStep> {
        self.steps.last()
    }

    /// Terms and coefficients of the last step (the constant is not a term).
    pub fn terms(&self) -> Vec<(Term, f64)> {
        let Some(step) = self.final_step() else {
            return Vec::new();
        };
        step.powers
            .iter()
            .zip(&step.coefficients)
            .map(|(&p, &c)| {
                let t = match self.axis {
                    Axis::X => Term::x(p),
                    Axis::Y => Term::y(p),
                };
                (t, c)
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct SurfaceFit {
    pub terms: Vec<Term>,
    pub coefficients: Vec<f64>,
    pub mse: f64,
    pub r2: f64,
}

impl SurfaceFit {
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.terms
            .iter()
            .zip(&self.coefficients)
            .map(|(t, c)| c * t.eval(x, y))
            .sum()
    }
}

#[derive(Clone, Debug)]
pub struct FitReport {
    pub scaled: ScatterData,
    pub x_fit: AxisFit,
    pub y_fit: AxisFit,
    pub surface: SurfaceFit,
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= FILTER_ATOL + FILTER_RTOL * b.abs()
}

/// Samples lying on the line where the other coordinate is at its minimum.
pub fn filter_constant_axis(data: &ScatterData, axis: Axis) -> (Vec<f64>, Vec<f64>) {
    let (free, fixed) = match axis {
        Axis::X => (&data.x, &data.y),
        Axis::Y => (&data.y, &data.x),
    };
    let min = fixed.iter().copied().fold(f64::INFINITY, f64::min);

    fixed
        .iter()
        .zip(free)
        .zip(&data.z)
        .filter(|((f, _), _)| is_close(**f, min))
        .map(|((_, &c), &z)| (c, z))
        .unzip()
}

/// Fit `z(t) = sum c_i t^p_i + c0`, adding one power per step.
pub fn stepwise_axis_fit(coords: Vec<f64>, values: Vec<f64>, powers: &[u32], axis: Axis) -> Result<AxisFit> {
    let mut steps = Vec::with_capacity(powers.len());

    for step in 1..=powers.len() {
        let current = &powers[..step];

        let mut columns: Vec<Vec<f64>> = current
            .iter()
            .map(|&p| coords.iter().map(|t| t.powi(p as i32)).collect())
            .collect();
        columns.push(vec![1.0; coords.len()]);

        let mut coeffs = solve_columns(&columns, &values)?;
        let constant = coeffs.pop().unwrap_or(0.0);

        let mut fit = AxisStep {
            powers: current.to_vec(),
            coefficients: coeffs,
            constant,
            mse: 0.0,
            r2: 0.0,
        };
        let predicted: Vec<f64> = coords.iter().map(|&t| fit.eval(t)).collect();
        let (mse, r2) = metrics(&values, &predicted);
        fit.mse = mse;
        fit.r2 = r2;

        info!(
            "2D step {}: terms up to {}^{}, MSE {:.6e}, R² {:.6}",
            step,
            axis.label(),
            current[step - 1],
            mse,
            r2
        );
        steps.push(fit);
    }

    Ok(AxisFit {
        axis,
        coords,
        values,
        steps,
    })
}

/// Fit the coupled terms on all samples with the uncoupled coefficients held fixed.
pub fn coupled_fit(data: &ScatterData, fixed: &[(Term, f64)], coupled: &[Term]) -> Result<SurfaceFit> {
    let fixed_part: Vec<f64> = data
        .x
        .iter()
        .zip(&data.y)
        .map(|(&x, &y)| fixed.iter().map(|(t, c)| c * t.eval(x, y)).sum())
        .collect();

    let residual: Vec<f64> = data.z.iter().zip(&fixed_part).map(|(z, f)| z - f).collect();

    let columns: Vec<Vec<f64>> = coupled
        .iter()
        .map(|t| data.x.iter().zip(&data.y).map(|(&x, &y)| t.eval(x, y)).collect())
        .collect();
    let coupled_coeffs = solve_columns(&columns, &residual)?;

    let mut terms: Vec<Term> = fixed.iter().map(|(t, _)| *t).collect();
    let mut coefficients: Vec<f64> = fixed.iter().map(|(_, c)| *c).collect();
    terms.extend_from_slice(coupled);
    coefficients.extend(coupled_coeffs);

    let mut fit = SurfaceFit {
        terms,
        coefficients,
        mse: 0.0,
        r2: 0.0,
    };
    let predicted: Vec<f64> = data.x.iter().zip(&data.y).map(|(&x, &y)| fit.eval(x, y)).collect();
    let (mse, r2) = metrics(&data.z, &predicted);
    fit.mse = mse;
    fit.r2 = r2;
    Ok(fit)
}

/// Full pipeline: scale, per-axis stepwise fits, coupled fit.
pub fn fit_surface(data: &ScatterData, terms: &[Term]) -> Result<FitReport> {
    if data.is_empty() {
        return Err(FlpzError::EmptyInput("fit data".to_string()));
    }

    let scaled = data.min_max_scaled()?;
    let (x_terms, y_terms, coupled) = partition(terms);
    debug!("X terms {:?}, Y terms {:?}, coupled {:?}", x_terms, y_terms, coupled);

    let x_powers: Vec<u32> = x_terms.iter().filter_map(|t| t.power_along(Axis::X)).collect();
    let y_powers: Vec<u32> = y_terms.iter().filter_map(|t| t.power_along(Axis::Y)).collect();

    let (xs, zx) = filter_constant_axis(&scaled, Axis::X);
    let x_fit = stepwise_axis_fit(xs, zx, &x_powers, Axis::X)?;
    let (ys, zy) = filter_constant_axis(&scaled, Axis::Y);
    let y_fit = stepwise_axis_fit(ys, zy, &y_powers, Axis::Y)?;

    let mut fixed = x_fit.terms();
    fixed.extend(y_fit.terms());
    let surface = coupled_fit(&scaled, &fixed, &coupled)?;

    info!("3D fit: MSE {:.6e}, R² {:.6}", surface.mse, surface.r2);

    Ok(FitReport {
        scaled,
        x_fit,
        y_fit,
        surface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Grid on [0, 1]^2 sampled from a known polynomial.
    fn grid(f: impl Fn(f64, f64) -> f64) -> ScatterData {
        let mut data = ScatterData::default();
        for i in 0..=10 {
            for j in 0..=10 {
                let x = i as f64 / 10.0;
                let y = j as f64 / 10.0;
                data.x.push(x);
                data.y.push(y);
                data.z.push(f(x, y));
            }
        }
        data
    }

    #[test]
    fn test_filter_constant_axis() {
        let data = grid(|x, y| x + y);
        let (xs, zs) = filter_constant_axis(&data, Axis::X);
        assert_eq!(xs.len(), 11);
        // y == 0 on this line, so z == x
        for (x, z) in xs.iter().zip(&zs) {
            assert_eq!(x, z);
        }
    }

    #[test]
    fn test_stepwise_recovers_polynomial() {
        let coords: Vec<f64> = (0..20).map(|i| i as f64 / 19.0).collect();
        let values: Vec<f64> = coords.iter().map(|t| 2.0 * t * t - 0.5 * t.powi(4) + 0.1).collect();

        let fit = stepwise_axis_fit(coords, values, &[2, 4], Axis::X).unwrap();
        assert_eq!(fit.steps.len(), 2);
        assert!(fit.steps[0].r2 < 1.0);

        let last = fit.final_step().unwrap();
        assert_relative_eq!(last.coefficients[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(last.coefficients[1], -0.5, epsilon = 1e-8);
        assert_relative_eq!(last.constant, 0.1, epsilon = 1e-8);
        assert_relative_eq!(last.r2, 1.0, epsilon = 1e-10);

        let terms = fit.terms();
        assert_eq!(terms[0].0, Term::x(2));
        assert_eq!(terms[1].0, Term::x(4));
    }

    #[test]
    fn test_fit_surface_end_to_end() {
        // Already on [0, 1] with z spanning [0, 1] so scaling is the identity.
        let data = grid(|x, y| 0.25 * x * x + 0.25 * y * y + 0.5 * x * x * y * y);
        let terms = vec![Term::x(2), Term::y(2), Term::xy(2, 2)];

        let report = fit_surface(&data, &terms).unwrap();
        assert_eq!(report.surface.terms, vec![Term::x(2), Term::y(2), Term::xy(2, 2)]);

        let c = &report.surface.coefficients;
        assert_relative_eq!(c[0], 0.25, epsilon = 1e-8);
        assert_relative_eq!(c[1], 0.25, epsilon = 1e-8);
        assert_relative_eq!(c[2], 0.5, epsilon = 1e-8);
        assert!(report.surface.mse < 1e-15);
        assert_relative_eq!(report.surface.eval(1.0, 1.0), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_no_coupled_terms() {
        let data = grid(|x, y| 0.5 * x * x + 0.5 * y);
        let report = fit_surface(&data, &[Term::x(2), Term::y(1)]).unwrap();
        assert_eq!(report.surface.terms.len(), 2);
        assert_relative_eq!(report.surface.r2, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_too_few_points() {
        let coords = vec![0.0, 1.0];
        let values = vec![0.0, 1.0];
        assert!(stepwise_axis_fit(coords, values, &[1, 2], Axis::X).is_err());
    }
}
