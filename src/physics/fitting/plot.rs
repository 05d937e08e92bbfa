// src/physics/fitting/plot.rs

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{FlpzError, Result};
use crate::physics::fitting::stepwise::{AxisFit, SurfaceFit};
use crate::physics::fitting::ScatterData;
use crate::utils::report::{format_equation, sci};

const CURVE_SAMPLES: usize = 200;
const SURFACE_SAMPLES: usize = 40;

fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { 0.05 * (hi - lo) } else { 0.5 };
    (lo - pad)..(hi + pad)
}

// --- Shared drawing logic, usable with any backend ---

fn draw_axis_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fit: &AxisFit,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let step = fit.final_step().ok_or("axis fit has no steps")?;

    let x_range = padded_range(fit.coords.iter().copied());
    let curve: Vec<(f64, f64)> = (0..=CURVE_SAMPLES)
        .map(|i| {
            let t = x_range.start + (x_range.end - x_range.start) * i as f64 / CURVE_SAMPLES as f64;
            (t, step.eval(t))
        })
        .collect();
    let y_range = padded_range(fit.values.iter().copied().chain(curve.iter().map(|p| p.1)));

    let label = fit.axis.label();
    let mut chart = ChartBuilder::on(root)
        .caption(format!("2D Polynomial Fit for {}-axis", label), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(label)
        .y_desc("Z")
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    chart
        .draw_series(
            fit.coords
                .iter()
                .zip(&fit.values)
                .map(|(&x, &z)| Circle::new((x, z), 3, BLUE.filled())),
        )?
        .label("Data points")
        .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

    chart
        .draw_series(LineSeries::new(curve, &RED))?
        .label("Fitted curve")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    let terms: Vec<String> = step.powers.iter().map(|p| format!("{}^{}", label.to_lowercase(), p)).collect();
    let mut equation = format_equation(&step.coefficients, &terms);
    equation.push_str(&format!(" + {}", sci(step.constant)));

    let style = TextStyle::from(("sans-serif", 13).into_font()).color(&BLACK);
    root.draw_text(&equation, &style, (80, 50))?;

    Ok(())
}

fn draw_surface_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ScatterData,
    surface: &SurfaceFit,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let grid: Vec<f64> = (0..=SURFACE_SAMPLES)
        .map(|i| i as f64 / SURFACE_SAMPLES as f64)
        .collect();
    let fitted = grid
        .iter()
        .flat_map(|&x| grid.iter().map(move |&y| (x, y)))
        .map(|(x, y)| surface.eval(x, y));
    let z_range = padded_range(data.z.iter().copied().chain(fitted));

    let mut chart = ChartBuilder::on(root)
        .caption("Polynomial Surface Fit", ("sans-serif", 20))
        .margin(20)
        .build_cartesian_3d(0.0..1.0, z_range, 0.0..1.0)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.35;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart.configure_axes().draw()?;

    // Chart axes are (x, z, y): plotters draws the second coordinate upward.
    chart.draw_series(
        SurfaceSeries::xoz(grid.iter().copied(), grid.iter().copied(), |x, y| surface.eval(x, y))
            .style(BLUE.mix(0.25).filled()),
    )?;

    chart.draw_series(
        data.x
            .iter()
            .zip(&data.y)
            .zip(&data.z)
            .map(|((&x, &y), &z)| Circle::new((x, z, y), 2, RED.filled())),
    )?;

    let terms: Vec<String> = surface.terms.iter().map(|t| t.to_string()).collect();
    let equation = format_equation(&surface.coefficients, &terms);
    let style = TextStyle::from(("sans-serif", 13).into_font()).color(&BLACK);
    root.draw_text(&equation, &style, (20, 40))?;

    Ok(())
}

// --- File export ---

pub fn save_axis_plot(path: &Path, fit: &AxisFit) -> Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| FlpzError::Plot(e.to_string()))?;
    draw_axis_chart(&root, fit).map_err(|e| FlpzError::Plot(e.to_string()))?;
    root.present().map_err(|e| FlpzError::Plot(e.to_string()))
}

pub fn save_surface_plot(path: &Path, data: &ScatterData, surface: &SurfaceFit) -> Result<()> {
    let root = BitMapBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| FlpzError::Plot(e.to_string()))?;
    draw_surface_chart(&root, data, surface).map_err(|e| FlpzError::Plot(e.to_string()))?;
    root.present().map_err(|e| FlpzError::Plot(e.to_string()))
}
