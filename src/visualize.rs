use std::error::Error;
use std::fmt::Write;
use std::path::Path;

use plotters::prelude::*;

use crate::envs::GridLayout;
use crate::table::{PolicyTable, ValueFunction};

/// Customize the value grid rendering.
#[derive(Clone, Copy, Debug)]
pub struct ValueGridOptions {
    pub precision: usize,
    pub width: usize,
}

impl Default for ValueGridOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            width: 8,
        }
    }
}

/// One arrow per cell for the greedy action; blocked cells show their glyph.
pub fn render_policy_grid<G: GridLayout + ?Sized>(layout: &G, policy: &PolicyTable) -> String {
    let (rows, cols) = layout.shape();
    let mut out = String::new();
    for row in 0..rows {
        let line: String = (0..cols)
            .map(|col| {
                let state = row * cols + col;
                if layout.is_blocked(state) {
                    layout.cell(state)
                } else {
                    layout.action_symbol(policy.greedy_action(state))
                }
            })
            .flat_map(|symbol| [symbol, ' '])
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

pub fn render_value_grid<G: GridLayout + ?Sized>(layout: &G, values: &ValueFunction) -> String {
    render_value_grid_with_options(layout, values, ValueGridOptions::default())
}

pub fn render_value_grid_with_options<G: GridLayout + ?Sized>(
    layout: &G,
    values: &ValueFunction,
    options: ValueGridOptions,
) -> String {
    let (rows, cols) = layout.shape();
    let mut out = String::new();
    for row in 0..rows {
        for col in 0..cols {
            let _ = write!(
                out,
                "{:>width$.precision$}",
                values[row * cols + col],
                width = options.width,
                precision = options.precision
            );
        }
        out.push('\n');
    }
    out
}

/// State-per-line listing for models without a grid.
pub fn render_policy_table<F>(
    policy: &PolicyTable,
    values: &ValueFunction,
    action_name: F,
) -> String
where
    F: Fn(usize) -> &'static str,
{
    let mut out = String::new();
    for state in 0..policy.state_count() {
        let _ = writeln!(
            out,
            "state {state:>4}: {:<8} v = {:.4}",
            action_name(policy.greedy_action(state)),
            values[state]
        );
    }
    out
}

/// Smallest delta drawn on the log axis; exact zeros are clamped to it.
const DELTA_FLOOR: f64 = 1.0e-12;

/// Writes a PNG line chart of the evaluation delta per sweep.
pub fn plot_convergence(out: &Path, deltas: &[f64]) -> Result<(), Box<dyn Error>> {
    if deltas.is_empty() {
        return Err("no deltas to plot".into());
    }
    let max_delta = deltas.iter().cloned().fold(DELTA_FLOOR, f64::max) * 2.0;

    let root = BitMapBackend::new(out, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| format!("{e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Policy evaluation convergence", ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0..deltas.len(), (DELTA_FLOOR..max_delta).log_scale())
        .map_err(|e| format!("{e}"))?;

    chart
        .configure_mesh()
        .x_desc("Sweep")
        .y_desc("Delta")
        .y_label_formatter(&|v| format!("{v:.0e}"))
        .draw()
        .map_err(|e| format!("{e}"))?;

    chart
        .draw_series(LineSeries::new(
            deltas
                .iter()
                .enumerate()
                .map(|(sweep, delta)| (sweep, delta.max(DELTA_FLOOR))),
            &BLUE,
        ))
        .map_err(|e| format!("{e}"))?;

    root.present().map_err(|e| format!("{e}"))?;
    Ok(())
}
