//! Rendering and persisting solution traces.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{Float, Result, Trace};

const HEADERS: [&str; 3] = ["i", "x", "y"];
const MIN_PADDING: usize = 2;

/// Render `trace` as a plain-text table with `i`, `x` and `y` columns.
///
/// Abscissas and ordinates are printed with `decimals` fractional digits. Columns are right
/// aligned, separated by two spaces and underlined by a dashed rule.
///
/// ```
/// let trace = refine_ode::method::euler(&|_x: f64, y: f64| y, 0., 1., 0.5, 1.).unwrap();
/// let expected = "\
/// \x20 i      x      y
/// ---  -----  -----
/// \x20 0  0.000  1.000
/// \x20 1  0.500  1.500
/// \x20 2  1.000  2.250";
/// assert_eq!(refine_ode::output::render_table(&trace, 3), expected);
/// ```
pub fn render_table<F: Float>(trace: &Trace<F>, decimals: usize) -> String {
    let rows: Vec<[String; 3]> = trace
        .samples()
        .map(|sample| {
            [
                sample.index.to_string(),
                format!("{:.*}", decimals, sample.x),
                format!("{:.*}", decimals, sample.y),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.len() + MIN_PADDING);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_line = |cells: [&str; 3]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:>width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_line(HEADERS));
    lines.push(
        widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        lines.push(format_line([&row[0], &row[1], &row[2]]));
    }
    lines.join("\n")
}

/// Write the table produced by [`render_table`] to `path`, creating parent directories.
pub fn write_table<F: Float>(path: &Path, trace: &Trace<F>, decimals: usize) -> Result<()> {
    create_parent(path)?;
    let mut file = fs::File::create(path)?;
    file.write_all(render_table(trace, decimals).as_bytes())?;
    Ok(())
}

/// Write `trace` to `path` as CSV with an `i,x,y` header.
pub fn write_csv<F: Float>(path: &Path, trace: &Trace<F>, decimals: usize) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for sample in trace.samples() {
        writer.write_record([
            sample.index.to_string(),
            format!("{:.*}", decimals, sample.x),
            format!("{:.*}", decimals, sample.y),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}
