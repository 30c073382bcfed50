//! CSV export of sweep results.

use crate::sweep::MergedSeries;
use std::io::Write;

/// Export a merged sweep to CSV, one row per variant and sweep point.
///
/// `points` labels the sweep axis; it must hold one entry per sweep point.
pub fn export_series_csv<P: std::fmt::Display>(
    path: &str,
    case: &str,
    points: &[P],
    series: &MergedSeries,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_series_csv(&mut file, case, points, series)
}

pub fn write_series_csv<W: Write, P: std::fmt::Display>(
    out: &mut W,
    case: &str,
    points: &[P],
    series: &MergedSeries,
) -> std::io::Result<()> {
    if points.len() != series.points() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "{} sweep point label(s) for {} measured point(s)",
                points.len(),
                series.points()
            ),
        ));
    }

    writeln!(out, "case,variant,compiler,point,n,mean_ms,std_ms,se_ms")?;

    for (label, results) in series.iter() {
        let compiler = if label.starts_with("C ") {
            crate::utils::C_COMPILER_NAME.unwrap_or("Unknown")
        } else {
            ""
        };

        for (point, result) in points.iter().zip(results) {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{}",
                quoted(case),
                quoted(label),
                quoted(compiler),
                quoted(&point.to_string()),
                result.n(),
                result.mean(),
                result.std(),
                result.se()
            )?;
        }
    }

    Ok(())
}

/// Quote a text field, doubling embedded quotes (RFC 4180).
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
