//! Text User Interface (TUI) utilities.
//!
//! Handles formatted output for the CLI.

use crate::catalog::{Suite, SuiteCatalog};
use crate::result::VariantResult;
use crate::sweep::{MergedSeries, ResultSet};
use terminal_size::{terminal_size, Width};

/// Get the current terminal width, constrained to a reasonable range
fn get_term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        (w as usize).clamp(40, 200)
    } else {
        80
    }
}

/// Truncate string with ellipsis if it exceeds width (character-wise)
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(width.saturating_sub(3)).collect();
        result.push_str("...");
        result
    }
}

/// Variant label with the C compiler appended for C variants
fn display_label(label: &str) -> String {
    match crate::utils::C_COMPILER_NAME {
        Some(compiler) if label.starts_with("C ") => format!("{} ({})", label, compiler),
        _ => label.to_string(),
    }
}

/// Print the application header
pub fn print_header() {
    let term_width = get_term_width().min(80);
    let title = " perfsuite ";
    let padding = term_width.saturating_sub(title.len() + 2) / 2;
    let right_padding = term_width.saturating_sub(padding + title.len());

    let border = "═".repeat(term_width);

    println!("╔{}╗", border);
    println!("║{}{}{}║", " ".repeat(padding), title, " ".repeat(right_padding));
    println!("╚{}╝", border);
    println!();
}

/// Print the list of available suites
pub fn print_available_suites(catalog: &SuiteCatalog) {
    println!("Available cases:");
    println!();
    for suite in catalog.all() {
        println!("  {:<20} - {}", suite.name(), suite.description());
        println!("  {:<20}   variants: {}", "", suite.variant_labels().join(", "));
    }
}

/// Print suite info box
pub fn print_suite_info_box(suite: &dyn Suite) {
    let term_width = get_term_width();
    let max_content_width = term_width.saturating_sub(4).max(40);

    let name_line = format!("Case:     {}", suite.name());
    let desc_line = suite.description();
    let var_line = format!("Variants: {}", suite.variant_labels().join(", "));

    let content_width = [name_line.len(), desc_line.len(), var_line.len()]
        .iter()
        .cloned()
        .max()
        .unwrap_or(60)
        .min(max_content_width);

    let border = "─".repeat(content_width + 2);

    println!("┌{}┐", border);
    println!("│ {:<width$} │", truncate(&name_line, content_width), width = content_width);
    println!("│ {:<width$} │", truncate(desc_line, content_width), width = content_width);
    println!("├{}┤", border);
    println!("│ {:<width$} │", truncate(&var_line, content_width), width = content_width);
    println!("└{}┘", border);
    println!();
}

/// Print the results of one case run, relative to the first variant
pub fn print_case_results(name: &str, results: &ResultSet) {
    println!("\x1b[31m {} \x1b[0m", name);

    let baseline = results.iter().next();
    for result in results {
        let relative = baseline.map(|b| result.relative_to(b)).unwrap_or(1.0);
        println!("\t{}  {:>7.2}x", result, relative);
    }
    println!();
}

/// Print each variant's mean at one sweep point divided by the baseline's mean
pub fn print_normalized(name: &str, baseline: &str, ratios: &[(&str, f64)]) {
    println!("\x1b[31m {} \x1b[0m (relative to {})", name, baseline);

    for (label, ratio) in ratios {
        println!("\t{:<28} {:>7.2}x", display_label(label), ratio);
    }
    println!();
}

fn format_cell(result: &VariantResult) -> String {
    format!("{:.3} ± {:.3}", result.mean(), result.se())
}

/// Print a sweep as a table: one row per sweep point, one column per variant.
/// Times are milliseconds, mean ± standard error.
pub fn print_series<P: std::fmt::Display>(points: &[P], series: &MergedSeries) {
    if series.is_empty() {
        return;
    }

    let labels: Vec<String> = series.labels().into_iter().map(display_label).collect();
    let term_width = get_term_width();
    let point_width = 12;
    let col_width = (term_width.saturating_sub(point_width + 2) / labels.len().max(1)).clamp(12, 24);
    let table_width = point_width + labels.len() * (col_width + 1);

    print!("  {:<p_width$}", "Point", p_width = point_width);
    for label in &labels {
        print!(" {:>c_width$}", truncate(label, col_width), c_width = col_width);
    }
    println!();
    println!("  {}", "─".repeat(table_width));

    for (idx, point) in points.iter().enumerate() {
        print!("  {:<p_width$}", truncate(&point.to_string(), point_width), p_width = point_width);
        for (_, results) in series.iter() {
            let cell = results.get(idx).map(format_cell).unwrap_or_default();
            print!(" {:>c_width$}", cell, c_width = col_width);
        }
        println!();
    }
    println!("  (ms, mean ± standard error)");
    println!();
}
