//! Report rendering
//!
//! Presentation only: the aggregate rows arrive already ordered and the
//! row cap is applied to that order without reordering anything.

use crate::config::OutputFormat;
use crate::record::AggregateResult;

const HEADERS: [&str; 3] = ["genre", "year", "avg_rating"];

/// Format a rating the way a double prints: always at least one decimal.
pub fn format_rating(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// First `limit` rows, or all rows when `limit == 0`.
pub fn take_top(rows: &[AggregateResult], limit: usize) -> &[AggregateResult] {
    if limit == 0 || limit >= rows.len() {
        rows
    } else {
        &rows[..limit]
    }
}

/// Render `rows` in `format`, showing at most `limit` rows (0 = all).
pub fn render(
    rows: &[AggregateResult],
    format: OutputFormat,
    limit: usize,
) -> Result<String, serde_json::Error> {
    let shown = take_top(rows, limit);
    Ok(match format {
        OutputFormat::Table => render_table(shown, rows.len()),
        OutputFormat::Json => serde_json::to_string_pretty(shown)?,
        OutputFormat::Csv => render_csv(shown),
    })
}

fn render_table(shown: &[AggregateResult], total: usize) -> String {
    let cells: Vec<[String; 3]> = shown
        .iter()
        .map(|r| [r.genre.clone(), r.year.to_string(), format_rating(r.avg_rating)])
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let separator = {
        let parts: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        format!("+{}+\n", parts.join("+"))
    };
    let line = |values: [&str; 3]| {
        let parts: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(v, w)| format!("{v:>w$}"))
            .collect();
        format!("|{}|\n", parts.join("|"))
    };

    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&line(HEADERS));
    out.push_str(&separator);
    for row in &cells {
        out.push_str(&line([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }
    out.push_str(&separator);
    if shown.len() < total {
        out.push_str(&format!("only showing top {} rows\n", shown.len()));
    }
    out
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_csv(shown: &[AggregateResult]) -> String {
    let mut out = HEADERS.join(",");
    out.push('\n');
    for r in shown {
        out.push_str(&format!(
            "{},{},{}\n",
            escape_csv_field(&r.genre),
            r.year,
            format_rating(r.avg_rating)
        ));
    }
    out
}
