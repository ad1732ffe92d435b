//! Text and JSON rendering for domaincheck results.
//!
//! Result lines go to stdout, one per domain, with a status glyph and the
//! domain padded to a fixed column. Colors come from `console` and switch
//! themselves off when stdout is not a terminal.

use console::style;
use domaincheck_lib::{BatchReport, CheckStatus, VerdictRecord};
use std::fmt::Write as _;

/// Width of the domain column.
pub const DOMAIN_WIDTH: usize = 30;

/// One result line, without trailing newline.
pub fn format_result_line(record: &VerdictRecord) -> String {
    let padded = format!("{:<width$}", record.domain, width = DOMAIN_WIDTH);

    match record.status() {
        CheckStatus::Available => format!(
            "{} {} {}",
            style("✓").green().bold(),
            padded,
            style("AVAILABLE").green().bold()
        ),
        CheckStatus::Error => format!(
            "{} {} {} {}",
            style("?").yellow(),
            padded,
            style("ERROR:").yellow(),
            record.error.as_deref().unwrap_or_default()
        ),
        CheckStatus::Taken => format!(
            "{} {} {}",
            style("✗").red(),
            padded,
            style("TAKEN").red().bold()
        ),
    }
}

/// The closing summary block.
pub fn format_summary(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style("--- Summary ---").dim());
    let _ = write!(
        out,
        "Checked: {} | Available: {} | Taken: {} | Errors: {}",
        report.checked,
        style(report.available).green(),
        style(report.taken).red(),
        style(report.errors).yellow()
    );
    out
}

/// Print every result line, then the summary unless only available
/// domains were requested.
pub fn print_text(report: &BatchReport, only_available: bool) {
    for record in &report.results {
        if only_available && !record.available {
            continue;
        }
        println!("{}", format_result_line(record));
    }

    if !only_available {
        println!("{}", format_summary(report));
    }
}

/// Keep only available results and recount.
pub fn filter_available(report: &BatchReport) -> BatchReport {
    let results: Vec<VerdictRecord> = report
        .results
        .iter()
        .filter(|r| r.status() == CheckStatus::Available)
        .cloned()
        .collect();

    BatchReport {
        checked: results.len(),
        available: results.len(),
        taken: 0,
        errors: 0,
        results,
    }
}

/// Pretty-printed JSON, optionally filtered to available results.
pub fn format_json(
    report: &BatchReport,
    only_available: bool,
) -> Result<String, serde_json::Error> {
    if only_available {
        serde_json::to_string_pretty(&filter_available(report))
    } else {
        serde_json::to_string_pretty(report)
    }
}
