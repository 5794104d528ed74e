//! Markdown summary generation
//!
//! Renders a `CrawlReport` as a human-readable markdown document.

use crate::output::stats::CrawlReport;
use crate::output::traits::ExportResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> ExportResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Catalog Harvest Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Category**: {}\n", report.category_url));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if report.is_success() { "completed" } else { "aborted" };
    md.push_str(&format!("- **Status**: {}\n", status));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Pages\n\n");
    md.push_str("| Planned | Visited | Skipped |\n");
    md.push_str("|---------|---------|---------|\n");
    md.push_str(&format!(
        "| {} | {} | {} |\n\n",
        report.pages_planned, report.pages_visited, report.pages_skipped
    ));

    md.push_str("## Products\n\n");
    md.push_str(&format!("- **Extracted**: {}\n", report.products_extracted));
    md.push_str(&format!("- **Failed**: {}\n\n", report.products_failed));

    if report.products_extracted > 0 {
        md.push_str("## Missing Fields\n\n");
        md.push_str("| Field | Records |\n");
        md.push_str("|-------|---------|\n");
        md.push_str(&format!("| Name | {} |\n", report.misses.name));
        md.push_str(&format!("| Brand | {} |\n", report.misses.brand));
        md.push_str(&format!("| Identifier | {} |\n", report.misses.identifier));
        md.push_str(&format!("| Price | {} |\n\n", report.misses.price));
    }

    md.push_str("## Export\n\n");
    match &report.export_path {
        Some(path) => {
            md.push_str(&format!("- **File**: {}\n", path.display()));
            md.push_str(&format!("- **Checkpoints**: {}\n\n", report.checkpoints));
        }
        None => md.push_str("No records were exported.\n\n"),
    }

    if let Some(error) = &report.error {
        md.push_str("## Error\n\n");
        md.push_str(&format!("```\n{}\n```\n", error));
    }

    md
}
