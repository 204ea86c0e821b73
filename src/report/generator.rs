//! Console and JSON report generation.
//!
//! The console report comes in two parts: the data summary printed right
//! after loading, and the statistics printed once every image is written.

use crate::models::{Statistics, SummaryReport, UniqueValues};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate the data summary printed before rendering.
pub fn generate_data_summary(total_points: usize, unique: &UniqueValues) -> String {
    let mut section = String::new();

    section.push_str("=== Data Summary ===\n");
    section.push_str(&format!("Total points recorded: {}\n", total_points));
    section.push_str(&format!("Participants: {}\n", format_values(&unique.participants)));
    section.push_str(&format!("Figures: {}\n", format_values(&unique.figures)));
    section.push_str(&format!(
        "Contact types: {}\n",
        format_values(&unique.contact_types)
    ));
    section.push_str(&format!("Directions: {}\n", format_values(&unique.directions)));

    section
}

/// Generate the statistics section printed after rendering.
pub fn generate_statistics(stats: &Statistics) -> String {
    let mut section = String::new();

    section.push_str("\n=== Statistics ===\n");

    section.push_str("\nContact Types:\n");
    for (contact_type, count) in &stats.contact_type_counts {
        section.push_str(&format!("  {}: {}\n", contact_type, count));
    }

    section.push_str("\nDirections:\n");
    for entry in &stats.direction_counts {
        section.push_str(&format!("  {}: {}\n", entry.label, entry.count));
    }

    section.push_str("\nAverage Confidence by Contact Type:\n");
    for entry in &stats.mean_confidence {
        section.push_str(&format!("  {}: {:.2}\n", entry.contact_type, entry.mean));
    }

    section
}

/// Render values as a bracketed, quoted list: `['arm' 'torso']`.
pub fn format_values(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
    format!("[{}]", quoted.join(" "))
}

/// Generate a JSON summary.
pub fn generate_json_summary(report: &SummaryReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON summary to a file.
pub fn write_json_summary(report: &SummaryReport, path: &Path) -> Result<()> {
    let content = generate_json_summary(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}
