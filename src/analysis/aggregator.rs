//! Point aggregation and statistics.
//!
//! This module provides grouped counts and means over the point table
//! and assembles them into the run [`Statistics`].

use crate::analysis::table::PointTable;
use crate::error::BodymapError;
use crate::models::{
    Column, ConfidenceMean, Direction, DirectionCount, Statistics, TouchPoint, UniqueValues,
};
use std::collections::BTreeMap;

/// Count rows per distinct value, most frequent first.
///
/// Ties keep first-seen order.
pub fn value_counts(table: &PointTable, column: Column) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = table
        .group_by(column)
        .into_iter()
        .map(|(value, rows)| (value, rows.len()))
        .collect();

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts
}

/// Mean of a numeric field per group, sorted by group key and rounded to
/// two decimal places.
pub fn mean_by<F>(table: &PointTable, column: Column, value: F) -> Vec<(String, f64)>
where
    F: Fn(&TouchPoint) -> f64,
{
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for row in table.rows() {
        let entry = sums.entry(row.category(column)).or_insert((0.0, 0));
        entry.0 += value(row);
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, (sum, n))| (key.to_string(), round2(sum / n as f64)))
        .collect()
}

/// Mean confidence per contact type.
pub fn mean_confidence_by_contact_type(table: &PointTable) -> Vec<ConfidenceMean> {
    mean_by(table, Column::ContactType, |row| row.confidence)
        .into_iter()
        .map(|(contact_type, mean)| ConfidenceMean { contact_type, mean })
        .collect()
}

/// Points per direction in first-seen order.
///
/// Fails on the first direction outside the fixed vocabulary.
pub fn direction_counts(table: &PointTable) -> Result<Vec<DirectionCount>, BodymapError> {
    table
        .unique(Column::Direction)
        .into_iter()
        .map(|value| {
            let direction: Direction = value.parse()?;
            Ok(DirectionCount {
                direction,
                label: direction.label().to_string(),
                count: table.filter_eq(Column::Direction, &value).len(),
            })
        })
        .collect()
}

/// Unique values of the four categorical columns.
pub fn unique_summary(table: &PointTable) -> UniqueValues {
    UniqueValues {
        participants: table.unique(Column::ParticipantId),
        figures: table.unique(Column::Figure),
        contact_types: table.unique(Column::ContactType),
        directions: table.unique(Column::Direction),
    }
}

/// Compute all summary statistics for the table.
pub fn compute_statistics(table: &PointTable) -> Result<Statistics, BodymapError> {
    Ok(Statistics {
        total_points: table.len(),
        unique: unique_summary(table),
        contact_type_counts: value_counts(table, Column::ContactType),
        direction_counts: direction_counts(table)?,
        mean_confidence: mean_confidence_by_contact_type(table),
    })
}

/// Round to two decimal places, halves to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
