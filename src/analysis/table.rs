//! Tabular view over touch points.

use crate::models::{Column, TouchPoint};

/// Ordered collection of touch points with column-wise access.
#[derive(Debug, Clone, Default)]
pub struct PointTable {
    rows: Vec<TouchPoint>,
}

impl PointTable {
    /// Build a table from flattened points.
    pub fn new(rows: Vec<TouchPoint>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TouchPoint] {
        &self.rows
    }

    /// Distinct values of a categorical column in first-seen order.
    pub fn unique(&self, column: Column) -> Vec<String> {
        unique_values(&self.rows, column)
    }

    /// Rows whose column equals `value`.
    pub fn filter_eq(&self, column: Column, value: &str) -> Vec<&TouchPoint> {
        self.rows
            .iter()
            .filter(|row| row.category(column) == value)
            .collect()
    }

    /// Partition rows by a categorical column, groups in first-seen order.
    pub fn group_by(&self, column: Column) -> Vec<(String, Vec<&TouchPoint>)> {
        let mut groups: Vec<(String, Vec<&TouchPoint>)> = Vec::new();

        for row in &self.rows {
            let key = row.category(column);
            match groups.iter_mut().find(|(value, _)| value == key) {
                Some((_, members)) => members.push(row),
                None => groups.push((key.to_string(), vec![row])),
            }
        }

        groups
    }
}

/// Distinct values of `column` across `rows`, first-seen order.
pub fn unique_values<'a, I>(rows: I, column: Column) -> Vec<String>
where
    I: IntoIterator<Item = &'a TouchPoint>,
{
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        let value = row.category(column);
        if !seen.iter().any(|v| v == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
