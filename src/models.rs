//! Data models for the touch log.
//!
//! This module contains the core data structures used throughout
//! the application for representing touch points, their categorical
//! columns, and the summaries derived from them.

use crate::error::BodymapError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Contact direction, relative to the participant who logged the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The participant touched someone else.
    Touched,
    /// The participant was touched by someone else.
    TouchedBy,
}

impl Direction {
    /// Human-readable label used in panel titles and the report.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Touched => "I touched",
            Direction::TouchedBy => "I was touched",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Direction {
    type Err = BodymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "touched" => Ok(Direction::Touched),
            "touched_by" => Ok(Direction::TouchedBy),
            other => Err(BodymapError::UnknownDirection(other.to_string())),
        }
    }
}

/// A single touch observation.
///
/// Every field is required; unknown extra fields in the input are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    /// Participant or session identifier.
    pub participant_id: String,
    /// Body-region grouping; also names the background image.
    pub figure: String,
    /// Nature of the touch (pat, stroke, ...).
    pub contact_type: String,
    /// Raw direction value; parsed into [`Direction`] when a label is needed.
    pub direction: String,
    /// Horizontal position, 0 = left edge.
    pub x_norm: f64,
    /// Vertical position, 0 = top edge.
    pub y_norm: f64,
    /// Certainty of the observation.
    pub confidence: f64,
}

impl TouchPoint {
    /// Value of a categorical column.
    pub fn category(&self, column: Column) -> &str {
        match column {
            Column::ParticipantId => &self.participant_id,
            Column::Figure => &self.figure,
            Column::ContactType => &self.contact_type,
            Column::Direction => &self.direction,
        }
    }
}

/// Categorical columns of the point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ParticipantId,
    Figure,
    ContactType,
    Direction,
}

impl Column {
    /// Column name as used in the input file.
    pub fn name(&self) -> &'static str {
        match self {
            Column::ParticipantId => "participantId",
            Column::Figure => "figure",
            Column::ContactType => "contactType",
            Column::Direction => "direction",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Count of points carrying one direction value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionCount {
    pub direction: Direction,
    pub label: String,
    pub count: usize,
}

/// Mean confidence of one contact type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceMean {
    pub contact_type: String,
    pub mean: f64,
}

/// Unique values of the categorical columns, in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniqueValues {
    pub participants: Vec<String>,
    pub figures: Vec<String>,
    pub contact_types: Vec<String>,
    pub directions: Vec<String>,
}

/// Summary statistics of a touch log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Total number of points.
    pub total_points: usize,
    /// Unique categorical values.
    pub unique: UniqueValues,
    /// Points per contact type, most frequent first.
    pub contact_type_counts: Vec<(String, usize)>,
    /// Points per direction, first-seen order.
    pub direction_counts: Vec<DirectionCount>,
    /// Mean confidence per contact type, sorted by contact type.
    pub mean_confidence: Vec<ConfidenceMean>,
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Input file that was analyzed.
    pub input: String,
    /// When the summary was generated.
    pub generated_at: DateTime<Utc>,
    /// Tool version.
    pub version: String,
}

/// Machine-readable summary written by `--summary-json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub metadata: RunMetadata,
    pub statistics: Statistics,
    /// Images written during the run.
    pub images: Vec<String>,
}
