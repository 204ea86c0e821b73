//! Domain error types.
//!
//! Orchestration code uses `anyhow`; the failure kinds a caller may want
//! to match on are collected here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the load, aggregate and render stages.
#[derive(Debug, Error)]
pub enum BodymapError {
    /// The input JSON file does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not valid JSON or lacks the `data` array.
    #[error("failed to decode {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A point object is missing a field or has a field of the wrong type.
    #[error("invalid touch point at participant {participant}, timestamp '{timestamp}': {source}")]
    InvalidRecord {
        participant: usize,
        timestamp: String,
        #[source]
        source: serde_json::Error,
    },

    /// Direction value outside the fixed vocabulary.
    #[error("unknown direction '{0}' (expected 'touched' or 'touched_by')")]
    UnknownDirection(String),

    /// A histogram needs at least one bin per axis.
    #[error("histogram bin count must be at least 1")]
    InvalidBinCount,

    /// No categories to draw for a breakdown.
    #[error("nothing to render for the {0} breakdown: no touch points")]
    EmptyBreakdown(&'static str),

    /// Background image that exists but cannot be decoded.
    #[error("image error for {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Chart drawing or PNG encoding failed.
    #[error("failed to draw {}: {message}", .path.display())]
    Plot { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_direction_message() {
        let err = BodymapError::UnknownDirection("hugged".to_string());
        assert!(err.to_string().contains("'hugged'"));
    }

    #[test]
    fn test_input_not_found_message() {
        let err = BodymapError::InputNotFound(PathBuf::from("missing.json"));
        assert_eq!(err.to_string(), "input file not found: missing.json");
    }
}
