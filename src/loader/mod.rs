//! Touch log loading and flattening.
//!
//! The input is a JSON object whose `data` array holds one entry per
//! participant: either `null` or an object mapping timestamp keys to
//! point objects. Loading parses the document; flattening walks it into
//! a flat list of validated [`TouchPoint`]s.

use crate::error::BodymapError;
use crate::models::TouchPoint;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Parsed input document, before per-point validation.
#[derive(Debug, Clone, Deserialize)]
pub struct TouchLog {
    /// One slot per participant; `None` for participants without data.
    pub data: Vec<Option<Map<String, Value>>>,
}

impl TouchLog {
    /// Number of participant slots, including empty ones.
    pub fn participant_slots(&self) -> usize {
        self.data.len()
    }

    /// Number of timestamp entries across all present participants.
    pub fn entry_count(&self) -> usize {
        self.data.iter().flatten().map(|entries| entries.len()).sum()
    }
}

/// Read and parse the document at `path`.
pub fn load_document(path: &Path) -> Result<TouchLog, BodymapError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BodymapError::InputNotFound(path.to_path_buf()),
        _ => BodymapError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    parse_document(&content).map_err(|source| BodymapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a document from a string.
pub fn parse_document(content: &str) -> Result<TouchLog, serde_json::Error> {
    serde_json::from_str(content)
}

/// Flatten the document into touch points.
///
/// Participants are visited in array order and timestamps in file order;
/// the timestamp keys themselves are dropped.
pub fn flatten(log: &TouchLog) -> Result<Vec<TouchPoint>, BodymapError> {
    let mut points = Vec::with_capacity(log.entry_count());

    for (participant, entries) in log.data.iter().enumerate() {
        let Some(entries) = entries else {
            debug!("Participant slot {} is empty, skipping", participant);
            continue;
        };

        for (timestamp, value) in entries {
            let point = TouchPoint::deserialize(value).map_err(|source| {
                BodymapError::InvalidRecord {
                    participant,
                    timestamp: timestamp.clone(),
                    source,
                }
            })?;
            points.push(point);
        }
    }

    Ok(points)
}

/// Load and flatten in one step.
pub fn load_points(path: &Path) -> Result<Vec<TouchPoint>, BodymapError> {
    let log = load_document(path)?;
    debug!(
        "Parsed {} participant slots from {}",
        log.participant_slots(),
        path.display()
    );

    let points = flatten(&log)?;
    info!("Loaded {} touch points from {}", points.len(), path.display());
    Ok(points)
}
