//! Mention records flowing through playback

use crate::place::LonLat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker color for records carrying no severity class.
pub const FALLBACK_COLOR: &str = "#555";

/// Severity class of an alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Red,
    Yellow,
    Green,
}

impl Severity {
    /// Marker color for this severity.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Red => "#E53",
            Severity::Yellow => "#F7B500",
            Severity::Green => "#2ecc71",
        }
    }

    /// Classify a free-text alert label. Labels outside the known set are
    /// not an error; they come back as `None` and render with
    /// [`FALLBACK_COLOR`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "red" => Some(Severity::Red),
            "yellow" => Some(Severity::Yellow),
            "green" => Some(Severity::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Red => write!(f, "red"),
            Severity::Yellow => write!(f, "yellow"),
            Severity::Green => write!(f, "green"),
        }
    }
}

/// Marker color for an optional severity.
pub fn severity_color(severity: Option<Severity>) -> &'static str {
    severity.map_or(FALLBACK_COLOR, |s| s.color())
}

/// A single timestamped place mention.
///
/// Produced by an event source, emitted by the playback scheduler, and
/// consumed by the resolver. Immutable after production; sources sort
/// records ascending by timestamp before handing them to playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Place text exactly as it appeared in the feed
    pub raw_text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Coordinates embedded in the source record, when the feed carries
    /// them (alert datasets do, synthetic mentions do not)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<LonLat>,
}

impl MentionRecord {
    pub fn new(raw_text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            raw_text: raw_text.into(),
            timestamp,
            severity: None,
            coords: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_coords(mut self, coords: LonLat) -> Self {
        self.coords = Some(coords);
        self
    }

    /// Marker color for this record's severity.
    pub fn color(&self) -> &'static str {
        severity_color(self.severity)
    }
}
