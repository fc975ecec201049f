//! Error types for gazetteer and dataset loading.

use std::path::PathBuf;

/// Load-time failures.
///
/// Unresolved mentions and exhausted sources are not errors; the pipeline
/// models them as `None` and a terminal playback state. Everything here
/// fails loudly before playback starts, so a bad input file can never
/// corrupt the ascending-timestamp invariant mid-stream.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index} is malformed: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Duplicate place '{0}' in gazetteer input")]
    DuplicatePlace(String),

    #[error("Gazetteer input contains no places")]
    EmptyGazetteer,
}

impl LoadError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        LoadError::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}
