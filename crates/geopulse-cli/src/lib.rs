//! Geopulse CLI library - testable functions and modules

pub mod config;

use anyhow::Result;
use chrono::{DateTime, Utc};
use geopulse_runtime::source::{DatasetFeed, EventSource};
use std::path::Path;

/// Summary of a validated alert dataset
#[derive(Debug)]
pub struct DatasetSummary {
    pub records: usize,
    pub span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub with_alert: usize,
}

/// Load and validate an alert dataset, failing on the first malformed record
pub fn check_dataset(path: &Path) -> Result<DatasetSummary> {
    let records = DatasetFeed::new(path).produce()?;
    let span = match (records.first(), records.last()) {
        (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
        _ => None,
    };
    let with_alert = records.iter().filter(|r| r.severity.is_some()).count();
    Ok(DatasetSummary {
        records: records.len(),
        span,
        with_alert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_check_dataset_summary() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"place": "Kyiv", "date": "2024-02-10T06:00:00Z", "alert": "red"}},
                {{"place": "Lviv", "date": "2024-02-09T12:00:00Z"}}
            ]"#
        )
        .unwrap();

        let summary = check_dataset(file.path()).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.with_alert, 1);
        let (first, last) = summary.span.unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_check_dataset_rejects_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"place": "Kyiv", "date": "not a date"}}]"#).unwrap();
        assert!(check_dataset(file.path()).is_err());
    }

    #[test]
    fn test_check_dataset_empty_is_valid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let summary = check_dataset(file.path()).unwrap();
        assert_eq!(summary.records, 0);
        assert!(summary.span.is_none());
    }
}
