//! Event sources: synthetic mention feeds and static alert datasets
//!
//! Both sources produce the same record shape, sorted ascending by
//! timestamp; playback depends on that ordering and never re-sorts. A
//! produced sequence is not restartable; call `produce` again for a fresh
//! one.

use crate::error::LoadError;
use crate::gazetteer::Gazetteer;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use geopulse_core::{LonLat, MentionRecord, Severity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of synthetic mentions per run.
pub const DEFAULT_COUNT: usize = 1000;
/// Default trailing window the synthetic timestamps are spread over.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// A finite provider of playback-ready mention records.
pub trait EventSource {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Produce a fresh record sequence, sorted ascending by timestamp.
    fn produce(&mut self) -> Result<Vec<MentionRecord>, LoadError>;
}

/// Disposition of dataset records that fail validation at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Loading fails on the first malformed record
    #[default]
    Fail,
    /// Malformed records are dropped with a warning
    Skip,
}

/// Synthetic mention generator.
///
/// Draws places uniformly from the gazetteer and spreads timestamps
/// uniformly over a trailing window. A fixed seed reproduces the same
/// draw sequence (and therefore the same post-sort place order); the
/// timestamps themselves still anchor to the clock at produce time.
pub struct SyntheticFeed {
    gazetteer: Arc<Gazetteer>,
    count: usize,
    window: Duration,
    rng: StdRng,
}

impl SyntheticFeed {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            gazetteer,
            count: DEFAULT_COUNT,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl EventSource for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn produce(&mut self) -> Result<Vec<MentionRecord>, LoadError> {
        let places = self.gazetteer.places();
        let now = Utc::now();
        let window_ms = self.window.num_milliseconds().max(1);

        let mut records = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let place = &places[self.rng.gen_range(0..places.len())];
            let offset = Duration::milliseconds(self.rng.gen_range(0..window_ms));
            records.push(
                MentionRecord::new(place.display_name.to_string(), now - offset)
                    .with_severity(Severity::Red),
            );
        }
        records.sort_by_key(|r| r.timestamp);

        debug!("generated {} synthetic mentions", records.len());
        Ok(records)
    }
}

/// On-disk alert record.
///
/// `alert` stays a free-text label here: a label outside the known
/// severity set is not malformed, it is an unclassified record that
/// renders with the fallback color.
#[derive(Debug, Deserialize)]
struct AlertRecord {
    place: String,
    date: String,
    alert: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Loader for static alert datasets.
///
/// Accepts a single JSON array or JSON lines (one object per line).
/// Records are validated one at a time so the malformed policy can name
/// the offending index; the surviving records are sorted ascending by
/// timestamp regardless of file order.
pub struct DatasetFeed {
    path: PathBuf,
    policy: MalformedPolicy,
}

impl DatasetFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: MalformedPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl EventSource for DatasetFeed {
    fn name(&self) -> &str {
        "dataset"
    }

    fn produce(&mut self) -> Result<Vec<MentionRecord>, LoadError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let values = parse_values(&raw, &self.path)?;

        let mut records = Vec::with_capacity(values.len());
        let mut skipped = 0usize;
        for (index, value) in values.into_iter().enumerate() {
            match mention_from_value(index, value) {
                Ok(record) => records.push(record),
                Err(err) => match self.policy {
                    MalformedPolicy::Fail => return Err(err),
                    MalformedPolicy::Skip => {
                        warn!("skipping malformed record: {}", err);
                        skipped += 1;
                    }
                },
            }
        }

        // Defensive: playback depends on ascending timestamps
        records.sort_by_key(|r| r.timestamp);

        info!(
            "loaded {} alert records from {} ({} skipped)",
            records.len(),
            self.path.display(),
            skipped
        );
        Ok(records)
    }
}

fn parse_values(raw: &str, path: &Path) -> Result<Vec<serde_json::Value>, LoadError> {
    if raw.trim_start().starts_with('[') {
        serde_json::from_str(raw).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| LoadError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect()
    }
}

fn mention_from_value(index: usize, value: serde_json::Value) -> Result<MentionRecord, LoadError> {
    let record: AlertRecord = serde_json::from_value(value)
        .map_err(|err| LoadError::malformed(index, err.to_string()))?;
    if record.place.trim().is_empty() {
        return Err(LoadError::malformed(index, "missing place text"));
    }
    let timestamp = parse_date(&record.date).ok_or_else(|| {
        LoadError::malformed(index, format!("unparseable date '{}'", record.date))
    })?;

    let mut mention = MentionRecord::new(record.place, timestamp);
    if let Some(severity) = record.alert.as_deref().and_then(Severity::from_label) {
        mention = mention.with_severity(severity);
    }
    if let (Some(lat), Some(lon)) = (record.lat, record.lon) {
        mention = mention.with_coords(LonLat::new(lon, lat));
    }
    Ok(mention)
}

/// Parse an RFC 3339 timestamp, or a bare date as midnight UTC.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
