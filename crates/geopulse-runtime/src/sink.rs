//! Render sinks for marker and ranking output
//!
//! The pipeline pushes exactly two signals outward: one marker event per
//! resolved mention and one ranking snapshot per counter update. Sinks
//! are the render boundary; everything on the far side of this trait is
//! presentation.

use crate::aggregate::RankingEntry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geopulse_core::LonLat;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// A resolved mention ready to draw.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerEvent {
    pub coords: LonLat,
    /// Severity color from the reference palette
    pub color: &'static str,
    /// Display name of the resolved place, or the raw text for
    /// unlocated reports
    pub label: String,
    pub timestamp: DateTime<Utc>,
    /// False when the mention missed the gazetteer and is shown at its
    /// source coordinates
    pub located: bool,
}

/// Kind-tagged envelope for machine-readable output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SinkLine<'a> {
    Marker(&'a MarkerEvent),
    Ranking { entries: &'a [RankingEntry] },
}

/// Trait for render sinks
#[async_trait]
pub trait RenderSink: Send + Sync {
    /// Name of this sink
    fn name(&self) -> &str;

    /// Draw one resolved mention marker
    async fn marker(&self, event: &MarkerEvent) -> Result<()>;

    /// Replace the displayed ranking with a fresh snapshot
    async fn ranking(&self, entries: &[RankingEntry]) -> Result<()>;

    /// Flush any buffered data
    async fn flush(&self) -> Result<()>;

    /// Close the sink
    async fn close(&self) -> Result<()>;
}

/// Console sink - prints to stdout
pub struct ConsoleSink {
    name: String,
    pretty: bool,
    /// Playback day shown by the last date readout
    current_day: std::sync::Mutex<Option<String>>,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty: true,
            current_day: std::sync::Mutex::new(None),
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Date readout line, emitted whenever the playback day advances.
    /// Returns `None` while the day is unchanged.
    fn day_heading(&self, timestamp: &DateTime<Utc>) -> Option<String> {
        let day = timestamp.format("%d %b %Y").to_string();
        let mut current = self
            .current_day
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if current.as_deref() == Some(day.as_str()) {
            return None;
        }
        let heading = format!("--- {} ---", day);
        *current = Some(day);
        Some(heading)
    }
}

#[async_trait]
impl RenderSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn marker(&self, event: &MarkerEvent) -> Result<()> {
        if self.pretty {
            if let Some(heading) = self.day_heading(&event.timestamp) {
                println!("{}", heading);
            }
            let suffix = if event.located { "" } else { " (unlocated)" };
            println!(
                "[{}] ● {} {} @ {}{}",
                event.timestamp.format("%d %b %Y %H:%M"),
                event.label,
                event.color,
                event.coords,
                suffix
            );
        } else {
            println!("{}", serde_json::to_string(&SinkLine::Marker(event))?);
        }
        Ok(())
    }

    async fn ranking(&self, entries: &[RankingEntry]) -> Result<()> {
        if self.pretty {
            let line = entries
                .iter()
                .map(|e| format!("{}:{}", e.display_name, e.count))
                .collect::<Vec<_>>()
                .join(" | ");
            println!("top: {}", line);
        } else {
            println!("{}", serde_json::to_string(&SinkLine::Ranking { entries })?);
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// JSONL sink - appends kind-tagged JSON lines to a file
#[allow(dead_code)]
pub struct JsonlSink {
    name: String,
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl JsonlSink {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }
}

#[async_trait]
impl RenderSink for JsonlSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn marker(&self, event: &MarkerEvent) -> Result<()> {
        let json = serde_json::to_string(&SinkLine::Marker(event))?;
        let mut file = self.file.lock().await;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    async fn ranking(&self, entries: &[RankingEntry]) -> Result<()> {
        let json = serde_json::to_string(&SinkLine::Ranking { entries })?;
        let mut file = self.file.lock().await;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush()?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.flush().await
    }
}

/// In-memory sink retaining everything it receives. Embedding hosts poll
/// it for display state; tests read it back to assert on pipeline output.
#[derive(Clone)]
pub struct BufferSink {
    name: String,
    markers: Arc<Mutex<Vec<MarkerEvent>>>,
    rankings: Arc<Mutex<Vec<Vec<RankingEntry>>>>,
}

impl BufferSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: Arc::new(Mutex::new(Vec::new())),
            rankings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All marker events received so far, in order.
    pub async fn markers(&self) -> Vec<MarkerEvent> {
        self.markers.lock().await.clone()
    }

    /// All ranking snapshots received so far, in order.
    pub async fn rankings(&self) -> Vec<Vec<RankingEntry>> {
        self.rankings.lock().await.clone()
    }

    /// The most recent ranking snapshot, if any.
    pub async fn last_ranking(&self) -> Option<Vec<RankingEntry>> {
        self.rankings.lock().await.last().cloned()
    }
}

#[async_trait]
impl RenderSink for BufferSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn marker(&self, event: &MarkerEvent) -> Result<()> {
        self.markers.lock().await.push(event.clone());
        Ok(())
    }

    async fn ranking(&self, entries: &[RankingEntry]) -> Result<()> {
        self.rankings.lock().await.push(entries.to_vec());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Multi-sink that broadcasts to multiple sinks
pub struct MultiSink {
    name: String,
    sinks: Vec<Box<dyn RenderSink>>,
}

impl MultiSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sinks: Vec::new(),
        }
    }

    pub fn add(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl RenderSink for MultiSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn marker(&self, event: &MarkerEvent) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.marker(event).await {
                error!("Sink {} error: {}", sink.name(), e);
            }
        }
        Ok(())
    }

    async fn ranking(&self, entries: &[RankingEntry]) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.ranking(entries).await {
                error!("Sink {} error: {}", sink.name(), e);
            }
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.flush().await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.close().await?;
        }
        Ok(())
    }
}
