//! Mention processing pipeline
//!
//! Wires the stages together: each record from the feed is resolved
//! against the gazetteer, counted, turned into a pulse marker, and
//! published to the render sinks along with a fresh ranking snapshot.

use crate::aggregate::{MentionCounter, RankingEntry};
use crate::markers::MarkerLayer;
use crate::resolver::Resolver;
use crate::sink::{MarkerEvent, RenderSink};
use anyhow::Result;
use geopulse_core::{severity_color, MentionRecord};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Default number of entries in a published ranking snapshot.
pub const DEFAULT_TOP_N: usize = 5;

/// What to do with a mention the gazetteer cannot resolve.
///
/// Unresolved mentions are never counted either way; the policy only
/// decides whether they reach the render boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Drop the mention entirely.
    #[default]
    Drop,
    /// Forward it as an unlocated marker at its source coordinates,
    /// when it carries any.
    Passthrough,
}

/// Counters accumulated over a pipeline's lifetime.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PipelineStats {
    pub ingested: u64,
    pub resolved: u64,
    pub unresolved: u64,
    pub rankings_published: u64,
}

/// The processing pipeline. One instance per playback run.
pub struct Pipeline {
    resolver: Resolver,
    counter: MentionCounter,
    markers: MarkerLayer,
    sinks: Vec<Box<dyn RenderSink>>,
    policy: UnresolvedPolicy,
    top_n: usize,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            counter: MentionCounter::new(),
            markers: MarkerLayer::new(),
            sinks: Vec::new(),
            policy: UnresolvedPolicy::default(),
            top_n: DEFAULT_TOP_N,
            stats: PipelineStats::default(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Process one mention record through resolve, count, and render.
    pub async fn process(&mut self, record: MentionRecord) -> Result<()> {
        self.stats.ingested += 1;
        let color = severity_color(record.severity);
        let resolved = self.resolver.resolve_record(record);

        match resolved.place {
            Some(ref place) => {
                self.stats.resolved += 1;
                self.counter.record(place);

                let event = MarkerEvent {
                    coords: place.coords,
                    color,
                    label: resolved.label().to_string(),
                    timestamp: resolved.record.timestamp,
                    located: true,
                };
                self.markers.drop_marker(event.coords, event.color);
                for sink in &self.sinks {
                    sink.marker(&event).await?;
                }

                let ranking = self.counter.snapshot_top_n(self.top_n);
                for sink in &self.sinks {
                    sink.ranking(&ranking).await?;
                }
                self.stats.rankings_published += 1;
            }
            None => {
                self.stats.unresolved += 1;
                match self.policy {
                    UnresolvedPolicy::Drop => {}
                    UnresolvedPolicy::Passthrough => {
                        // Nothing to draw without coordinates.
                        if let Some(coords) = resolved.record.coords {
                            let event = MarkerEvent {
                                coords,
                                color,
                                label: resolved.label().to_string(),
                                timestamp: resolved.record.timestamp,
                                located: false,
                            };
                            self.markers.drop_marker(event.coords, event.color);
                            for sink in &self.sinks {
                                sink.marker(&event).await?;
                            }
                        } else {
                            debug!(
                                "Dropping unlocated mention '{}'",
                                resolved.record.raw_text
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Drain a playback channel to completion, then flush and close the
    /// sinks. Returns the final stats.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<MentionRecord>) -> Result<PipelineStats> {
        while let Some(record) = rx.recv().await {
            self.process(record).await?;
        }
        self.flush().await?;
        self.close().await?;
        info!(
            "Pipeline drained: {} ingested, {} resolved, {} unresolved",
            self.stats.ingested, self.stats.resolved, self.stats.unresolved
        );
        Ok(self.stats)
    }

    pub async fn flush(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.flush().await?;
        }
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.close().await?;
        }
        Ok(())
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn counter(&self) -> &MentionCounter {
        &self.counter
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    /// Current ranking snapshot, independent of any published copy.
    pub fn ranking(&self) -> Vec<RankingEntry> {
        self.counter.snapshot_top_n(self.top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Gazetteer;
    use crate::sink::BufferSink;
    use chrono::Utc;
    use geopulse_core::{LonLat, PlaceEntity, Severity, SettlementTier};
    use std::sync::Arc;

    fn test_gazetteer() -> Arc<Gazetteer> {
        let places = vec![
            PlaceEntity::new("Kyiv", SettlementTier::City, LonLat::new(30.5234, 50.4501)),
            PlaceEntity::new("Lviv", SettlementTier::City, LonLat::new(24.0297, 49.8397)),
        ];
        Arc::new(Gazetteer::build(places).unwrap())
    }

    fn pipeline_with_buffer() -> (Pipeline, BufferSink) {
        let buffer = BufferSink::new("buffer");
        let pipeline = Pipeline::new(Resolver::new(test_gazetteer()))
            .with_sink(Box::new(buffer.clone()));
        (pipeline, buffer)
    }

    // ==========================================================================
    // Resolved Path Tests
    // ==========================================================================

    #[tokio::test]
    async fn test_resolved_mention_reaches_sink() {
        let (mut pipeline, buffer) = pipeline_with_buffer();

        let record = MentionRecord::new("Kyiv", Utc::now()).with_severity(Severity::Red);
        pipeline.process(record).await.unwrap();

        let markers = buffer.markers().await;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label, "Kyiv");
        assert_eq!(markers[0].color, "#E53");
        assert!(markers[0].located);

        let ranking = buffer.last_ranking().await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].display_name.as_ref(), "Kyiv");
        assert_eq!(ranking[0].count, 1);

        let stats = pipeline.stats();
        assert_eq!(stats.ingested, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unresolved, 0);
        assert_eq!(stats.rankings_published, 1);
    }

    #[tokio::test]
    async fn test_fuzzy_variant_counts_under_canonical_name() {
        let (mut pipeline, buffer) = pipeline_with_buffer();

        pipeline
            .process(MentionRecord::new("Kyiv", Utc::now()))
            .await
            .unwrap();
        pipeline
            .process(MentionRecord::new("kyiw", Utc::now()))
            .await
            .unwrap();
        pipeline
            .process(MentionRecord::new("Kyïv", Utc::now()))
            .await
            .unwrap();

        let ranking = buffer.last_ranking().await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].count, 3);
        assert_eq!(pipeline.counter().count_for("Kyiv"), 3);
    }

    #[tokio::test]
    async fn test_marker_spawns_pulse() {
        let (mut pipeline, _buffer) = pipeline_with_buffer();
        pipeline
            .process(MentionRecord::new("Lviv", Utc::now()))
            .await
            .unwrap();
        assert_eq!(pipeline.markers().spawned(), 1);
    }

    // ==========================================================================
    // Unresolved Policy Tests
    // ==========================================================================

    #[tokio::test]
    async fn test_unresolved_dropped_by_default() {
        let (mut pipeline, buffer) = pipeline_with_buffer();

        let record = MentionRecord::new("Xyzzyplonk", Utc::now())
            .with_coords(LonLat::new(10.0, 20.0));
        pipeline.process(record).await.unwrap();

        assert!(buffer.markers().await.is_empty());
        assert!(buffer.rankings().await.is_empty());
        let stats = pipeline.stats();
        assert_eq!(stats.ingested, 1);
        assert_eq!(stats.unresolved, 1);
        assert!(pipeline.counter().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_passthrough_draws_unlocated_marker() {
        let buffer = BufferSink::new("buffer");
        let mut pipeline = Pipeline::new(Resolver::new(test_gazetteer()))
            .with_sink(Box::new(buffer.clone()))
            .with_policy(UnresolvedPolicy::Passthrough);

        let record = MentionRecord::new("Xyzzyplonk", Utc::now())
            .with_severity(Severity::Yellow)
            .with_coords(LonLat::new(10.0, 20.0));
        pipeline.process(record).await.unwrap();

        let markers = buffer.markers().await;
        assert_eq!(markers.len(), 1);
        assert!(!markers[0].located);
        assert_eq!(markers[0].label, "Xyzzyplonk");
        assert_eq!(markers[0].color, "#F7B500");
        // Never counted, never ranked.
        assert!(buffer.rankings().await.is_empty());
        assert!(pipeline.counter().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_passthrough_without_coords_draws_nothing() {
        let buffer = BufferSink::new("buffer");
        let mut pipeline = Pipeline::new(Resolver::new(test_gazetteer()))
            .with_sink(Box::new(buffer.clone()))
            .with_policy(UnresolvedPolicy::Passthrough);

        pipeline
            .process(MentionRecord::new("Xyzzyplonk", Utc::now()))
            .await
            .unwrap();

        assert!(buffer.markers().await.is_empty());
        assert_eq!(pipeline.stats().unresolved, 1);
    }

    // ==========================================================================
    // Ranking Tests
    // ==========================================================================

    #[tokio::test]
    async fn test_ranking_truncated_to_top_n() {
        let buffer = BufferSink::new("buffer");
        let mut pipeline = Pipeline::new(Resolver::new(test_gazetteer()))
            .with_sink(Box::new(buffer.clone()))
            .with_top_n(1);

        pipeline
            .process(MentionRecord::new("Kyiv", Utc::now()))
            .await
            .unwrap();
        pipeline
            .process(MentionRecord::new("Lviv", Utc::now()))
            .await
            .unwrap();
        pipeline
            .process(MentionRecord::new("Lviv", Utc::now()))
            .await
            .unwrap();

        let ranking = buffer.last_ranking().await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].display_name.as_ref(), "Lviv");
        assert_eq!(ranking[0].count, 2);
    }

    #[tokio::test]
    async fn test_published_snapshots_are_independent() {
        let (mut pipeline, buffer) = pipeline_with_buffer();

        pipeline
            .process(MentionRecord::new("Kyiv", Utc::now()))
            .await
            .unwrap();
        let first = buffer.last_ranking().await.unwrap();
        pipeline
            .process(MentionRecord::new("Kyiv", Utc::now()))
            .await
            .unwrap();

        // Earlier snapshot unchanged by later counting.
        assert_eq!(first[0].count, 1);
        assert_eq!(buffer.last_ranking().await.unwrap()[0].count, 2);
    }

    // ==========================================================================
    // Run Loop Tests
    // ==========================================================================

    #[tokio::test]
    async fn test_run_drains_channel() {
        let (mut pipeline, buffer) = pipeline_with_buffer();
        let (tx, rx) = mpsc::channel(16);

        tx.send(MentionRecord::new("Kyiv", Utc::now())).await.unwrap();
        tx.send(MentionRecord::new("Nowhere", Utc::now())).await.unwrap();
        tx.send(MentionRecord::new("Lviv", Utc::now())).await.unwrap();
        drop(tx);

        let stats = pipeline.run(rx).await.unwrap();
        assert_eq!(stats.ingested, 3);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(buffer.markers().await.len(), 2);
    }
}
