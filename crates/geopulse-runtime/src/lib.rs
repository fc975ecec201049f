//! Geopulse Runtime - Playback and resolution engine for geo mention feeds
//!
//! This crate provides the stages between a mention feed and a render
//! surface: gazetteer lookup, timed playback, counting, and pulse markers.

pub mod aggregate;
pub mod animator;
pub mod error;
pub mod gazetteer;
pub mod markers;
pub mod pipeline;
pub mod playback;
pub mod resolver;
pub mod sink;
pub mod source;

pub use aggregate::{FxIndexMap, MentionCounter, RankingEntry};
pub use animator::{pulse_tween, spawn_animation};
pub use error::LoadError;
pub use gazetteer::{load_places, Gazetteer, ScoredPlace};
pub use markers::{Marker, MarkerLayer};
pub use pipeline::{Pipeline, PipelineStats, UnresolvedPolicy};
pub use playback::{spawn_playback, Playback, PlaybackHandle, PlaybackState};
pub use resolver::{ResolvedMention, Resolver};
pub use sink::{BufferSink, ConsoleSink, JsonlSink, MarkerEvent, MultiSink, RenderSink};
pub use source::{DatasetFeed, EventSource, MalformedPolicy, SyntheticFeed};
