//! Fuzzy place index
//!
//! Built once from place records, immutable afterwards. Every entity
//! contributes one searchable key (its lowercased display name); queries
//! are scored by normalized Levenshtein distance, so inconsistent
//! romanizations and stray diacritics still land on the right place as
//! long as they stay within the similarity threshold.

use crate::aggregate::FxIndexMap;
use crate::error::LoadError;
use geopulse_core::{LonLat, PlaceEntity, SettlementTier, SharedPlace};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Default similarity threshold: only candidates scoring strictly below
/// this qualify as matches.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// A scored search hit.
#[derive(Debug, Clone)]
pub struct ScoredPlace {
    pub place: SharedPlace,
    /// Normalized distance in [0, 1]; lower is a better match
    pub score: f64,
}

/// Immutable fuzzy-searchable place index.
#[derive(Debug)]
pub struct Gazetteer {
    places: Vec<SharedPlace>,
    /// Lowercased display names, parallel to `places`
    keys: Vec<String>,
    tiers: FxIndexMap<SettlementTier, Vec<SharedPlace>>,
    threshold: f64,
}

impl Gazetteer {
    /// Build an index with the default threshold.
    pub fn build(entities: Vec<PlaceEntity>) -> Result<Self, LoadError> {
        Self::with_threshold(entities, DEFAULT_THRESHOLD)
    }

    /// Build an index, validating the input: at least one entity, no
    /// empty display names, unique canonical names.
    pub fn with_threshold(entities: Vec<PlaceEntity>, threshold: f64) -> Result<Self, LoadError> {
        if entities.is_empty() {
            return Err(LoadError::EmptyGazetteer);
        }

        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut places = Vec::with_capacity(entities.len());
        let mut keys = Vec::with_capacity(entities.len());
        let mut tiers: FxIndexMap<SettlementTier, Vec<SharedPlace>> =
            IndexMap::with_hasher(FxBuildHasher);

        for (index, entity) in entities.into_iter().enumerate() {
            if entity.display_name.trim().is_empty() {
                return Err(LoadError::malformed(index, "empty display name"));
            }
            if !seen.insert(entity.canonical_name.clone()) {
                return Err(LoadError::DuplicatePlace(entity.canonical_name.to_string()));
            }
            let place: SharedPlace = Arc::new(entity);
            keys.push(place.display_name.to_lowercase());
            tiers.entry(place.tier).or_default().push(place.clone());
            places.push(place);
        }

        info!(
            "gazetteer built: {} places, threshold {}",
            places.len(),
            threshold
        );

        Ok(Self {
            places,
            keys,
            tiers,
            threshold,
        })
    }

    /// Fuzzy search for `query`, best match first, capped at `limit`.
    ///
    /// Scores are `1 - normalized_levenshtein(query, key)` over lowercased
    /// text; only scores strictly below the threshold are returned. The
    /// sort is stable, so equal scores keep original insertion order and
    /// the same index + query always produce the same answer.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredPlace> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<ScoredPlace> = self
            .places
            .iter()
            .zip(&self.keys)
            .filter_map(|(place, key)| {
                let score = 1.0 - strsim::normalized_levenshtein(&needle, key);
                (score < self.threshold).then(|| ScoredPlace {
                    place: place.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(limit);
        hits
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// All places in insertion order.
    pub fn places(&self) -> &[SharedPlace] {
        &self.places
    }

    /// Places in one settlement tier, in insertion order.
    pub fn tier(&self, tier: SettlementTier) -> &[SharedPlace] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// On-disk place record.
#[derive(Debug, Deserialize)]
struct PlaceRecord {
    name: String,
    display_name: Option<String>,
    tier: SettlementTier,
    lat: f64,
    lon: f64,
}

/// Load place records from a JSON file (array of objects).
pub fn load_places(path: impl AsRef<Path>) -> Result<Vec<PlaceEntity>, LoadError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<PlaceRecord> =
        serde_json::from_str(&raw).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entities = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if record.name.trim().is_empty() {
            return Err(LoadError::malformed(index, "empty place name"));
        }
        let mut entity = PlaceEntity::new(
            record.name,
            record.tier,
            LonLat::new(record.lon, record.lat),
        );
        if let Some(display_name) = record.display_name {
            entity = entity.with_display_name(display_name);
        }
        entities.push(entity);
    }

    debug!(
        "loaded {} place records from {}",
        entities.len(),
        path.display()
    );
    Ok(entities)
}
