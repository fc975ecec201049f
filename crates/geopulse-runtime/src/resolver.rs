//! Fuzzy text-to-entity resolution

use crate::gazetteer::Gazetteer;
use geopulse_core::{LonLat, MentionRecord, SharedPlace};
use std::sync::Arc;
use tracing::debug;

/// Resolves raw mention text to a gazetteer place.
///
/// A thin delegate over `Gazetteer::search` with limit 1: the best
/// qualifying candidate wins; no candidate means unresolved, which is an
/// expected outcome rather than an error. Stateless: the same index and
/// text always give the same answer.
pub struct Resolver {
    gazetteer: Arc<Gazetteer>,
}

impl Resolver {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }

    /// Best qualifying place for `raw_text`, or `None` when nothing
    /// scores below the index threshold.
    pub fn resolve(&self, raw_text: &str) -> Option<SharedPlace> {
        match self.gazetteer.search(raw_text, 1).pop() {
            Some(hit) => {
                debug!(
                    "resolved '{}' -> '{}' (score {:.3})",
                    raw_text, hit.place.canonical_name, hit.score
                );
                Some(hit.place)
            }
            None => {
                debug!("unresolved mention '{}'", raw_text);
                None
            }
        }
    }

    /// Resolve a whole record into its per-tick processing form.
    pub fn resolve_record(&self, record: MentionRecord) -> ResolvedMention {
        let place = self.resolve(&record.raw_text);
        ResolvedMention { record, place }
    }
}

/// A mention paired with its resolution outcome.
///
/// Ephemeral: lives for one playback tick's processing and is dropped
/// once the sinks have been notified.
#[derive(Debug, Clone)]
pub struct ResolvedMention {
    pub record: MentionRecord,
    pub place: Option<SharedPlace>,
}

impl ResolvedMention {
    pub fn is_resolved(&self) -> bool {
        self.place.is_some()
    }

    /// Coordinates to render: the resolved entity's, else whatever the
    /// record itself carried.
    pub fn coords(&self) -> Option<LonLat> {
        self.place.as_ref().map(|p| p.coords).or(self.record.coords)
    }

    /// Label to display: the resolved display name, else the raw text.
    pub fn label(&self) -> &str {
        self.place
            .as_ref()
            .map(|p| &*p.display_name)
            .unwrap_or(&self.record.raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geopulse_core::{PlaceEntity, SettlementTier};

    fn resolver() -> Resolver {
        let gazetteer = Gazetteer::build(vec![
            PlaceEntity::new("Kyiv", SettlementTier::City, LonLat::new(30.52, 50.45)),
            PlaceEntity::new("Kharkiv", SettlementTier::City, LonLat::new(36.23, 49.99)),
        ])
        .unwrap();
        Resolver::new(Arc::new(gazetteer))
    }

    #[test]
    fn test_resolves_close_text() {
        let resolver = resolver();
        let place = resolver.resolve("kharkiw").unwrap();
        assert_eq!(&*place.canonical_name, "Kharkiv");
    }

    #[test]
    fn test_unmatchable_text_is_none() {
        let resolver = resolver();
        assert!(resolver.resolve("Xyzzyplonk").is_none());
    }

    #[test]
    fn test_resolution_is_pure() {
        let resolver = resolver();
        let first = resolver.resolve("kyiv").map(|p| p.canonical_name.clone());
        let second = resolver.resolve("kyiv").map(|p| p.canonical_name.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolved_mention_uses_entity_coords() {
        let resolver = resolver();
        let record = MentionRecord::new("Kyiv", Utc::now()).with_coords(LonLat::new(0.0, 0.0));
        let resolved = resolver.resolve_record(record);
        assert!(resolved.is_resolved());
        assert_eq!(resolved.coords().unwrap().lon, 30.52);
        assert_eq!(resolved.label(), "Kyiv");
    }

    #[test]
    fn test_unresolved_mention_falls_back_to_record_coords() {
        let resolver = resolver();
        let record =
            MentionRecord::new("Xyzzyplonk", Utc::now()).with_coords(LonLat::new(35.0, 47.0));
        let resolved = resolver.resolve_record(record);
        assert!(!resolved.is_resolved());
        assert_eq!(resolved.coords().unwrap().lat, 47.0);
        assert_eq!(resolved.label(), "Xyzzyplonk");

        let bare = resolver.resolve_record(MentionRecord::new("Xyzzyplonk", Utc::now()));
        assert!(bare.coords().is_none());
    }
}
