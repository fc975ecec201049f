//! Place entities and coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A shared reference to a PlaceEntity for cheap passing through the
/// pipeline. Using Arc avoids cloning entity data every time a mention
/// resolves to the same place.
pub type SharedPlace = Arc<PlaceEntity>;

/// Longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Categorical settlement tier of a gazetteer place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementTier {
    City,
    Town,
}

impl fmt::Display for SettlementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementTier::City => write!(f, "city"),
            SettlementTier::Town => write!(f, "town"),
        }
    }
}

/// A canonical geographic entity.
///
/// Immutable once the gazetteer is built; identity is `canonical_name`,
/// which is unique within an index. `display_name` is the key fuzzy
/// matching runs against and defaults to the canonical name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceEntity {
    /// Unique identity within a gazetteer (Arc<str> for O(1) clone)
    pub canonical_name: Arc<str>,
    /// Name used for fuzzy matching and display
    pub display_name: Arc<str>,
    pub tier: SettlementTier,
    pub coords: LonLat,
}

impl PlaceEntity {
    pub fn new(canonical_name: impl Into<Arc<str>>, tier: SettlementTier, coords: LonLat) -> Self {
        let canonical_name = canonical_name.into();
        Self {
            display_name: canonical_name.clone(),
            canonical_name,
            tier,
            coords,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<Arc<str>>) -> Self {
        self.display_name = display_name.into();
        self
    }
}
