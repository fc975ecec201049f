//! Geopulse Core - Shared data model for the playback pipeline
//!
//! Pure value types used by every other crate: gazetteer place entities,
//! timestamped mention records, and the tween interpolation math. No async,
//! no I/O, no clocks; everything here is deterministic and synchronous.

pub mod mention;
pub mod place;
pub mod tween;

pub use mention::{severity_color, MentionRecord, Severity, FALLBACK_COLOR};
pub use place::{LonLat, PlaceEntity, SettlementTier, SharedPlace};
pub use tween::{Frame, Tween};
