//! Venue detection: map a GPS fix to the nearest registered sailing venue.
//!
//! [`DetectionEngine`] tries the AI path under a deadline and falls back to
//! deterministic ranking on any failure. Results are cached per grid cell.

pub mod agent;
pub mod cache;
pub mod confidence;
pub mod detector;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod geo;
pub mod rank;
pub mod registry;
pub mod types;

pub use agent::{AgentClient, AgentDetector};
pub use cache::{CacheKey, ResultCache};
pub use confidence::confidence;
pub use detector::Detector;
pub use engine::{DetectionEngine, DetectionPhase};
pub use error::{AgentError, DegenerateVenue, DetectError, RegistryError};
pub use fallback::DeterministicDetector;
pub use geo::{haversine_km, GridCell};
pub use rank::rank;
pub use registry::{InMemoryRegistry, VenueRegistry};
pub use types::{
    Candidate, DetectOptions, DetectionRequest, DetectionResult, DetectionSource, ErrorKind,
};
