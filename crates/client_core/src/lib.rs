use async_trait::async_trait;
use shared::{
    domain::{Suggestion, TripId, TripPlan, TripRecord, UserId},
    error::TripError,
    protocol::{SaveTripRequest, SyncUserRequest},
};

pub mod config;
pub mod events;
pub mod generation;
pub mod geocoding;
mod http;
pub mod library;
pub mod orchestrator;
pub mod persistence;
pub mod resolver;

pub use config::{load_settings, load_settings_from, Settings};
pub use events::{ComposerEvent, Operation};
pub use generation::{build_prompt, GeminiClient, GeneratedPlan};
pub use geocoding::NominatimClient;
pub use library::TripLibrary;
pub use orchestrator::{ComposerOptions, ComposerSnapshot, Phase, TripComposer};
pub use persistence::{persist_trip, HttpTripBackend};
pub use resolver::LocationResolver;

/// Free-text place search. Best effort: callers log failures instead of
/// surfacing them.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn search(&self, text: &str) -> Result<Vec<Suggestion>, TripError>;
}

/// Turns a prompt into itinerary prose. One request per call, no retries.
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<TripPlan, TripError>;
}

#[async_trait]
pub trait TripBackend: Send + Sync {
    /// Idempotent by `clerk_id`; safe to call before every save.
    async fn sync_user(&self, request: &SyncUserRequest) -> Result<(), TripError>;
    async fn save_trip(&self, request: &SaveTripRequest) -> Result<TripId, TripError>;
    async fn list_trips(&self, user_id: &UserId) -> Result<Vec<TripRecord>, TripError>;
    async fn delete_trip(&self, trip_id: &TripId) -> Result<(), TripError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
