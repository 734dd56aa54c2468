//! In-memory provider fakes shared by the unit test suites.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{PlaceId, Suggestion, TripId, TripPlan, TripRecord, UserId},
    error::{Service, TripError},
    protocol::{SaveTripRequest, SyncUserRequest},
};
use tokio::sync::Mutex;

use crate::{GeocodingProvider, ItineraryGenerator, TripBackend};

pub(crate) fn suggestion(display_name: &str, place_id: &str) -> Suggestion {
    Suggestion {
        display_name: display_name.to_string(),
        place_id: PlaceId::from(place_id),
        raw: serde_json::json!({ "display_name": display_name, "place_id": place_id }),
    }
}

pub(crate) struct FakeGeocoder {
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl FakeGeocoder {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            delays: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub(crate) fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub(crate) fn failing_for(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub(crate) fn result_for(query: &str) -> Vec<Suggestion> {
        vec![suggestion(&format!("{query} result"), &format!("{query}-id"))]
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn search(&self, text: &str) -> Result<Vec<Suggestion>, TripError> {
        self.calls.lock().await.push(text.to_string());
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(text) {
            return Err(TripError::network(Service::Geocoding, "connection reset"));
        }
        Ok(Self::result_for(text))
    }
}

pub(crate) struct FakeGenerator {
    pub(crate) prompts: Arc<Mutex<Vec<String>>>,
    outcome: Result<TripPlan, TripError>,
    delay: Option<Duration>,
}

impl FakeGenerator {
    pub(crate) fn ok(text: &str) -> Self {
        Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            outcome: Ok(TripPlan::new(text)),
            delay: None,
        }
    }

    pub(crate) fn failing(err: TripError) -> Self {
        Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            outcome: Err(err),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ItineraryGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<TripPlan, TripError> {
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

pub(crate) struct FakeBackend {
    pub(crate) sync_calls: Arc<Mutex<Vec<SyncUserRequest>>>,
    pub(crate) save_calls: Arc<Mutex<Vec<SaveTripRequest>>>,
    pub(crate) deleted: Arc<Mutex<Vec<TripId>>>,
    sync_outcome: Result<(), TripError>,
    save_outcome: Result<TripId, TripError>,
    trips: Vec<TripRecord>,
}

impl FakeBackend {
    pub(crate) fn ok(trip_id: &str) -> Self {
        Self {
            sync_calls: Arc::new(Mutex::new(Vec::new())),
            save_calls: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            sync_outcome: Ok(()),
            save_outcome: Ok(TripId::from(trip_id)),
            trips: Vec::new(),
        }
    }

    pub(crate) fn with_sync_error(mut self, err: TripError) -> Self {
        self.sync_outcome = Err(err);
        self
    }

    pub(crate) fn with_save_error(mut self, err: TripError) -> Self {
        self.save_outcome = Err(err);
        self
    }

    pub(crate) fn with_trips(mut self, trips: Vec<TripRecord>) -> Self {
        self.trips = trips;
        self
    }
}

#[async_trait]
impl TripBackend for FakeBackend {
    async fn sync_user(&self, request: &SyncUserRequest) -> Result<(), TripError> {
        self.sync_calls.lock().await.push(request.clone());
        self.sync_outcome.clone()
    }

    async fn save_trip(&self, request: &SaveTripRequest) -> Result<TripId, TripError> {
        self.save_calls.lock().await.push(request.clone());
        self.save_outcome.clone()
    }

    async fn list_trips(&self, user_id: &UserId) -> Result<Vec<TripRecord>, TripError> {
        Ok(self
            .trips
            .iter()
            .filter(|trip| trip.owner_id.as_ref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn delete_trip(&self, trip_id: &TripId) -> Result<(), TripError> {
        self.deleted.lock().await.push(trip_id.clone());
        Ok(())
    }
}
