//! The signed-in user's saved trips, as shown on a "my trips" page.

use std::sync::Arc;

use shared::{
    domain::{Identity, TripId, TripRecord},
    error::TripError,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::TripBackend;

pub struct TripLibrary {
    backend: Arc<dyn TripBackend>,
    trips: Mutex<Vec<TripRecord>>,
}

impl TripLibrary {
    pub fn new(backend: Arc<dyn TripBackend>) -> Self {
        Self {
            backend,
            trips: Mutex::new(Vec::new()),
        }
    }

    pub async fn trips(&self) -> Vec<TripRecord> {
        self.trips.lock().await.clone()
    }

    /// Replaces the local list with the backend's. On failure the previous
    /// list is kept.
    pub async fn refresh(&self, identity: Option<&Identity>) -> Result<Vec<TripRecord>, TripError> {
        let identity = identity.ok_or(TripError::AuthRequired)?;
        let trips = self
            .backend
            .list_trips(&identity.id)
            .await
            .inspect_err(|err| warn!(user_id = %identity.id, %err, "failed to load trips"))?;

        let mut guard = self.trips.lock().await;
        *guard = trips.clone();
        Ok(trips)
    }

    /// Deletes on the backend first; the local entry is removed only after
    /// the backend confirms.
    pub async fn delete(&self, trip_id: &TripId) -> Result<(), TripError> {
        self.backend
            .delete_trip(trip_id)
            .await
            .inspect_err(|err| warn!(trip_id = %trip_id, %err, "failed to delete trip"))?;

        self.trips.lock().await.retain(|trip| &trip.id != trip_id);
        info!(trip_id = %trip_id, "trip deleted");
        Ok(())
    }

    pub async fn record_saved(&self, record: TripRecord) {
        let mut guard = self.trips.lock().await;
        guard.retain(|trip| trip.id != record.id);
        guard.push(record);
    }
}
