//! Two-step trip persistence against the backend: user sync, then trip save.
//!
//! The sync is idempotent, so a save that fails after a successful sync leaves
//! nothing to compensate; the next attempt simply syncs again.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Identity, TripId, TripRecord, UserId},
    error::{Service, TripError},
    protocol::{
        my_trips_route, save_trip_route, sync_user_route, trip_route, AckResponse,
        BackendErrorBody, MyTripsResponse, SaveTripRequest, SaveTripResponse, SyncUserRequest,
    },
};
use tracing::{info, warn};

use crate::{
    config::Settings,
    generation::GeneratedPlan,
    http::{build_client, decode_json, normalize_base_url, transport_error},
    TripBackend,
};

pub struct HttpTripBackend {
    http: Client,
    base_url: String,
}

impl HttpTripBackend {
    pub fn new(http: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(build_client(settings)?, &settings.backend_url)
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TripError> {
        let response = request
            .send()
            .await
            .map_err(|err| transport_error(Service::Backend, err))?;

        let status = response.status();
        if !status.is_success() {
            let body: BackendErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .into_message()
                .unwrap_or_else(|| format!("backend request failed with status {status}"));
            return Err(TripError::provider(
                Service::Backend,
                Some(status.as_u16()),
                message,
            ));
        }

        decode_json(Service::Backend, response).await
    }
}

fn rejected(message: Option<String>, fallback: &str) -> TripError {
    TripError::provider(
        Service::Backend,
        None,
        message.unwrap_or_else(|| fallback.to_string()),
    )
}

#[async_trait]
impl TripBackend for HttpTripBackend {
    async fn sync_user(&self, request: &SyncUserRequest) -> Result<(), TripError> {
        let ack: AckResponse = self
            .send(self.http.post(self.url(sync_user_route())).json(request))
            .await?;
        if !ack.success {
            return Err(rejected(ack.message, "user sync was rejected"));
        }
        Ok(())
    }

    async fn save_trip(&self, request: &SaveTripRequest) -> Result<TripId, TripError> {
        let response: SaveTripResponse = self
            .send(self.http.post(self.url(save_trip_route())).json(request))
            .await?;
        if !response.success {
            return Err(rejected(
                response.message,
                "Failed to save trip. Please try again.",
            ));
        }
        response
            .trip
            .map(|trip| trip.id)
            .ok_or_else(|| TripError::parse(Service::Backend, "save response has no trip.id"))
    }

    async fn list_trips(&self, user_id: &UserId) -> Result<Vec<TripRecord>, TripError> {
        let response: MyTripsResponse = self
            .send(self.http.get(self.url(&my_trips_route(user_id))))
            .await?;
        if !response.success {
            return Err(rejected(response.message, "failed to load trips"));
        }
        Ok(response.trips)
    }

    async fn delete_trip(&self, trip_id: &TripId) -> Result<(), TripError> {
        let ack: AckResponse = self
            .send(self.http.delete(self.url(&trip_route(trip_id))))
            .await?;
        if !ack.success {
            return Err(rejected(ack.message, "Failed to delete trip"));
        }
        Ok(())
    }
}

/// Both preconditions of a save, checked before any I/O.
pub fn check_preconditions<'a>(
    identity: Option<&'a Identity>,
    generated: Option<&'a GeneratedPlan>,
) -> Result<(&'a Identity, &'a GeneratedPlan), TripError> {
    let identity = identity.ok_or(TripError::AuthRequired)?;
    let generated = generated.ok_or(TripError::MissingPlan)?;
    Ok((identity, generated))
}

/// Syncs the identity, then creates the trip. The save is never attempted if
/// the sync fails, and the sync error is returned unchanged.
pub async fn persist_trip(
    backend: &dyn TripBackend,
    identity: Option<&Identity>,
    generated: Option<&GeneratedPlan>,
) -> Result<TripId, TripError> {
    let (identity, generated) = check_preconditions(identity, generated)?;

    backend
        .sync_user(&SyncUserRequest::from(identity))
        .await
        .inspect_err(|err| warn!(user_id = %identity.id, %err, "user sync failed; trip not saved"))?;

    let request = SaveTripRequest::new(&identity.id, &generated.request, &generated.plan.text);
    let trip_id = backend.save_trip(&request).await.inspect_err(|err| {
        warn!(
            user_id = %identity.id,
            %err,
            "trip save failed after user sync succeeded"
        )
    })?;

    info!(user_id = %identity.id, trip_id = %trip_id, "trip saved");
    Ok(trip_id)
}
