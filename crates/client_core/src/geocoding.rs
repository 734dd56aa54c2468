use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Suggestion,
    error::{Service, TripError},
    protocol::{geocoding_search_route, GeocodingPlace},
};
use tracing::debug;

use crate::{
    config::Settings,
    http::{build_client, decode_json, normalize_base_url, transport_error},
    GeocodingProvider,
};

/// OpenStreetMap Nominatim (or anything serving the same `/search` contract).
pub struct NominatimClient {
    http: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(http: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(build_client(settings)?, &settings.geocoding_url)
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(&self, text: &str) -> Result<Vec<Suggestion>, TripError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, geocoding_search_route()))
            .query(&[("format", "json"), ("q", text)])
            .send()
            .await
            .map_err(|err| transport_error(Service::Geocoding, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TripError::provider(
                Service::Geocoding,
                Some(status.as_u16()),
                format!("place search failed with status {status}"),
            ));
        }

        let places: Vec<serde_json::Value> = decode_json(Service::Geocoding, response).await?;
        let total = places.len();
        let suggestions: Vec<Suggestion> = places
            .into_iter()
            .filter_map(|raw| {
                serde_json::from_value::<GeocodingPlace>(raw.clone())
                    .ok()
                    .map(|place| place.into_suggestion(raw))
            })
            .collect();

        if suggestions.len() != total {
            debug!(
                total,
                kept = suggestions.len(),
                "dropped geocoding results without place_id/display_name"
            );
        }
        Ok(suggestions)
    }
}
