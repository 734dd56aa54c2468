//! Itinerary generation: prompt construction and the generative service client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{TripPlan, TripRequest},
    error::{Service, TripError},
    protocol::{GenerateContentRequest, GenerateContentResponse, ProviderErrorEnvelope},
};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::Settings,
    http::{build_client, decode_json, transport_error},
    ItineraryGenerator,
};

pub const MISSING_API_KEY_MESSAGE: &str = "Gemini API Key not found.";
const UNKNOWN_PROVIDER_ERROR: &str = "Unknown error";

/// A plan together with the validated request it was generated from. Saving
/// always uses this pair, never whatever the form holds at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub request: TripRequest,
    pub plan: TripPlan,
}

pub fn build_prompt(request: &TripRequest) -> String {
    format!(
        "Generate a detailed travel itinerary for a trip to {}. The trip duration is {} days. \
         The budget for this trip is {}. This is a {} trip. \
         Format the output clearly with headings for each day.",
        request.location.display_name, request.days, request.budget, request.party_type
    )
}

pub async fn generate_plan(
    generator: &dyn ItineraryGenerator,
    request: TripRequest,
) -> Result<GeneratedPlan, TripError> {
    let prompt = build_prompt(&request);
    debug!(prompt_len = prompt.len(), destination = %request.location.display_name, "requesting itinerary");
    let plan = generator.generate(&prompt).await?;
    info!(
        destination = %request.location.display_name,
        days = request.days,
        plan_len = plan.text.len(),
        "itinerary generated"
    );
    Ok(GeneratedPlan { request, plan })
}

pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(http: Client, endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("invalid generative endpoint '{endpoint}'"))?;
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            build_client(settings)?,
            &settings.generative_endpoint,
            settings.generative_api_key.clone(),
        )
    }
}

#[async_trait]
impl ItineraryGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<TripPlan, TripError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TripError::Configuration(MISSING_API_KEY_MESSAGE.to_string()))?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[("key", api_key)])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|err| transport_error(Service::Generative, err))?;

        let status = response.status();
        if !status.is_success() {
            let envelope: ProviderErrorEnvelope = response.json().await.unwrap_or_default();
            let message = envelope
                .error
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_string());
            return Err(TripError::provider(
                Service::Generative,
                Some(status.as_u16()),
                message,
            ));
        }

        let body: GenerateContentResponse = decode_json(Service::Generative, response).await?;
        let text = body.first_text().ok_or_else(|| {
            TripError::parse(
                Service::Generative,
                "response has no candidates[0].content.parts[0].text",
            )
        })?;
        Ok(TripPlan::new(text))
    }
}
