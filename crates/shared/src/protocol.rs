use serde::{Deserialize, Serialize};

use crate::domain::{
    BudgetTier, Destination, Identity, PartyType, PlaceId, Suggestion, TripId, TripRecord,
    TripRequest, UserId,
};

pub const FALLBACK_EMAIL: &str = "user@example.com";
pub const FALLBACK_NAME: &str = "User";

pub fn geocoding_search_route() -> &'static str {
    "/search"
}

pub fn sync_user_route() -> &'static str {
    "/api/auth/sync"
}

pub fn save_trip_route() -> &'static str {
    "/api/trips/save"
}

pub fn my_trips_route(user_id: &UserId) -> String {
    format!("/api/trips/my-trips/{}", user_id.0)
}

pub fn trip_route(trip_id: &TripId) -> String {
    format!("/api/trips/{}", trip_id.0)
}

/// The fields the core reads from a geocoder result; everything else is kept
/// verbatim as the suggestion's raw payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingPlace {
    pub place_id: PlaceId,
    pub display_name: String,
}

impl GeocodingPlace {
    pub fn into_suggestion(self, raw: serde_json::Value) -> Suggestion {
        Suggestion {
            display_name: self.display_name,
            place_id: self.place_id,
            raw,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if the response has that shape.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorEnvelope {
    #[serde(default)]
    pub error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    pub clerk_id: UserId,
    pub email: String,
    pub name: String,
}

impl From<&Identity> for SyncUserRequest {
    fn from(identity: &Identity) -> Self {
        Self {
            clerk_id: identity.id.clone(),
            email: identity
                .email
                .clone()
                .filter(|email| !email.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_EMAIL.to_string()),
            name: identity
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_NAME.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTripRequest {
    pub clerk_id: UserId,
    pub destination: Destination,
    pub days: u8,
    pub budget: BudgetTier,
    pub trip_type: PartyType,
    pub itinerary: String,
}

impl SaveTripRequest {
    pub fn new(owner: &UserId, request: &TripRequest, itinerary: &str) -> Self {
        Self {
            clerk_id: owner.clone(),
            destination: Destination::from(&request.location),
            days: request.days,
            budget: request.budget,
            trip_type: request.party_type,
            itinerary: itinerary.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTripRef {
    #[serde(alias = "_id")]
    pub id: TripId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveTripResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<SavedTripRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MyTripsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub trips: Vec<TripRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}
