use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 5;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(TripId);
id_newtype!(UserId);

/// Provider place identifier. Geocoders disagree on whether this is a JSON
/// string or number, so both are accepted and normalised to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlaceId(pub String);

impl<'de> Deserialize<'de> for PlaceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPlaceId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawPlaceId::deserialize(deserializer)? {
            RawPlaceId::Text(text) => PlaceId(text),
            RawPlaceId::Number(number) => PlaceId(number.to_string()),
        })
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetTier {
    Cheap,
    Moderate,
    Luxury,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [BudgetTier::Cheap, BudgetTier::Moderate, BudgetTier::Luxury];

    pub fn label(self) -> &'static str {
        match self {
            BudgetTier::Cheap => "Cheap",
            BudgetTier::Moderate => "Moderate",
            BudgetTier::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BudgetTier::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown budget tier '{wanted}' (expected Cheap, Moderate or Luxury)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyType {
    #[serde(rename = "Just Me", alias = "Solo")]
    JustMe,
    #[serde(alias = "A Couple")]
    Couple,
    Family,
    Friends,
}

impl PartyType {
    pub const ALL: [PartyType; 4] = [
        PartyType::JustMe,
        PartyType::Couple,
        PartyType::Family,
        PartyType::Friends,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PartyType::JustMe => "Just Me",
            PartyType::Couple => "Couple",
            PartyType::Family => "Family",
            PartyType::Friends => "Friends",
        }
    }
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PartyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("solo") {
            return Ok(PartyType::JustMe);
        }
        if wanted.eq_ignore_ascii_case("a couple") {
            return Ok(PartyType::Couple);
        }
        PartyType::ALL
            .into_iter()
            .find(|party| party.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!("unknown party type '{wanted}' (expected Just Me, Couple, Family or Friends)")
            })
    }
}

/// One geocoder candidate. Ephemeral; only ever shown and possibly selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub display_name: String,
    pub place_id: PlaceId,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Suggestion {
    pub fn to_location(&self) -> Location {
        Location {
            display_name: self.display_name.clone(),
            place_id: self.place_id.clone(),
            raw: self.raw.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub display_name: String,
    pub place_id: PlaceId,
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripPlan {
    pub text: String,
}

impl TripPlan {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub display_name: String,
    pub place_id: PlaceId,
}

impl From<&Location> for Destination {
    fn from(location: &Location) -> Self {
        Self {
            display_name: location.display_name.clone(),
            place_id: location.place_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    #[serde(alias = "_id")]
    pub id: TripId,
    #[serde(default, alias = "clerkId", alias = "userId")]
    pub owner_id: Option<UserId>,
    pub destination: Destination,
    pub days: u8,
    pub budget: BudgetTier,
    pub trip_type: PartyType,
    pub itinerary: String,
    pub created_at: DateTime<Utc>,
}

/// Field-level edits accepted by the compose form. The location is not here:
/// it can only be committed by selecting a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Days(String),
    Budget(BudgetTier),
    PartyType(PartyType),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub location: Option<Location>,
    pub days: Option<String>,
    pub budget: Option<BudgetTier>,
    pub party_type: Option<PartyType>,
}

impl FormState {
    pub fn apply(&mut self, field: FormField) {
        match field {
            FormField::Days(raw) => self.days = Some(raw),
            FormField::Budget(tier) => self.budget = Some(tier),
            FormField::PartyType(party) => self.party_type = Some(party),
        }
    }

    pub fn validate(&self) -> Result<TripRequest, ValidationError> {
        let days_raw = self
            .days
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty());

        let mut missing = Vec::new();
        if self.location.is_none() {
            missing.push("location");
        }
        if days_raw.is_none() {
            missing.push("days");
        }
        if self.budget.is_none() {
            missing.push("budget");
        }
        if self.party_type.is_none() {
            missing.push("party_type");
        }

        let (Some(location), Some(days_raw), Some(budget), Some(party_type)) =
            (&self.location, days_raw, self.budget, self.party_type)
        else {
            return Err(ValidationError::MissingFields { missing });
        };

        let days = days_raw
            .parse::<i64>()
            .ok()
            .filter(|days| (i64::from(MIN_TRIP_DAYS)..=i64::from(MAX_TRIP_DAYS)).contains(days))
            .ok_or_else(|| ValidationError::DaysOutOfRange {
                value: days_raw.to_string(),
            })?;

        Ok(TripRequest {
            location: location.clone(),
            days: days as u8,
            budget,
            party_type,
        })
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub location: Location,
    pub days: u8,
    pub budget: BudgetTier,
    pub party_type: PartyType,
}
