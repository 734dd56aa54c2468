use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Provider,
    Network,
    Parse,
    AuthRequired,
    MissingPlan,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Geocoding,
    Generative,
    Backend,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Geocoding => "geocoding provider",
            Service::Generative => "generative service",
            Service::Backend => "trip backend",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill all the details first.")]
    MissingFields { missing: Vec<&'static str> },
    #[error("Please enter days between 1 and 5.")]
    DaysOutOfRange { value: String },
}

/// Every failure a trip workflow can report. `Display` is the text shown to
/// the user; the structured fields are for logs and callers that branch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Configuration(String),
    #[error("API Error: {message}")]
    Provider {
        service: Service,
        status: Option<u16>,
        message: String,
    },
    #[error("A network error occurred. Please try again.")]
    Network { service: Service, detail: String },
    #[error("Unexpected response from {service}: {detail}")]
    Parse { service: Service, detail: String },
    #[error("Please sign in to save trips")]
    AuthRequired,
    #[error("Please generate a trip first")]
    MissingPlan,
    #[error("Another trip operation is still in progress")]
    Busy,
}

impl TripError {
    pub fn provider(service: Service, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn network(service: Service, detail: impl Into<String>) -> Self {
        Self::Network {
            service,
            detail: detail.into(),
        }
    }

    pub fn parse(service: Service, detail: impl Into<String>) -> Self {
        Self::Parse {
            service,
            detail: detail.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TripError::Validation(_) => ErrorCategory::Validation,
            TripError::Configuration(_) => ErrorCategory::Configuration,
            TripError::Provider { .. } => ErrorCategory::Provider,
            TripError::Network { .. } => ErrorCategory::Network,
            TripError::Parse { .. } => ErrorCategory::Parse,
            TripError::AuthRequired => ErrorCategory::AuthRequired,
            TripError::MissingPlan => ErrorCategory::MissingPlan,
            TripError::Busy => ErrorCategory::Busy,
        }
    }

    /// True for failures detected before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TripError::Validation(_)
                | TripError::Configuration(_)
                | TripError::AuthRequired
                | TripError::MissingPlan
                | TripError::Busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_user_facing_copy() {
        let err = TripError::from(ValidationError::DaysOutOfRange {
            value: "7".to_string(),
        });
        assert_eq!(err.to_string(), "Please enter days between 1 and 5.");
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = TripError::provider(Service::Generative, Some(400), "API key not valid");
        assert_eq!(err.to_string(), "API Error: API key not valid");
        assert!(!err.is_local());
    }

    #[test]
    fn local_errors_are_flagged() {
        assert!(TripError::AuthRequired.is_local());
        assert!(TripError::Configuration("missing key".into()).is_local());
        assert!(!TripError::network(Service::Backend, "connection refused").is_local());
    }
}
