//! Notifications for front ends bound to a [`crate::TripComposer`].

use shared::{
    domain::{Suggestion, TripId, TripPlan},
    error::TripError,
};

use crate::orchestrator::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Save,
}

#[derive(Debug, Clone)]
pub enum ComposerEvent {
    SuggestionsUpdated(Vec<Suggestion>),
    /// The latest search failed; the previous suggestions are still shown.
    SearchFailed {
        query: String,
        error: TripError,
    },
    PhaseChanged(Phase),
    PlanReady(TripPlan),
    TripSaved(TripId),
    OperationFailed {
        operation: Operation,
        error: TripError,
    },
}
