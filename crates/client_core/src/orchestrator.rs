use std::{sync::Arc, time::Duration};

use anyhow::Result;
use shared::{
    domain::{FormField, FormState, Identity, Suggestion, TripId, TripPlan},
    error::{Service, TripError},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    config::Settings,
    events::{ComposerEvent, Operation},
    generation::{generate_plan, GeminiClient, GeneratedPlan},
    geocoding::NominatimClient,
    persistence::{check_preconditions, persist_trip, HttpTripBackend},
    resolver::LocationResolver,
    GeocodingProvider, ItineraryGenerator, TripBackend,
};

const EVENT_BUFFER: usize = 256;

/// Where the compose-a-trip session stands. `Failed` behaves like `Idle` for
/// every intent; it only records that the last operation ended in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Generating,
    Generated,
    Saving,
    Saved,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ComposerOptions {
    pub quiet_period: Duration,
    pub invalidate_plan_on_edit: bool,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            invalidate_plan_on_edit: true,
        }
    }
}

impl From<&Settings> for ComposerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            quiet_period: settings.search_debounce(),
            invalidate_plan_on_edit: settings.invalidate_plan_on_edit,
        }
    }
}

/// Read-only view for rendering.
#[derive(Debug, Clone)]
pub struct ComposerSnapshot {
    pub form: FormState,
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub plan: Option<TripPlan>,
    pub phase: Phase,
    pub generating: bool,
    pub saving: bool,
    pub error: Option<TripError>,
    pub last_saved: Option<TripId>,
}

impl ComposerSnapshot {
    pub fn is_busy(&self) -> bool {
        self.generating || self.saving
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

struct ComposerState {
    form: FormState,
    generated: Option<GeneratedPlan>,
    phase: Phase,
    generating: bool,
    saving: bool,
    error: Option<TripError>,
    last_saved: Option<TripId>,
    /// Bumped on every form edit; a generation started at an older revision
    /// no longer describes the form.
    form_revision: u64,
}

impl ComposerState {
    fn is_busy(&self) -> bool {
        self.generating || self.saving
    }
}

/// Owns the form, the current plan and the busy/error slots. Front ends only
/// read snapshots and call the intent methods.
pub struct TripComposer {
    resolver: LocationResolver,
    generator: Arc<dyn ItineraryGenerator>,
    backend: Arc<dyn TripBackend>,
    options: ComposerOptions,
    inner: Mutex<ComposerState>,
    events: broadcast::Sender<ComposerEvent>,
}

impl TripComposer {
    pub fn from_settings(settings: &Settings) -> Result<Arc<Self>> {
        Ok(Self::new_with_dependencies(
            Arc::new(NominatimClient::from_settings(settings)?),
            Arc::new(GeminiClient::from_settings(settings)?),
            Arc::new(HttpTripBackend::from_settings(settings)?),
            ComposerOptions::from(settings),
        ))
    }

    pub fn new_with_dependencies(
        geocoder: Arc<dyn GeocodingProvider>,
        generator: Arc<dyn ItineraryGenerator>,
        backend: Arc<dyn TripBackend>,
        options: ComposerOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Arc::new(Self {
            resolver: LocationResolver::new(geocoder, options.quiet_period, events.clone()),
            generator,
            backend,
            options,
            inner: Mutex::new(ComposerState {
                form: FormState::default(),
                generated: None,
                phase: Phase::Idle,
                generating: false,
                saving: false,
                error: None,
                last_saved: None,
                form_revision: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ComposerEvent> {
        self.events.subscribe()
    }

    pub fn backend(&self) -> Arc<dyn TripBackend> {
        Arc::clone(&self.backend)
    }

    pub async fn snapshot(&self) -> ComposerSnapshot {
        let query = self.resolver.query().await;
        let suggestions = self.resolver.suggestions().await;
        let state = self.inner.lock().await;
        ComposerSnapshot {
            form: state.form.clone(),
            query,
            suggestions,
            plan: state.generated.as_ref().map(|generated| generated.plan.clone()),
            phase: state.phase,
            generating: state.generating,
            saving: state.saving,
            error: state.error.clone(),
            last_saved: state.last_saved.clone(),
        }
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.lock().await.is_busy()
    }

    pub async fn set_field(&self, field: FormField) {
        let mut state = self.inner.lock().await;
        state.error = None;
        state.form.apply(field);
        state.form_revision += 1;
        self.invalidate_plan(&mut state);
    }

    pub async fn set_query_text(&self, text: &str) {
        self.inner.lock().await.error = None;
        self.resolver.set_query_text(text).await;
    }

    pub async fn select_suggestion(&self, suggestion: &Suggestion) {
        let location = self.resolver.select_suggestion(suggestion).await;
        let mut state = self.inner.lock().await;
        state.error = None;
        state.form.location = Some(location);
        state.form_revision += 1;
        self.invalidate_plan(&mut state);
    }

    /// Validates the form and requests an itinerary. Overwrites any previous
    /// plan. The request runs on its own task, so dropping the returned future
    /// does not cancel it or leave the busy flag set.
    ///
    /// If the form is edited while the request is in flight and plans are
    /// invalidated on edit, the generated plan is still returned but not kept.
    pub async fn generate(self: &Arc<Self>) -> Result<TripPlan, TripError> {
        let (request, revision) = {
            let mut state = self.inner.lock().await;
            if state.is_busy() {
                return Err(TripError::Busy);
            }
            state.error = None;
            self.set_phase(&mut state, Phase::Validating);

            let request = match state.form.validate() {
                Ok(request) => request,
                Err(err) => return Err(self.fail(&mut state, Operation::Generate, err.into())),
            };

            state.generated = None;
            state.generating = true;
            self.set_phase(&mut state, Phase::Generating);
            (request, state.form_revision)
        };

        let composer = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = generate_plan(composer.generator.as_ref(), request).await;
            composer.finish_generation(outcome, revision).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let err = TripError::network(
                    Service::Generative,
                    format!("generation task ended abnormally: {join_err}"),
                );
                self.finish_generation(Err(err), revision).await
            }
        }
    }

    async fn finish_generation(
        &self,
        outcome: Result<GeneratedPlan, TripError>,
        revision: u64,
    ) -> Result<TripPlan, TripError> {
        let mut state = self.inner.lock().await;
        debug_assert!(state.generating, "generation settled twice");
        state.generating = false;

        match outcome {
            Ok(generated)
                if self.options.invalidate_plan_on_edit && state.form_revision != revision =>
            {
                debug!(
                    started_at = revision,
                    current = state.form_revision,
                    "form edited during generation; plan not kept"
                );
                self.set_phase(&mut state, Phase::Idle);
                Ok(generated.plan)
            }
            Ok(generated) => {
                let plan = generated.plan.clone();
                state.generated = Some(generated);
                self.set_phase(&mut state, Phase::Generated);
                let _ = self.events.send(ComposerEvent::PlanReady(plan.clone()));
                Ok(plan)
            }
            Err(err) => Err(self.fail(&mut state, Operation::Generate, err)),
        }
    }

    /// Syncs `identity` with the backend and saves the current plan. Yields
    /// the server-assigned trip id.
    pub async fn save(self: &Arc<Self>, identity: Option<&Identity>) -> Result<TripId, TripError> {
        let (identity, generated) = {
            let mut state = self.inner.lock().await;
            if state.is_busy() {
                return Err(TripError::Busy);
            }
            state.error = None;

            let checked = check_preconditions(identity, state.generated.as_ref())
                .map(|(identity, generated)| (identity.clone(), generated.clone()));
            let (identity, generated) = match checked {
                Ok(pair) => pair,
                Err(err) => return Err(self.fail(&mut state, Operation::Save, err)),
            };

            state.saving = true;
            self.set_phase(&mut state, Phase::Saving);
            (identity, generated)
        };

        let composer = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome =
                persist_trip(composer.backend.as_ref(), Some(&identity), Some(&generated)).await;
            composer.finish_save(outcome).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let err = TripError::network(
                    Service::Backend,
                    format!("save task ended abnormally: {join_err}"),
                );
                self.finish_save(Err(err)).await
            }
        }
    }

    async fn finish_save(&self, outcome: Result<TripId, TripError>) -> Result<TripId, TripError> {
        let mut state = self.inner.lock().await;
        debug_assert!(state.saving, "save settled twice");
        state.saving = false;

        match outcome {
            Ok(trip_id) => {
                state.last_saved = Some(trip_id.clone());
                self.set_phase(&mut state, Phase::Saved);
                let _ = self.events.send(ComposerEvent::TripSaved(trip_id.clone()));
                Ok(trip_id)
            }
            Err(err) => Err(self.fail(&mut state, Operation::Save, err)),
        }
    }

    fn invalidate_plan(&self, state: &mut ComposerState) {
        if !self.options.invalidate_plan_on_edit || state.generated.is_none() {
            return;
        }
        debug!("form edited after generation; dropping plan");
        state.generated = None;
        if !state.is_busy() {
            self.set_phase(state, Phase::Idle);
        }
    }

    fn set_phase(&self, state: &mut ComposerState, phase: Phase) {
        if state.phase != phase {
            state.phase = phase;
            let _ = self.events.send(ComposerEvent::PhaseChanged(phase));
        }
    }

    fn fail(&self, state: &mut ComposerState, operation: Operation, err: TripError) -> TripError {
        warn!(?operation, category = ?err.category(), error = %err, "trip operation failed");
        state.error = Some(err.clone());
        self.set_phase(state, Phase::Failed);
        let _ = self.events.send(ComposerEvent::OperationFailed {
            operation,
            error: err.clone(),
        });
        err
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
