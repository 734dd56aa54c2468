//! Trailing-edge debounced place search.
//!
//! Each keystroke cancels the pending quiet-period timer and arms a new one.
//! When a timer fires it takes the next query token and issues one search;
//! the response is applied only if no newer query was dispatched (or the
//! query cleared) in the meantime.

use std::{sync::Arc, time::Duration};

use shared::domain::{Location, Suggestion};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{events::ComposerEvent, GeocodingProvider};

#[derive(Default)]
struct ResolverState {
    query: String,
    suggestions: Vec<Suggestion>,
    pending_timer: Option<JoinHandle<()>>,
    latest_token: u64,
}

impl ResolverState {
    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            timer.abort();
        }
    }

    /// Makes every in-flight search stale.
    fn invalidate_in_flight(&mut self) {
        self.latest_token += 1;
    }
}

pub struct LocationResolver {
    provider: Arc<dyn GeocodingProvider>,
    quiet_period: Duration,
    inner: Arc<Mutex<ResolverState>>,
    events: broadcast::Sender<ComposerEvent>,
}

impl LocationResolver {
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        quiet_period: Duration,
        events: broadcast::Sender<ComposerEvent>,
    ) -> Self {
        Self {
            provider,
            quiet_period,
            inner: Arc::new(Mutex::new(ResolverState::default())),
            events,
        }
    }

    pub async fn query(&self) -> String {
        self.inner.lock().await.query.clone()
    }

    pub async fn suggestions(&self) -> Vec<Suggestion> {
        self.inner.lock().await.suggestions.clone()
    }

    pub async fn set_query_text(&self, text: &str) {
        let mut state = self.inner.lock().await;
        state.query = text.to_string();
        state.cancel_pending();

        if text.trim().is_empty() {
            state.invalidate_in_flight();
            if !state.suggestions.is_empty() {
                state.suggestions.clear();
                let _ = self.events.send(ComposerEvent::SuggestionsUpdated(Vec::new()));
            }
            return;
        }

        let query = text.to_string();
        let inner = Arc::clone(&self.inner);
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        let quiet_period = self.quiet_period;

        // The handle is stored before the lock is released, so the task cannot
        // observe `pending_timer` without its own handle in it.
        state.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;

            let token = {
                let mut state = inner.lock().await;
                // Past this point the search is in flight and no longer cancellable.
                state.pending_timer = None;
                state.latest_token += 1;
                state.latest_token
            };

            debug!(token, query = %query, "dispatching place search");
            match provider.search(&query).await {
                Ok(suggestions) => {
                    let mut state = inner.lock().await;
                    if state.latest_token != token {
                        debug!(
                            token,
                            latest = state.latest_token,
                            query = %query,
                            "discarding stale place search response"
                        );
                        return;
                    }
                    state.suggestions = suggestions.clone();
                    let _ = events.send(ComposerEvent::SuggestionsUpdated(suggestions));
                }
                Err(error) => {
                    warn!(query = %query, %error, "place search failed; keeping previous suggestions");
                    if inner.lock().await.latest_token == token {
                        let _ = events.send(ComposerEvent::SearchFailed { query, error });
                    }
                }
            }
        }));
    }

    /// Adopts `suggestion` as the query text and clears the list. Pending and
    /// in-flight searches are dropped so the list stays closed.
    pub async fn select_suggestion(&self, suggestion: &Suggestion) -> Location {
        let mut state = self.inner.lock().await;
        state.cancel_pending();
        state.invalidate_in_flight();
        state.query = suggestion.display_name.clone();
        state.suggestions.clear();
        let _ = self.events.send(ComposerEvent::SuggestionsUpdated(Vec::new()));
        suggestion.to_location()
    }
}

impl Drop for LocationResolver {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.try_lock() {
            state.cancel_pending();
        }
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
