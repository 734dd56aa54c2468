use std::{collections::HashMap, fs, path::Path, str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "planner.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub geocoding_url: String,
    pub generative_endpoint: String,
    pub generative_api_key: Option<String>,
    pub backend_url: String,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub invalidate_plan_on_edit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geocoding_url: "https://nominatim.openstreetmap.org".into(),
            generative_endpoint:
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
                    .into(),
            generative_api_key: None,
            backend_url: "http://localhost:5000".into(),
            search_debounce_ms: 500,
            request_timeout_secs: 60,
            user_agent: concat!("trip-planner/", env!("CARGO_PKG_VERSION")).into(),
            invalidate_plan_on_edit: true,
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Defaults, then `planner.toml` in the working directory if present, then
/// environment overrides.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_file_overrides(&mut settings, &file_cfg),
            Err(error) => warn!(file = DEFAULT_SETTINGS_FILE, %error, "ignoring unreadable settings file"),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Like [`load_settings`] but the file is mandatory and must parse.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, &file_cfg);
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("geocoding_url") {
        settings.geocoding_url = v.clone();
    }
    if let Some(v) = file_cfg.get("generative_endpoint") {
        settings.generative_endpoint = v.clone();
    }
    if let Some(v) = file_cfg.get("generative_api_key") {
        settings.generative_api_key = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("backend_url") {
        settings.backend_url = v.clone();
    }
    if let Some(v) = file_cfg.get("user_agent") {
        settings.user_agent = v.clone();
    }
    if let Some(v) = file_cfg.get("search_debounce_ms") {
        set_parsed(&mut settings.search_debounce_ms, "search_debounce_ms", v);
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        set_parsed(&mut settings.request_timeout_secs, "request_timeout_secs", v);
    }
    if let Some(v) = file_cfg.get("invalidate_plan_on_edit") {
        set_parsed(&mut settings.invalidate_plan_on_edit, "invalidate_plan_on_edit", v);
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("GEOCODING_URL") {
        settings.geocoding_url = v;
    }
    if let Some(v) = lookup("APP__GEOCODING_URL") {
        settings.geocoding_url = v;
    }

    if let Some(v) = lookup("GEMINI_ENDPOINT") {
        settings.generative_endpoint = v;
    }
    if let Some(v) = lookup("APP__GEMINI_ENDPOINT") {
        settings.generative_endpoint = v;
    }

    if let Some(v) = lookup("GEMINI_API_KEY") {
        settings.generative_api_key = Some(v);
    }
    if let Some(v) = lookup("VITE_GEMINI_API_KEY") {
        settings.generative_api_key = Some(v);
    }
    if let Some(v) = lookup("APP__GEMINI_API_KEY") {
        settings.generative_api_key = Some(v);
    }

    if let Some(v) = lookup("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = lookup("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = lookup("APP__USER_AGENT") {
        settings.user_agent = v;
    }

    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS") {
        set_parsed(&mut settings.search_debounce_ms, "APP__SEARCH_DEBOUNCE_MS", &v);
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        set_parsed(&mut settings.request_timeout_secs, "APP__REQUEST_TIMEOUT_SECS", &v);
    }
    if let Some(v) = lookup("APP__INVALIDATE_PLAN_ON_EDIT") {
        set_parsed(
            &mut settings.invalidate_plan_on_edit,
            "APP__INVALIDATE_PLAN_ON_EDIT",
            &v,
        );
    }

    if settings
        .generative_api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty())
    {
        settings.generative_api_key = None;
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = raw, "ignoring unparseable setting override"),
    }
}
