use std::env;
use std::fmt;
use std::path::PathBuf;

use signsprout_contracts::models::DEFAULT_MODEL;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment keys checked for the API credential, first non-empty wins.
pub const CREDENTIAL_ENV_KEYS: &[&str] = &["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const API_BASE_ENV_KEY: &str = "GEMINI_API_BASE";
pub const MODEL_ENV_KEY: &str = "SIGNSPROUT_MODEL";
pub const EVENTS_ENV_KEY: &str = "SIGNSPROUT_EVENTS";

/// Startup configuration for the content service. A missing credential is a
/// supported state: every operation then serves its fallback.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub events_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            events_path: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("events_path", &self.events_path)
            .finish()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = CREDENTIAL_ENV_KEYS.iter().find_map(|key| non_empty(*key));
        let api_base = non_empty(API_BASE_ENV_KEY)
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = non_empty(MODEL_ENV_KEY).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let events_path = non_empty(EVENTS_ENV_KEY).map(PathBuf::from);

        Self {
            api_key,
            api_base,
            model,
            events_path,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Drops the credential so every operation serves its fallback.
    pub fn offline(mut self) -> Self {
        self.api_key = None;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_events_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.events_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_unconfigured_with_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert!(!config.has_credential());
    }

    #[test]
    fn credential_keys_are_checked_in_order_and_blank_values_skipped() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("API_KEY", "   "),
            ("GEMINI_API_KEY", "gem-key"),
            ("GOOGLE_API_KEY", "google-key"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gem-key"));
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_BASE", "http://127.0.0.1:9000/v1beta/"),
            ("SIGNSPROUT_MODEL", "gemini-2.5-pro"),
            ("SIGNSPROUT_EVENTS", "/tmp/signsprout/events.jsonl"),
        ]));
        assert_eq!(config.api_base, "http://127.0.0.1:9000/v1beta");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(
            config.events_path,
            Some(PathBuf::from("/tmp/signsprout/events.jsonl"))
        );
    }

    #[test]
    fn offline_drops_credential_and_debug_redacts_it() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("API_KEY", "secret-value")]));
        assert!(!format!("{config:?}").contains("secret-value"));
        assert!(!config.offline().has_credential());
    }
}
