use std::{fs, path::Path, time::Duration};

use client_core::{DEFAULT_DECK_API_URL, DEFAULT_REQUEST_TIMEOUT};
use tracing::warn;

pub const SETTINGS_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub deck_api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deck_api_url: DEFAULT_DECK_API_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Command-line flags take precedence over everything else.
    pub fn with_overrides(mut self, deck_api_url: Option<String>, timeout_secs: Option<u64>) -> Self {
        if let Some(url) = deck_api_url {
            self.deck_api_url = url;
        }
        if let Some(secs) = timeout_secs {
            self.request_timeout_secs = secs;
        }
        self
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(file: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match raw.parse::<toml::Table>() {
            Ok(file_cfg) => {
                match file_cfg.get("deck_api_url") {
                    Some(toml::Value::String(v)) => settings.deck_api_url = v.clone(),
                    Some(other) => warn!(value = %other, "ignoring non-string deck_api_url"),
                    None => {}
                }
                match file_cfg.get("request_timeout_secs") {
                    Some(toml::Value::Integer(secs)) => match u64::try_from(*secs) {
                        Ok(secs) => settings.request_timeout_secs = secs,
                        Err(_) => warn!(value = *secs, "ignoring negative request timeout"),
                    },
                    Some(toml::Value::String(v)) => apply_timeout(&mut settings, v),
                    Some(other) => warn!(value = %other, "ignoring invalid request timeout"),
                    None => {}
                }
            }
            Err(error) => warn!(file = %file.display(), %error, "ignoring unreadable settings file"),
        }
    }

    let lookup = |name: &str| env(&format!("APP__{name}")).or_else(|| env(name));
    if let Some(v) = lookup("DECK_API_URL") {
        settings.deck_api_url = v;
    }
    if let Some(v) = lookup("DECK_API_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(secs) => settings.request_timeout_secs = secs,
        Err(error) => warn!(value = raw, %error, "ignoring invalid request timeout"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
