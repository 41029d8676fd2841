use crate::geo::{GeoPosition, GeolocationOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationSettings {
    /// Position reported when the host has no location hardware of its own.
    #[serde(default)]
    pub fixed_position: Option<GeoPosition>,
    #[serde(default = "default_true")]
    pub high_accuracy: bool,
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub maximum_age_ms: u64,
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            fixed_position: None,
            high_accuracy: true,
            timeout_ms: default_geo_timeout_ms(),
            maximum_age_ms: 0,
        }
    }
}

impl GeolocationSettings {
    pub fn options(&self) -> GeolocationOptions {
        GeolocationOptions {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_route_home_prompt")]
    pub route_home_prompt: String,
    #[serde(default)]
    pub suggested_prompts: Vec<String>,
    #[serde(default)]
    pub geolocation: GeolocationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            route_home_prompt: default_route_home_prompt(),
            suggested_prompts: Vec::new(),
            geolocation: GeolocationSettings::default(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api/chatbot".into()
}

fn default_route_home_prompt() -> String {
    "how to get from home to orchard".into()
}

fn default_true() -> bool {
    true
}

fn default_geo_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_take_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{"api_base_url":"http://x","route_home_prompt":"home"}"#,
        )
        .unwrap();
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.geolocation.options(), GeolocationOptions::default());
        assert!(cfg.suggested_prompts.is_empty());
    }

    #[test]
    fn empty_object_is_the_default_config() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.api_base_url, "http://localhost:5000/api/chatbot");
        assert_eq!(cfg.route_home_prompt, "how to get from home to orchard");
    }
}
