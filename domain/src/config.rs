//! Client configuration injected into every service and view.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ServiceError;

/// Connection and presentation settings of the web client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the hosted backend, without a trailing slash
    pub supabase_url: String,
    /// Public (anonymous) API key sent with every request
    pub anon_key: String,
    /// Path the OAuth provider redirects back to
    pub oauth_callback_path: String,
    pub toast_duration_ms: u32,
    /// Hourly booking slots offered on the booking page, `HH:MM`
    pub time_slots: Vec<String>,
    pub analytics_default_days: i64,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            oauth_callback_path: "/auth/callback".to_string(),
            toast_duration_ms: 4000,
            time_slots: (9..=17).map(|hour| format!("{:02}:00", hour)).collect(),
            analytics_default_days: 30,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Apply optional overrides (typically compile-time environment values)
    pub fn with_overrides(
        mut self,
        supabase_url: Option<&str>,
        anon_key: Option<&str>,
        log_level: Option<&str>,
    ) -> Self {
        if let Some(url) = supabase_url.filter(|v| !v.is_empty()) {
            self.supabase_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = anon_key.filter(|v| !v.is_empty()) {
            self.anon_key = key.to_string();
        }
        if let Some(level) = log_level.filter(|v| !v.is_empty()) {
            self.log_level = level.to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if !(self.supabase_url.starts_with("http://") || self.supabase_url.starts_with("https://")) {
            return Err(ServiceError::Validation(format!(
                "Invalid backend URL: {}",
                self.supabase_url
            )));
        }
        if self.time_slots.is_empty() {
            return Err(ServiceError::Validation("No booking time slots configured".to_string()));
        }
        if self.analytics_default_days <= 0 {
            return Err(ServiceError::Validation(
                "Analytics range must be at least one day".to_string(),
            ));
        }
        self.log_level_filter()?;
        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ServiceError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ServiceError::Validation(format!("Invalid log level: {}", self.log_level)))
    }

    /// Absolute URL the OAuth provider should send the user back to
    pub fn oauth_redirect_url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.oauth_callback_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(config.time_slots.last().map(String::as_str), Some("17:00"));
        assert_eq!(config.time_slots.len(), 9);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default().with_overrides(
            Some("https://abc.supabase.co/"),
            Some("anon"),
            None,
        );
        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ClientConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_overrides(Some("ftp://nope"), None, None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oauth_redirect_url() {
        let config = ClientConfig::default();
        assert_eq!(
            config.oauth_redirect_url("https://app.example.com/"),
            "https://app.example.com/auth/callback"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"supabase_url":"https://x.supabase.co"}"#).unwrap();
        assert_eq!(config.analytics_default_days, 30);
        assert_eq!(config.oauth_callback_path, "/auth/callback");
    }
}
