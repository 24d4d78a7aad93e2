//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Notification gateway configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expires_minutes: i64,
}

fn default_access_token_expiry() -> i64 {
    60
}

/// SMS/WhatsApp notification gateway configuration.
///
/// When `account_sid` or `auth_token` is missing the service runs in
/// log-only mode and no outbound calls are made.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// Gateway account identifier.
    #[serde(default)]
    pub account_sid: Option<String>,
    /// Gateway auth token.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Sender phone number for SMS.
    #[serde(default)]
    pub from_number: Option<String>,
    /// Sender phone number for WhatsApp.
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MILKBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl NotifyConfig {
    /// Returns true if gateway credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(
            (&self.account_sid, &self.auth_token),
            (Some(sid), Some(token)) if !sid.is_empty() && !token.is_empty()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_config_unconfigured_by_default() {
        let config = NotifyConfig::default();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_notify_config_requires_both_credentials() {
        let config = NotifyConfig {
            account_sid: Some("AC123".into()),
            auth_token: None,
            from_number: None,
            whatsapp_number: None,
        };
        assert!(!config.is_configured());

        let config = NotifyConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("secret".into()),
            from_number: None,
            whatsapp_number: None,
        };
        assert!(config.is_configured());
    }
}
