use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::network::{ReconnectPolicy, SenderTags};

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.json";
pub const DEFAULT_ENDPOINT: &str = "https://bakklovechat-production.up.railway.app/";
pub const ENDPOINT_ENV: &str = "RELAY_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    /// Tag the relay puts on messages written by this user.
    pub local_sender_tag: String,
    pub remote_sender_tag: String,
    /// `false` makes the host refuse every notification.
    pub notifications: bool,
    /// 0 = giữ nguyên hành vi gốc, không tự kết nối lại.
    pub reconnect_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            local_sender_tag: "other".to_string(),
            remote_sender_tag: "peer".to_string(),
            notifications: true,
            reconnect_attempts: 0,
        }
    }
}

impl AppConfig {
    pub fn sender_tags(&self) -> SenderTags {
        SenderTags {
            local: self.local_sender_tag.clone(),
            remote: self.remote_sender_tag.clone(),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|err| {
            log::warn!("Failed to parse config file {}: {err}", path.display());
            AppConfig::default()
        }),
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

fn parse_config(content: &str) -> serde_json::Result<AppConfig> {
    serde_json::from_str(content)
}

/// CLI flag wins over `RELAY_ENDPOINT`, which wins over the file.
pub fn resolve_endpoint(config: &mut AppConfig, cli_endpoint: Option<String>) {
    let from_env = std::env::var(ENDPOINT_ENV).ok().filter(|v| !v.trim().is_empty());
    if let Some(endpoint) = cli_endpoint.or(from_env) {
        log::info!("Using relay endpoint override {endpoint}");
        config.endpoint = endpoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = parse_config(r#"{"endpoint": "http://localhost:3000"}"#).unwrap();
        assert_eq!(config.endpoint, "http://localhost:3000");
        assert_eq!(config.local_sender_tag, "other");
        assert!(config.notifications);
        assert_eq!(config.reconnect_attempts, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_config("{ endpoint: nope").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("definitely/not/here.json");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn cli_endpoint_overrides_file() {
        let mut config = AppConfig::default();
        resolve_endpoint(&mut config, Some("http://127.0.0.1:9000".to_string()));
        assert_eq!(config.endpoint, "http://127.0.0.1:9000");
    }

    #[test]
    fn derived_settings_follow_fields() {
        let config = AppConfig {
            local_sender_tag: "me".to_string(),
            reconnect_attempts: 3,
            ..Default::default()
        };
        assert_eq!(config.sender_tags().local, "me");
        assert_eq!(config.reconnect_policy().max_attempts, 3);
    }
}
