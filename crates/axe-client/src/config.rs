//! Client configuration and the mock/HTTP switch.

use crate::{HttpSystemClient, MockSystemClient};
use axe_types::{ApiVersion, SystemApi, SystemApiError};
use std::sync::Arc;
use std::time::Duration;

/// Address a device serves its API on while in access-point mode.
pub const DEFAULT_BASE_URL: &str = "http://192.168.4.1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_version: ApiVersion,
    pub timeout: Duration,
    /// Serve canned data instead of talking to a device.
    pub mock: bool,
    pub mock_latency: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: ApiVersion::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            mock: false,
            mock_latency: crate::mock::DEFAULT_LATENCY,
        }
    }
}

impl ClientConfig {
    /// Read `AXE_BASE_URL`, `AXE_API_VERSION`, `AXE_TIMEOUT_SECS` and `AXE_MOCK`.
    pub fn from_env() -> Result<Self, SystemApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, SystemApiError> {
        let mut cfg = Self::default();
        if let Some(url) = get("AXE_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(v) = get("AXE_API_VERSION") {
            cfg.api_version = v.parse()?;
        }
        if let Some(secs) = get("AXE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SystemApiError::Config(format!("AXE_TIMEOUT_SECS is not a number: {:?}", secs))
            })?;
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = get("AXE_MOCK") {
            cfg.mock = parse_flag(&flag);
        }
        Ok(cfg)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Build the API backend: the mock when `mock` is set, otherwise the HTTP client.
pub fn connect(cfg: &ClientConfig) -> Result<Arc<dyn SystemApi>, SystemApiError> {
    if cfg.mock {
        tracing::info!(version = %cfg.api_version, "using mock device");
        return Ok(Arc::new(
            MockSystemClient::new(cfg.api_version).with_latency(cfg.mock_latency),
        ));
    }
    let base = cfg.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(SystemApiError::Config(format!(
            "base URL must start with http:// or https://: {:?}",
            base
        )));
    }
    tracing::debug!(base_url = base, version = %cfg.api_version, "using HTTP device client");
    Ok(Arc::new(
        HttpSystemClient::new(base, cfg.api_version).with_timeout(cfg.timeout),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.api_version, ApiVersion::V2);
        assert!(!cfg.mock);
    }

    #[test]
    fn env_overrides() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("AXE_BASE_URL", "http://bitaxe.local"),
            ("AXE_API_VERSION", "v1"),
            ("AXE_TIMEOUT_SECS", "3"),
            ("AXE_MOCK", "Yes"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://bitaxe.local");
        assert_eq!(cfg.api_version, ApiVersion::V1);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert!(cfg.mock);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("AXE_TIMEOUT_SECS", "soon")])),
            Err(SystemApiError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("AXE_API_VERSION", "v9")])),
            Err(SystemApiError::Config(_))
        ));
    }

    #[test]
    fn connect_rejects_schemeless_url() {
        let cfg = ClientConfig {
            base_url: "192.168.4.1".to_string(),
            ..Default::default()
        };
        assert!(matches!(connect(&cfg), Err(SystemApiError::Config(_))));
    }

    #[tokio::test]
    async fn connect_mock_serves_fixture() {
        let cfg = ClientConfig {
            mock: true,
            mock_latency: Duration::ZERO,
            api_version: ApiVersion::V1,
            ..Default::default()
        };
        let api = connect(&cfg).unwrap();
        let info = api.get_info().await.unwrap();
        assert_eq!(info.stratum_url, "192.168.1.242");
    }
}
