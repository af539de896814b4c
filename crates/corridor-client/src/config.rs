//! Client configuration with environment overrides.

use std::{env, time::Duration};

use crate::ledger::LedgerNetwork;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_millis(1_500);

pub const ENV_API_URL: &str = "CORRIDOR_API_URL";
pub const ENV_NETWORK: &str = "CORRIDOR_XRPL_NETWORK";
pub const ENV_XAMAN_API_KEY: &str = "CORRIDOR_XAMAN_API_KEY";
pub const ENV_WALLETCONNECT_PROJECT_ID: &str = "CORRIDOR_WC_PROJECT_ID";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "CORRIDOR_CONNECT_TIMEOUT_MS";

/// Timing knobs for the wallet session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// A connect attempt still pending after this long is abandoned.
    pub connect_timeout: Duration,
    /// How long a connect may stay pending after the host regains focus before
    /// it is treated as a user cancellation.
    pub cancel_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            cancel_grace: DEFAULT_CANCEL_GRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Which wallet backends are offered. The browser extension is always offered;
/// the others need their credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterRegistryConfig {
    pub network: LedgerNetwork,
    pub xaman_api_key: Option<String>,
    pub walletconnect_project_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub adapters: AdapterRegistryConfig,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(url) = get(ENV_API_URL) {
            config.api.base_url = url;
        }
        if let Some(network) = get(ENV_NETWORK) {
            config.adapters.network = LedgerNetwork::from_name(&network);
        }
        config.adapters.xaman_api_key = get(ENV_XAMAN_API_KEY);
        config.adapters.walletconnect_project_id = get(ENV_WALLETCONNECT_PROJECT_ID);
        match get(ENV_CONNECT_TIMEOUT_MS).map(|ms| ms.parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => config.session.connect_timeout = Duration::from_millis(ms),
            Some(_) => tracing::warn!(
                key = ENV_CONNECT_TIMEOUT_MS,
                "ignoring invalid connect timeout, using default"
            ),
            None => {}
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{ClientConfig, DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT};
    use crate::ledger::LedgerNetwork;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.session.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.session.cancel_grace, Duration::from_millis(1_500));
        assert_eq!(config.adapters.network, LedgerNetwork::Testnet);
        assert!(config.adapters.xaman_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CORRIDOR_API_URL", "https://api.corridor.example"),
            ("CORRIDOR_XRPL_NETWORK", "devnet"),
            ("CORRIDOR_XAMAN_API_KEY", "key-123"),
            ("CORRIDOR_WC_PROJECT_ID", "  "),
            ("CORRIDOR_CONNECT_TIMEOUT_MS", "2500"),
        ]));
        assert_eq!(config.api.base_url, "https://api.corridor.example");
        assert_eq!(config.adapters.network, LedgerNetwork::Devnet);
        assert_eq!(config.adapters.xaman_api_key.as_deref(), Some("key-123"));
        assert!(config.adapters.walletconnect_project_id.is_none());
        assert_eq!(config.session.connect_timeout, Duration::from_millis(2_500));
    }

    #[test]
    fn bad_timeout_keeps_default() {
        let config = ClientConfig::from_lookup(lookup(&[("CORRIDOR_CONNECT_TIMEOUT_MS", "soon")]));
        assert_eq!(config.session.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
