//! Policy and collaborator configuration.
//!
//! All values are validated at construction so a misconfigured server
//! fails at startup, not on the first request.

use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;
use url::Url;

/// Default timeout for JSON-RPC balance reads.
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for deploy relay calls. Submission waits for the
/// transaction to confirm, so this is deliberately generous.
const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors produced by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NonPositiveWindow(&'static str),

    #[error("nonce_max_age_secs ({nonce_max_age_secs}) must be at least freshness_window_secs ({freshness_window_secs})")]
    NonceAgeBelowWindow {
        nonce_max_age_secs: i64,
        freshness_window_secs: i64,
    },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Replay-protection windows, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// Maximum age of a request timestamp before it is rejected as expired.
    pub freshness_window_secs: i64,
    /// Tolerated clock skew for timestamps ahead of server time.
    pub future_tolerance_secs: i64,
    /// Age at which consumed nonces are evicted from the registry.
    pub nonce_max_age_secs: i64,
}

impl AuthConfig {
    pub const DEFAULT_FRESHNESS_WINDOW_SECS: i64 = 300;
    pub const DEFAULT_FUTURE_TOLERANCE_SECS: i64 = 60;
    pub const DEFAULT_NONCE_MAX_AGE_SECS: i64 = 600;

    /// Build a validated window configuration.
    ///
    /// The nonce max age must cover the freshness window: a nonce evicted
    /// while its request is still fresh would reopen the replay window.
    pub fn new(
        freshness_window_secs: i64,
        future_tolerance_secs: i64,
        nonce_max_age_secs: i64,
    ) -> Result<Self, ConfigError> {
        if freshness_window_secs <= 0 {
            return Err(ConfigError::NonPositiveWindow("freshness_window_secs"));
        }
        if future_tolerance_secs < 0 {
            return Err(ConfigError::NonPositiveWindow("future_tolerance_secs"));
        }
        if nonce_max_age_secs < freshness_window_secs {
            return Err(ConfigError::NonceAgeBelowWindow {
                nonce_max_age_secs,
                freshness_window_secs,
            });
        }
        Ok(Self {
            freshness_window_secs,
            future_tolerance_secs,
            nonce_max_age_secs,
        })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: Self::DEFAULT_FRESHNESS_WINDOW_SECS,
            future_tolerance_secs: Self::DEFAULT_FUTURE_TOLERANCE_SECS,
            nonce_max_age_secs: Self::DEFAULT_NONCE_MAX_AGE_SECS,
        }
    }
}

/// Eligibility threshold policy.
///
/// The minimum balance is `10^(decimals - min_balance_fraction_digits)`
/// base units: with the default of 2, holding 0.01 of the asset qualifies.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityConfig {
    /// Fractional digits of the asset the minimum represents.
    pub min_balance_fraction_digits: u8,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_balance_fraction_digits: 2,
        }
    }
}

/// Where the gating asset lives and how to reach the chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint used for balance reads.
    pub rpc_url: Url,
    /// ERC-20 contract address of the gating asset.
    pub asset_token: Address,
    /// Timeout applied to each RPC request.
    pub request_timeout: Duration,
}

impl ChainConfig {
    pub fn new(rpc_url: &str, asset_token: &str) -> Result<Self, ConfigError> {
        let rpc_url = Url::parse(rpc_url).map_err(|e| ConfigError::InvalidField {
            field: "rpc_url",
            reason: e.to_string(),
        })?;
        let asset_token = asset_token
            .parse::<Address>()
            .map_err(|e| ConfigError::InvalidField {
                field: "asset_token",
                reason: e.to_string(),
            })?;
        Ok(Self {
            rpc_url,
            asset_token,
            request_timeout: DEFAULT_RPC_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Deploy relay endpoint configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base URL of the operator deploy relay.
    pub base_url: Url,
    /// Timeout applied to each relay request.
    pub request_timeout: Duration,
}

impl RelayConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidField {
            field: "relay_url",
            reason: e.to_string(),
        })?;
        // Url::join replaces the last path segment unless it ends in '/'.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            base_url,
            request_timeout: DEFAULT_RELAY_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_are_valid() {
        let config = AuthConfig::default();
        assert_eq!(config.freshness_window_secs, 300);
        assert_eq!(config.future_tolerance_secs, 60);
        assert_eq!(config.nonce_max_age_secs, 600);
        assert!(AuthConfig::new(300, 60, 600).is_ok());
    }

    #[test]
    fn auth_config_rejects_nonce_age_below_window() {
        let err = AuthConfig::new(300, 60, 299).unwrap_err();
        assert!(matches!(err, ConfigError::NonceAgeBelowWindow { .. }));
    }

    #[test]
    fn auth_config_rejects_zero_window() {
        assert!(AuthConfig::new(0, 60, 600).is_err());
        assert!(AuthConfig::new(300, -1, 600).is_err());
    }

    #[test]
    fn chain_config_parses_and_rejects() {
        let ok = ChainConfig::new(
            "https://mainnet.base.org",
            "0x4200000000000000000000000000000000000006",
        );
        assert!(ok.is_ok());

        assert!(ChainConfig::new("not a url", "0x4200000000000000000000000000000000000006").is_err());
        assert!(ChainConfig::new("https://mainnet.base.org", "0x1234").is_err());
    }

    #[test]
    fn relay_config_appends_trailing_slash() {
        let config = RelayConfig::new("https://relay.example.com/api").unwrap();
        assert_eq!(config.base_url.path(), "/api/");

        let config = RelayConfig::new("https://relay.example.com/api/").unwrap();
        assert_eq!(config.base_url.path(), "/api/");
    }
}
