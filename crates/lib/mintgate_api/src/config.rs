//! API server configuration.

/// Configuration for the API layer.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Block explorer base URL used to build token links in responses.
    pub explorer_base_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable            | Default                |
    /// |---------------------|------------------------|
    /// | `EXPLORER_BASE_URL` | `https://basescan.org` |
    pub fn from_env() -> Self {
        Self {
            explorer_base_url: std::env::var("EXPLORER_BASE_URL")
                .unwrap_or_else(|_| "https://basescan.org".into()),
        }
    }

    /// Explorer link for a token contract address.
    pub fn explorer_token_url(&self, token_address: &str) -> String {
        format!(
            "{}/token/{token_address}",
            self.explorer_base_url.trim_end_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            explorer_base_url: "https://basescan.org".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_explorer_links_without_double_slashes() {
        let config = ApiConfig {
            explorer_base_url: "https://basescan.org/".into(),
        };
        assert_eq!(
            config.explorer_token_url("0x8617E340B3D01FA5F11F306F4090FD50E238070D"),
            "https://basescan.org/token/0x8617E340B3D01FA5F11F306F4090FD50E238070D"
        );
    }
}
