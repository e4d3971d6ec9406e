//! Request validation for token deployment bodies.
//!
//! Structural checks are already done by serde; this module enforces the
//! value constraints, naming the offending field in the error message.

use alloy_primitives::Address;
use mintgate_core::models::{FeesConfig, TokenConfig};
use url::Url;

use crate::error::AppError;

const MAX_NAME_CHARS: usize = 50;
const MAX_SYMBOL_CHARS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_VAULT_PERCENTAGE: u8 = 30;
const MERKLE_ROOT_CHARS: usize = 66;

/// Parse an EVM address, naming the field on failure.
pub fn parse_address(value: &str, field: &str) -> Result<Address, AppError> {
    value
        .parse::<Address>()
        .map_err(|_| AppError::Validation(format!("{field} is not a valid address")))
}

/// Validate a deployment config against the schema limits.
pub fn validate_token_config(config: &TokenConfig) -> Result<(), AppError> {
    let name_chars = config.name.chars().count();
    if name_chars == 0 || name_chars > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "tokenConfig.name must be 1 to {MAX_NAME_CHARS} characters"
        )));
    }

    if config.symbol.is_empty()
        || config.symbol.len() > MAX_SYMBOL_CHARS
        || !config
            .symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(AppError::Validation(format!(
            "tokenConfig.symbol must be 1 to {MAX_SYMBOL_CHARS} uppercase letters or digits"
        )));
    }

    if Url::parse(&config.image).is_err() {
        return Err(AppError::Validation(
            "tokenConfig.image must be a valid URL".into(),
        ));
    }

    if let Some(description) = &config.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "tokenConfig.description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }

    parse_address(&config.pool.paired_token, "tokenConfig.pool.pairedToken")?;

    if let Some(vault) = &config.vault {
        if vault.percentage > MAX_VAULT_PERCENTAGE {
            return Err(AppError::Validation(format!(
                "tokenConfig.vault.percentage must be at most {MAX_VAULT_PERCENTAGE}"
            )));
        }
    }

    if let Some(airdrop) = &config.airdrop {
        if !is_merkle_root(&airdrop.merkle_root) {
            return Err(AppError::Validation(
                "tokenConfig.airdrop.merkleRoot must be 0x followed by 64 hex characters".into(),
            ));
        }
        if airdrop.amount == 0 {
            return Err(AppError::Validation(
                "tokenConfig.airdrop.amount must be positive".into(),
            ));
        }
    }

    if let Some(FeesConfig::Custom(value)) = &config.fees {
        if !value.is_object() {
            return Err(AppError::Validation(
                "tokenConfig.fees must be a preset name or an object".into(),
            ));
        }
    }

    Ok(())
}

fn is_merkle_root(value: &str) -> bool {
    value.len() == MERKLE_ROOT_CHARS
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use mintgate_core::models::{AirdropConfig, PoolConfig, PoolPositions, VaultConfig};

    use super::*;

    fn valid_config() -> TokenConfig {
        TokenConfig {
            name: "Test Token".into(),
            symbol: "TEST".into(),
            image: "https://example.com/token.png".into(),
            description: None,
            pool: PoolConfig {
                paired_token: "0x4200000000000000000000000000000000000006".into(),
                positions: PoolPositions::Standard,
            },
            vault: None,
            airdrop: None,
            fees: None,
        }
    }

    #[test]
    fn accepts_a_valid_config() {
        assert!(validate_token_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_names() {
        let mut config = valid_config();
        config.name = String::new();
        assert!(validate_token_config(&config).is_err());

        config.name = "x".repeat(51);
        assert!(validate_token_config(&config).is_err());

        config.name = "x".repeat(50);
        assert!(validate_token_config(&config).is_ok());
    }

    #[test]
    fn rejects_lowercase_and_symbolic_tickers() {
        let mut config = valid_config();
        for bad in ["test", "TE-ST", "TOOLONGSYMBOL", ""] {
            config.symbol = bad.into();
            assert!(validate_token_config(&config).is_err(), "accepted {bad:?}");
        }
        config.symbol = "T0KEN".into();
        assert!(validate_token_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_url_images_and_bad_pool_addresses() {
        let mut config = valid_config();
        config.image = "not a url".into();
        assert!(validate_token_config(&config).is_err());

        let mut config = valid_config();
        config.pool.paired_token = "0x1234".into();
        assert!(validate_token_config(&config).is_err());
    }

    #[test]
    fn caps_vault_percentage() {
        let mut config = valid_config();
        config.vault = Some(VaultConfig {
            percentage: 31,
            lockup_duration: 0,
            vesting_duration: 0,
        });
        assert!(validate_token_config(&config).is_err());

        config.vault = Some(VaultConfig {
            percentage: 30,
            lockup_duration: 0,
            vesting_duration: 0,
        });
        assert!(validate_token_config(&config).is_ok());
    }

    #[test]
    fn checks_airdrop_merkle_root_shape() {
        let mut config = valid_config();
        config.airdrop = Some(AirdropConfig {
            merkle_root: format!("0x{}", "ab".repeat(32)),
            amount: 1000,
            lockup_duration: 0,
            vesting_duration: 0,
        });
        assert!(validate_token_config(&config).is_ok());

        config.airdrop = Some(AirdropConfig {
            merkle_root: "0x1234".into(),
            amount: 1000,
            lockup_duration: 0,
            vesting_duration: 0,
        });
        assert!(validate_token_config(&config).is_err());

        config.airdrop = Some(AirdropConfig {
            merkle_root: format!("0x{}", "ab".repeat(32)),
            amount: 0,
            lockup_duration: 0,
            vesting_duration: 0,
        });
        assert!(validate_token_config(&config).is_err());
    }

    #[test]
    fn parse_address_names_the_field() {
        let err = parse_address("nonsense", "userAddress").unwrap_err();
        let AppError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.contains("userAddress"));
    }
}
