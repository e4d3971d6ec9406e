//! Canonical deployment message construction and binding validation.
//!
//! A caller signs a JSON document binding the token config, their own
//! address, and the request timestamp. The serialization comes from a
//! struct whose field order fixes the key order, so both sides can
//! reproduce it byte for byte.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TokenConfig;

/// Action tag embedded in every deployment message.
pub const DEPLOY_ACTION: &str = "deploy_token_as_mintgate";

/// Why a signed message failed binding validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageMismatch {
    #[error("message is not a structurally valid deploy message")]
    Malformed,

    #[error("message action tag is not a deploy action")]
    WrongAction,

    #[error("message user address does not match the caller")]
    WrongAddress,

    #[error("message timestamp does not match the request timestamp")]
    WrongTimestamp,

    #[error("message token name does not match the submitted config")]
    WrongTokenName,

    #[error("message token symbol does not match the submitted config")]
    WrongTokenSymbol,
}

/// Serialization shape of the canonical message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalMessage<'a> {
    action: &'static str,
    config: &'a TokenConfig,
    timestamp: i64,
    user_address: String,
}

/// The fields binding validation reads back out of a signed message.
/// Tolerant of extra keys; strict about the bound ones.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedMessage {
    action: String,
    config: SignedConfig,
    timestamp: i64,
    user_address: String,
}

#[derive(Deserialize)]
struct SignedConfig {
    name: String,
    symbol: String,
}

/// Build the canonical message a caller must sign to deploy `config`.
pub fn canonical_deploy_message(
    config: &TokenConfig,
    caller: Address,
    timestamp: i64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CanonicalMessage {
        action: DEPLOY_ACTION,
        config,
        timestamp,
        user_address: caller.to_string(),
    })
}

/// Check that a signed message is bound to this caller, timestamp, and
/// token config. Returns the first mismatch found, in a fixed order, so
/// rejections log a stable reason.
pub fn validate_binding(
    message: &str,
    config: &TokenConfig,
    caller: Address,
    timestamp: i64,
) -> Result<(), MessageMismatch> {
    let parsed: SignedMessage =
        serde_json::from_str(message).map_err(|_| MessageMismatch::Malformed)?;

    if parsed.action != DEPLOY_ACTION {
        return Err(MessageMismatch::WrongAction);
    }
    let signed_address = parsed
        .user_address
        .parse::<Address>()
        .map_err(|_| MessageMismatch::WrongAddress)?;
    if signed_address != caller {
        return Err(MessageMismatch::WrongAddress);
    }
    if parsed.timestamp != timestamp {
        return Err(MessageMismatch::WrongTimestamp);
    }
    if parsed.config.name != config.name {
        return Err(MessageMismatch::WrongTokenName);
    }
    if parsed.config.symbol != config.symbol {
        return Err(MessageMismatch::WrongTokenSymbol);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::models::{PoolConfig, PoolPositions};

    use super::*;

    fn config(name: &str, symbol: &str) -> TokenConfig {
        TokenConfig {
            name: name.into(),
            symbol: symbol.into(),
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

    fn caller() -> Address {
        "0x52908400098527886E0F7030069857D2E4169EE7"
            .parse()
            .unwrap()
    }

    #[test]
    fn canonical_message_has_fixed_key_order() {
        let message = canonical_deploy_message(&config("Mint", "MNT"), caller(), 1700).unwrap();
        assert!(message.starts_with("{\"action\":\"deploy_token_as_mintgate\",\"config\":{\"name\":\"Mint\""));
        assert!(message.contains("\"timestamp\":1700"));
        assert!(message.ends_with("\"userAddress\":\"0x52908400098527886E0F7030069857D2E4169EE7\"}"));
    }

    #[test]
    fn canonical_message_passes_its_own_binding() {
        let cfg = config("Mint", "MNT");
        let message = canonical_deploy_message(&cfg, caller(), 1700).unwrap();
        assert_eq!(validate_binding(&message, &cfg, caller(), 1700), Ok(()));
    }

    #[test]
    fn binding_rejects_config_swap() {
        let signed_for = config("Mint", "MNT");
        let message = canonical_deploy_message(&signed_for, caller(), 1700).unwrap();

        let renamed = config("Other", "MNT");
        assert_eq!(
            validate_binding(&message, &renamed, caller(), 1700),
            Err(MessageMismatch::WrongTokenName)
        );

        let resymboled = config("Mint", "OTHR");
        assert_eq!(
            validate_binding(&message, &resymboled, caller(), 1700),
            Err(MessageMismatch::WrongTokenSymbol)
        );
    }

    #[test]
    fn binding_rejects_wrong_action() {
        let cfg = config("Mint", "MNT");
        let message = canonical_deploy_message(&cfg, caller(), 1700)
            .unwrap()
            .replace(DEPLOY_ACTION, "transfer_ownership");
        assert_eq!(
            validate_binding(&message, &cfg, caller(), 1700),
            Err(MessageMismatch::WrongAction)
        );
    }

    #[test]
    fn binding_rejects_other_caller() {
        let cfg = config("Mint", "MNT");
        let message = canonical_deploy_message(&cfg, caller(), 1700).unwrap();
        let other: Address = "0x8617E340B3D01FA5F11F306F4090FD50E238070D"
            .parse()
            .unwrap();
        assert_eq!(
            validate_binding(&message, &cfg, other, 1700),
            Err(MessageMismatch::WrongAddress)
        );
    }

    #[test]
    fn binding_rejects_stale_embedded_timestamp() {
        // A previously signed message re-submitted under a fresh outer
        // timestamp must not pass.
        let cfg = config("Mint", "MNT");
        let message = canonical_deploy_message(&cfg, caller(), 1700).unwrap();
        assert_eq!(
            validate_binding(&message, &cfg, caller(), 1701),
            Err(MessageMismatch::WrongTimestamp)
        );
    }

    #[test]
    fn binding_tolerates_unknown_extra_fields() {
        let cfg = config("Mint", "MNT");
        let message = format!(
            "{{\"action\":\"{DEPLOY_ACTION}\",\"config\":{{\"name\":\"Mint\",\"symbol\":\"MNT\",\"extra\":1}},\"timestamp\":1700,\"userAddress\":\"{}\",\"note\":\"hi\"}}",
            caller()
        );
        assert_eq!(validate_binding(&message, &cfg, caller(), 1700), Ok(()));
    }

    #[test]
    fn binding_rejects_garbage() {
        let cfg = config("Mint", "MNT");
        for bad in ["", "not json", "{}", "{\"action\":\"deploy_token_as_mintgate\"}"] {
            assert_eq!(
                validate_binding(bad, &cfg, caller(), 1700),
                Err(MessageMismatch::Malformed),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn binding_accepts_differently_cased_signed_address() {
        // Lowercased address in the signed message still refers to the
        // same wallet.
        let cfg = config("Mint", "MNT");
        let message = canonical_deploy_message(&cfg, caller(), 1700)
            .unwrap()
            .replace(
                "0x52908400098527886E0F7030069857D2E4169EE7",
                "0x52908400098527886e0f7030069857d2e4169ee7",
            );
        assert_eq!(validate_binding(&message, &cfg, caller(), 1700), Ok(()));
    }
}
