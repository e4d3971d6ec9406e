//! EIP-191 signature verification.

use alloy_primitives::{Address, Signature, hex};
use tracing::debug;

/// Verifies that a message signature was produced by a claimed address.
pub trait SignatureVerifier: Send + Sync {
    /// `true` when `signature` over `message` recovers to `address`.
    ///
    /// Malformed input is invalid, never an error: a signature that
    /// cannot be parsed cannot have been produced by the claimed key.
    fn verify(&self, address: Address, message: &str, signature: &str) -> bool;
}

/// Recovers the signer from an EIP-191 personal-sign signature and
/// compares it to the claimed address.
#[derive(Debug, Default, Clone, Copy)]
pub struct Eip191Verifier;

impl SignatureVerifier for Eip191Verifier {
    fn verify(&self, address: Address, message: &str, signature: &str) -> bool {
        let Ok(raw) = hex::decode(signature) else {
            return false;
        };
        let Ok(parsed) = Signature::try_from(raw.as_slice()) else {
            return false;
        };
        match parsed.recover_address_from_msg(message) {
            Ok(recovered) => recovered == address,
            Err(e) => {
                debug!(error = %e, "signature recovery failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::eip191_hash_message;
    use k256::ecdsa::SigningKey;

    use super::*;

    fn test_signer() -> (SigningKey, Address) {
        let key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let address = Address::from_public_key(key.verifying_key());
        (key, address)
    }

    /// Sign `message` the way a wallet's personal_sign does, returning the
    /// 65-byte hex signature with v in {27, 28}.
    fn sign_message(key: &SigningKey, message: &str) -> String {
        let digest = eip191_hash_message(message);
        let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(signature.to_bytes().as_slice());
        raw[64] = 27 + recovery_id.to_byte();
        hex::encode_prefixed(raw)
    }

    #[test]
    fn valid_signature_recovers_signer() {
        let (key, address) = test_signer();
        let signature = sign_message(&key, "deploy request");
        assert!(Eip191Verifier.verify(address, "deploy request", &signature));
    }

    #[test]
    fn signature_over_different_message_is_rejected() {
        let (key, address) = test_signer();
        let signature = sign_message(&key, "deploy request");
        assert!(!Eip191Verifier.verify(address, "another message", &signature));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let (key, _) = test_signer();
        let other = SigningKey::from_slice(&[0x07u8; 32]).unwrap();
        let other_address = Address::from_public_key(other.verifying_key());
        let signature = sign_message(&key, "deploy request");
        assert!(!Eip191Verifier.verify(other_address, "deploy request", &signature));
    }

    #[test]
    fn malformed_signatures_are_invalid_not_fatal() {
        let (_, address) = test_signer();
        for bad in [
            "",
            "0x",
            "not hex at all",
            "0x1234",
            // 64 bytes: truncated, missing the recovery byte.
            &format!("0x{}", "ab".repeat(64)),
            // 66 bytes: one too many.
            &format!("0x{}", "ab".repeat(66)),
        ] {
            assert!(
                !Eip191Verifier.verify(address, "deploy request", bad),
                "accepted malformed signature {bad:?}"
            );
        }
    }

    #[test]
    fn tampered_recovery_byte_is_rejected() {
        let (key, address) = test_signer();
        let signature = sign_message(&key, "deploy request");
        let mut raw = hex::decode(&signature).unwrap();
        raw[64] = 29; // outside the valid 27/28 range
        let tampered = hex::encode_prefixed(&raw);
        assert!(!Eip191Verifier.verify(address, "deploy request", &tampered));
    }
}
