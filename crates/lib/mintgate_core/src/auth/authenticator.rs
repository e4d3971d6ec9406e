//! Replay-protected authentication pipeline.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::nonce::{NonceStore, nonce_key};
use crate::auth::signature::SignatureVerifier;
use crate::auth::{AuthError, AuthRequest};
use crate::clock::Clock;
use crate::config::AuthConfig;

/// Authenticates signed requests.
///
/// Checks run in a fixed order and short-circuit: freshness windows,
/// nonce consumption, then signature recovery. The nonce is consumed
/// *before* the signature is checked, so re-presenting a payload whose
/// signature failed still counts as a replay.
pub struct RequestAuthenticator {
    config: AuthConfig,
    nonces: Arc<dyn NonceStore>,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
}

impl RequestAuthenticator {
    pub fn new(
        config: AuthConfig,
        nonces: Arc<dyn NonceStore>,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            nonces,
            verifier,
            clock,
        }
    }

    /// Run the full authentication pipeline for one request.
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<(), AuthError> {
        let now = self.clock.now().timestamp();

        // The timestamp is wire-supplied and may sit anywhere in the i64
        // range, so both window checks use saturating arithmetic.
        if now.saturating_sub(request.timestamp) > self.config.freshness_window_secs {
            warn!(
                caller = %request.caller_address,
                timestamp = request.timestamp,
                "rejected expired request"
            );
            return Err(AuthError::Expired {
                timestamp: request.timestamp,
                window_secs: self.config.freshness_window_secs,
            });
        }

        if request.timestamp > now.saturating_add(self.config.future_tolerance_secs) {
            warn!(
                caller = %request.caller_address,
                timestamp = request.timestamp,
                "rejected future-dated request"
            );
            return Err(AuthError::FutureTimestamp {
                timestamp: request.timestamp,
                tolerance_secs: self.config.future_tolerance_secs,
            });
        }

        let key = nonce_key(request.timestamp, request.caller_address, &request.message);
        if !self.nonces.accept(&key, request.timestamp).await? {
            warn!(caller = %request.caller_address, "rejected replayed request");
            return Err(AuthError::Replayed);
        }

        // Opportunistic sweep; a failed sweep must not fail the request.
        let cutoff = now - self.config.nonce_max_age_secs;
        match self.nonces.evict_older_than(cutoff).await {
            Ok(evicted) if evicted > 0 => debug!(evicted, "evicted expired nonces"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "nonce eviction failed"),
        }

        if !self
            .verifier
            .verify(request.caller_address, &request.message, &request.signature)
        {
            warn!(caller = %request.caller_address, "rejected request with invalid signature");
            return Err(AuthError::InvalidSignature {
                address: request.caller_address.to_string(),
            });
        }

        debug!(caller = %request.caller_address, "request authenticated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use alloy_primitives::Address;
    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::auth::nonce::{MemoryNonceStore, NonceStoreError};
    use crate::clock::ManualClock;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    struct TogglableVerifier {
        valid: AtomicBool,
    }

    impl TogglableVerifier {
        fn accepting() -> Self {
            Self {
                valid: AtomicBool::new(true),
            }
        }

        fn set_valid(&self, valid: bool) {
            self.valid.store(valid, Ordering::SeqCst);
        }
    }

    impl SignatureVerifier for TogglableVerifier {
        fn verify(&self, _address: Address, _message: &str, _signature: &str) -> bool {
            self.valid.load(Ordering::SeqCst)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl NonceStore for BrokenStore {
        async fn accept(&self, _key: &str, _stamped_at: i64) -> Result<bool, NonceStoreError> {
            Err(NonceStoreError::Db(sqlx::Error::PoolClosed))
        }

        async fn evict_older_than(&self, _cutoff: i64) -> Result<u64, NonceStoreError> {
            Err(NonceStoreError::Db(sqlx::Error::PoolClosed))
        }
    }

    struct Harness {
        authenticator: RequestAuthenticator,
        nonces: Arc<MemoryNonceStore>,
        verifier: Arc<TogglableVerifier>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let nonces = Arc::new(MemoryNonceStore::new());
        let verifier = Arc::new(TogglableVerifier::accepting());
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(NOW, 0).unwrap(),
        ));
        let authenticator = RequestAuthenticator::new(
            AuthConfig::default(),
            Arc::clone(&nonces) as Arc<dyn NonceStore>,
            Arc::clone(&verifier) as Arc<dyn SignatureVerifier>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Harness {
            authenticator,
            nonces,
            verifier,
            clock,
        }
    }

    fn request(timestamp: i64) -> AuthRequest {
        AuthRequest {
            caller_address: "0x52908400098527886E0F7030069857D2E4169EE7"
                .parse()
                .unwrap(),
            signature: "0xsigned".into(),
            message: format!("payload at {timestamp}"),
            timestamp,
        }
    }

    #[tokio::test]
    async fn fresh_request_authenticates() {
        let h = harness();
        assert!(h.authenticator.authenticate(&request(NOW)).await.is_ok());
    }

    #[tokio::test]
    async fn freshness_window_is_inclusive_at_the_boundary() {
        let h = harness();
        // Exactly window-old: still fresh.
        assert!(
            h.authenticator
                .authenticate(&request(NOW - 300))
                .await
                .is_ok()
        );
        // One second past: expired.
        let err = h
            .authenticator
            .authenticate(&request(NOW - 301))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired { .. }));
    }

    #[tokio::test]
    async fn future_tolerance_is_inclusive_at_the_boundary() {
        let h = harness();
        assert!(
            h.authenticator
                .authenticate(&request(NOW + 60))
                .await
                .is_ok()
        );
        let err = h
            .authenticator
            .authenticate(&request(NOW + 61))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::FutureTimestamp { .. }));
    }

    #[tokio::test]
    async fn extreme_timestamps_are_rejected_without_overflow() {
        let h = harness();

        let err = h
            .authenticator
            .authenticate(&request(i64::MIN))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired { .. }));

        let err = h
            .authenticator
            .authenticate(&request(i64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::FutureTimestamp { .. }));

        // Neither absurd timestamp may burn a nonce.
        assert!(h.nonces.is_empty());
    }

    #[tokio::test]
    async fn identical_request_is_a_replay() {
        let h = harness();
        let req = request(NOW);
        assert!(h.authenticator.authenticate(&req).await.is_ok());
        let err = h.authenticator.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AuthError::Replayed));
    }

    #[tokio::test]
    async fn failed_signature_still_burns_the_nonce() {
        let h = harness();
        let req = request(NOW);

        h.verifier.set_valid(false);
        let err = h.authenticator.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature { .. }));

        // Retrying the same payload with a now-passing signature must be
        // treated as a replay, not a second chance.
        h.verifier.set_valid(true);
        let err = h.authenticator.authenticate(&req).await.unwrap_err();
        assert!(matches!(err, AuthError::Replayed));
    }

    #[tokio::test]
    async fn expired_request_does_not_consume_a_nonce() {
        let h = harness();
        let stale = request(NOW - 301);
        let _ = h.authenticator.authenticate(&stale).await;
        assert!(h.nonces.is_empty());
    }

    #[tokio::test]
    async fn accepted_request_sweeps_aged_out_nonces() {
        let h = harness();
        assert!(h.authenticator.authenticate(&request(NOW)).await.is_ok());
        assert_eq!(h.nonces.len(), 1);

        // 601 seconds later the earlier nonce is past max age and a new
        // request's sweep drops it.
        h.clock.advance(chrono::Duration::seconds(601));
        assert!(
            h.authenticator
                .authenticate(&request(NOW + 601))
                .await
                .is_ok()
        );
        assert_eq!(h.nonces.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_nonce_store_fails_closed() {
        let verifier = Arc::new(TogglableVerifier::accepting());
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(NOW, 0).unwrap(),
        ));
        let authenticator = RequestAuthenticator::new(
            AuthConfig::default(),
            Arc::new(BrokenStore),
            verifier,
            clock,
        );
        let err = authenticator.authenticate(&request(NOW)).await.unwrap_err();
        assert!(matches!(err, AuthError::NonceStore(_)));
    }
}
