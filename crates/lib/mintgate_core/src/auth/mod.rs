//! Signature-based request authentication with replay protection.
//!
//! A request carries a caller address, a signed message, and a client
//! timestamp. Authentication checks the timestamp against freshness
//! windows, consumes a single-use nonce derived from the request, and
//! only then verifies the signature. Shared across `mintgate_api`
//! endpoints that act on behalf of a wallet.

pub mod authenticator;
pub mod message;
pub mod nonce;
pub mod signature;

use alloy_primitives::Address;
use thiserror::Error;

use crate::auth::nonce::NonceStoreError;

/// Authentication failures.
///
/// Every variant except [`AuthError::NonceStore`] means the request was
/// judged and rejected; `NonceStore` means the registry could not be
/// consulted, and the request must be treated as unauthenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request expired: timestamp {timestamp} is older than {window_secs}s")]
    Expired { timestamp: i64, window_secs: i64 },

    #[error("request timestamp {timestamp} is more than {tolerance_secs}s in the future")]
    FutureTimestamp { timestamp: i64, tolerance_secs: i64 },

    #[error("request already processed")]
    Replayed,

    #[error("invalid signature for {address}")]
    InvalidSignature { address: String },

    #[error("nonce registry unavailable: {0}")]
    NonceStore(#[from] NonceStoreError),
}

/// A signed request presented for authentication.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Address claiming to have produced the signature.
    pub caller_address: Address,
    /// Hex-encoded 65-byte `r || s || v` signature.
    pub signature: String,
    /// The exact payload that was signed.
    pub message: String,
    /// Client-asserted Unix timestamp, in seconds.
    pub timestamp: i64,
}
