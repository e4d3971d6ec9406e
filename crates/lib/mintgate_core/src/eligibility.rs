//! Asset-holding eligibility checks.
//!
//! An address qualifies when its balance of the gating asset reaches
//! `10^(decimals - fraction_digits)` base units: one hundredth of a
//! whole token under the default policy.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::config::EligibilityConfig;

/// Read access to the gating asset's ERC-20 state.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Balance of `address`, in base units.
    async fn read_balance(&self, address: Address) -> Result<U256, LedgerError>;

    /// Decimals of the asset contract.
    async fn read_decimals(&self) -> Result<u8, LedgerError>;
}

/// Errors reaching or reading the asset ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ledger returned malformed data: {0}")]
    Decode(String),
}

/// Errors produced by an eligibility evaluation.
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("asset ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),

    #[error("asset with {decimals} decimals cannot express a {fraction_digits}-fraction-digit minimum")]
    UnsupportedDecimals { decimals: u8, fraction_digits: u8 },
}

/// Outcome of an eligibility evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityReport {
    /// Balance at evaluation time, in base units.
    pub balance: U256,
    /// Asset decimals.
    pub decimals: u8,
    /// Minimum balance required, in base units.
    pub min_required: U256,
    /// Whether `balance >= min_required`.
    pub is_qualified: bool,
    /// When the evaluation happened.
    pub checked_at: DateTime<Utc>,
}

/// Evaluates whether an address holds enough of the gating asset.
pub struct EligibilityChecker {
    config: EligibilityConfig,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
}

impl EligibilityChecker {
    pub fn new(
        config: EligibilityConfig,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            ledger,
            clock,
        }
    }

    /// Read balance and decimals concurrently and derive the verdict.
    pub async fn check(&self, address: Address) -> Result<EligibilityReport, EligibilityError> {
        let (balance, decimals) = tokio::join!(
            self.ledger.read_balance(address),
            self.ledger.read_decimals(),
        );
        let balance = balance?;
        let decimals = decimals?;

        let min_required = min_required_balance(decimals, self.config.min_balance_fraction_digits)?;
        let is_qualified = balance >= min_required;
        debug!(
            %address,
            %balance,
            decimals,
            %min_required,
            is_qualified,
            "eligibility evaluated"
        );
        Ok(EligibilityReport {
            balance,
            decimals,
            min_required,
            is_qualified,
            checked_at: self.clock.now(),
        })
    }
}

/// Minimum qualifying balance: `10^(decimals - fraction_digits)` base
/// units. Assets that cannot express the fraction are rejected rather
/// than silently gated at a different height.
pub fn min_required_balance(
    decimals: u8,
    fraction_digits: u8,
) -> Result<U256, EligibilityError> {
    if decimals < fraction_digits {
        return Err(EligibilityError::UnsupportedDecimals {
            decimals,
            fraction_digits,
        });
    }
    let exponent = u64::from(decimals - fraction_digits);
    U256::from(10u8)
        .checked_pow(U256::from(exponent))
        .ok_or(EligibilityError::UnsupportedDecimals {
            decimals,
            fraction_digits,
        })
}
