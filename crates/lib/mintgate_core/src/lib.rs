//! # mintgate_core
//!
//! Core domain logic for Mintgate: replay-protected request
//! authentication, asset-holding eligibility checks, and exactly-once
//! recording of token deployments.

pub mod auth;
pub mod clock;
pub mod config;
pub mod deploy;
pub mod eligibility;
pub mod evm;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
